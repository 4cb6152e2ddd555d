//! regspectre - Container registry waste auditor
//!
//! Finds stale, untagged, and bloated container images in AWS ECR and
//! GCP Artifact Registry.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    regspectre_cli::run().await
}
