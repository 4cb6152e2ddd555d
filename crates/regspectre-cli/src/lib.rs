//! # regspectre-cli
//!
//! Command-line container registry waste auditor.
//!
//! ## Features
//!
//! - **AWS ECR audits**: stale, untagged, and oversized images across regions
//! - **GCP Artifact Registry audits**: Docker repositories across locations
//! - **Cost-weighted findings**: every finding carries estimated monthly waste in USD
//! - **Multiple output formats**: text tables, JSON, SARIF, SpectreHub
//! - **Read-only**: never deletes or modifies anything in a registry

pub mod cli;
pub mod config;

pub use cli::run;
