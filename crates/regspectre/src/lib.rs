//! Container registry waste auditor for AWS ECR and GCP Artifact Registry.
//!
//! Scans registries read-only, classifies images against waste rules
//! (untagged, stale, oversized, multi-arch bloat) and repositories against
//! theirs (empty, all-stale, missing lifecycle policy), prices every
//! finding in dollars per month, and renders the result as text, JSON,
//! SARIF, or a SpectreHub envelope. Nothing is ever deleted.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use regspectre::{analyze, EcrOptions, EcrProvider, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = EcrProvider::connect(EcrOptions {
//!         regions: vec!["us-east-1".into()],
//!         ..EcrOptions::default()
//!     })
//!     .await;
//!
//!     let result = Scanner::new(provider)
//!         .scan(&ScanConfig::default(), None)
//!         .await;
//!     let analysis = analyze(&result, 0.10);
//!
//!     for finding in &analysis.findings {
//!         println!(
//!             "[{}] {} — ${:.2}/mo",
//!             finding.severity, finding.message, finding.estimated_monthly_waste
//!         );
//!     }
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/regspectre/0.1.0")]

// Re-export core types
pub use regspectre_core::*;

// Re-export the scan engine
pub use regspectre_scan::{
    Capabilities, ProgressCallback, ProviderError, ProviderResult, RegistryProvider, Scanner,
};

// Re-export provider adapters
pub use regspectre_providers::{
    ArtifactRegistryBuilder, ArtifactRegistryProvider, EcrOptions, EcrProvider,
};

// Re-export report rendering as a module
pub use regspectre_report as report;

// Re-export runtime for convenience
pub use serde;
pub use serde_json;
pub use tokio;
