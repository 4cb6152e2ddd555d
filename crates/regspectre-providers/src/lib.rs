//! Registry provider adapters.
//!
//! [`EcrProvider`] wraps the official AWS SDK; [`ArtifactRegistryProvider`]
//! speaks the Artifact Registry REST API directly over reqwest. Both
//! implement [`RegistryProvider`](regspectre_scan::RegistryProvider), so the
//! scan engine never sees provider-specific types.

#![doc(html_root_url = "https://docs.rs/regspectre-providers/0.1.0")]

mod artifact_registry;
mod ecr;

pub use artifact_registry::{ArtifactRegistryBuilder, ArtifactRegistryProvider};
pub use ecr::{EcrOptions, EcrProvider};
