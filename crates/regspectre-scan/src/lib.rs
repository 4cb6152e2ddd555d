//! Provider-agnostic scan engine.
//!
//! One [`Scanner`] drives any registry that implements
//! [`RegistryProvider`]: it walks scopes and repositories, feeds each
//! image through the classifier in `regspectre-core`, and accumulates
//! findings, errors, and counters into a
//! [`ScanResult`](regspectre_core::ScanResult). Optional provider
//! operations (lifecycle policies, vulnerability scans) are gated by a
//! [`Capabilities`] check, never by provider-specific branches, so a
//! third registry only needs a new trait implementation.

#![doc(html_root_url = "https://docs.rs/regspectre-scan/0.1.0")]

mod error;
mod provider;
mod scanner;

pub use error::{ProviderError, ProviderResult};
pub use provider::{Capabilities, RegistryProvider};
pub use scanner::{ProgressCallback, Scanner};
