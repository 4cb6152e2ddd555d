use async_trait::async_trait;

use regspectre_core::{ImageSnapshot, Provider, RepositorySnapshot, SeverityCounts};

use crate::error::{ProviderError, ProviderResult};

/// Optional operations a registry adapter may implement
///
/// The scan engine consults this before invoking an optional operation;
/// a capability that is absent is simply never exercised, so providers
/// without the underlying signal can never produce the corresponding
/// findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Can report whether a repository has a lifecycle policy
    pub lifecycle_policy: bool,

    /// Can report native vulnerability scan results per image
    pub vulnerability_scan: bool,
}

/// Listing surface a registry must expose to be scanned
///
/// Implementations own pagination: the listing methods return complete
/// collections, following page tokens to the end. Adding a registry
/// means implementing this trait; classification and aggregation code
/// never changes.
#[async_trait]
pub trait RegistryProvider: Send + Sync {
    /// Which registry this adapter talks to
    fn provider(&self) -> Provider;

    /// Regions (AWS) or locations (GCP) the scan will walk
    fn scopes(&self) -> &[String];

    /// Optional operations this adapter supports
    fn capabilities(&self) -> Capabilities;

    /// Lists container-image repositories in one scope
    async fn list_repositories(&self, scope: &str) -> ProviderResult<Vec<RepositorySnapshot>>;

    /// Lists every image in a repository
    async fn list_images(&self, repo: &RepositorySnapshot) -> ProviderResult<Vec<ImageSnapshot>>;

    /// Whether the repository has a lifecycle policy configured.
    ///
    /// Invoked only when [`Capabilities::lifecycle_policy`] is set.
    async fn has_lifecycle_policy(&self, repo: &RepositorySnapshot) -> ProviderResult<bool> {
        let _ = repo;
        Err(ProviderError::Unsupported)
    }

    /// Severity counts from the registry's native image scan, or `None`
    /// when no scan data exists for the image.
    ///
    /// Invoked only when [`Capabilities::vulnerability_scan`] is set.
    async fn vulnerability_counts(
        &self,
        repo: &RepositorySnapshot,
        digest: &str,
    ) -> ProviderResult<Option<SeverityCounts>> {
        let _ = (repo, digest);
        Err(ProviderError::Unsupported)
    }
}
