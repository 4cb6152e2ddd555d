use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of one repository from a provider listing
///
/// Constructed fresh per scan, never mutated, discarded when the scan
/// completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    /// Full provider resource name. ECR uses the repository name itself;
    /// Artifact Registry uses the `projects/…/repositories/…` path
    pub name: String,

    /// Short identifier used in findings and exclusion matching
    pub id: String,

    /// Region (AWS) or location (GCP) the repository lives in
    pub region: String,

    /// Repository format as reported by the provider, when it reports one.
    /// Providers only return container-image repositories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Point-in-time view of one image manifest within a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSnapshot {
    /// Content digest, unique within the repository
    pub digest: String,

    /// Pullable URI, when the provider reports one (Artifact Registry does)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Tags pointing at this manifest, possibly empty
    #[serde(default)]
    pub tags: Vec<String>,

    /// Total stored size in bytes
    pub size_bytes: u64,

    /// Push/upload timestamp
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,

    /// Last recorded pull, absent on Artifact Registry
    #[serde(default)]
    pub last_pull: Option<DateTime<Utc>>,

    /// Manifest media type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl ImageSnapshot {
    /// True when the manifest is a multi-platform manifest list or an OCI
    /// image index
    #[must_use]
    pub fn is_multi_platform(&self) -> bool {
        self.media_type
            .as_deref()
            .is_some_and(|m| m.contains("manifest.list") || m.contains("image.index"))
    }
}

/// Vulnerability totals reported by a registry's native scanner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Total number of scan findings
    pub total: usize,

    /// Findings at critical severity
    pub critical: usize,

    /// Findings at high severity
    pub high: usize,

    /// Raw per-severity counts as labelled by the provider
    #[serde(default)]
    pub by_severity: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(media_type: Option<&str>) -> ImageSnapshot {
        ImageSnapshot {
            digest: "sha256:abc".into(),
            uri: None,
            tags: vec![],
            size_bytes: 0,
            pushed_at: None,
            last_pull: None,
            media_type: media_type.map(String::from),
        }
    }

    #[test]
    fn detects_docker_manifest_lists() {
        let img = image(Some(
            "application/vnd.docker.distribution.manifest.list.v2+json",
        ));
        assert!(img.is_multi_platform());
    }

    #[test]
    fn detects_oci_image_indexes() {
        let img = image(Some("application/vnd.oci.image.index.v1+json"));
        assert!(img.is_multi_platform());
    }

    #[test]
    fn single_platform_manifests_are_not_multi_platform() {
        let img = image(Some(
            "application/vnd.docker.distribution.manifest.v2+json",
        ));
        assert!(!img.is_multi_platform());
        assert!(!image(None).is_multi_platform());
    }
}
