use serde::{Deserialize, Serialize};

/// Registry provider targeted by one scan invocation
///
/// The two registries differ in more than their APIs: Artifact Registry
/// records no pull timestamps, has no lifecycle policies, and exposes no
/// scan results through the listing surface. Those asymmetries are part
/// of this type's contract rather than scattered branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// AWS Elastic Container Registry
    Ecr,
    /// GCP Artifact Registry
    ArtifactRegistry,
}

impl Provider {
    /// Key into the storage pricing table
    #[must_use]
    pub const fn pricing_key(self) -> &'static str {
        match self {
            Self::Ecr => "ecr",
            Self::ArtifactRegistry => "artifactregistry",
        }
    }

    /// Target type string used in report envelopes
    #[must_use]
    pub const fn target_type(self) -> &'static str {
        match self {
            Self::Ecr => "ecr",
            Self::ArtifactRegistry => "artifact-registry",
        }
    }

    /// Short label attached to progress events
    #[must_use]
    pub const fn scanner_label(self) -> &'static str {
        match self {
            Self::Ecr => "ecr",
            Self::ArtifactRegistry => "artifactregistry",
        }
    }

    /// Cloud family name used in report configuration ("aws" or "gcp")
    #[must_use]
    pub const fn family(self) -> &'static str {
        match self {
            Self::Ecr => "aws",
            Self::ArtifactRegistry => "gcp",
        }
    }

    /// Whether the registry records when images were last pulled
    ///
    /// Artifact Registry does not, so staleness there is judged from the
    /// upload time and findings carry an explicit note to that effect.
    #[must_use]
    pub const fn records_pull_times(self) -> bool {
        matches!(self, Self::Ecr)
    }

    /// Whether progress output announces each scan scope
    ///
    /// Artifact Registry scans walk several locations per invocation;
    /// ECR scans cover a single region and skip the announcement.
    #[must_use]
    pub const fn announces_locations(self) -> bool {
        matches!(self, Self::ArtifactRegistry)
    }

    /// Progress line for a completed repository listing
    #[must_use]
    pub fn found_repositories_message(self, count: usize) -> String {
        match self {
            Self::Ecr => format!("Found {count} repositories"),
            Self::ArtifactRegistry => format!("Found {count} Docker repositories"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_keys_match_rate_table() {
        assert_eq!(Provider::Ecr.pricing_key(), "ecr");
        assert_eq!(Provider::ArtifactRegistry.pricing_key(), "artifactregistry");
    }

    #[test]
    fn only_ecr_records_pull_times() {
        assert!(Provider::Ecr.records_pull_times());
        assert!(!Provider::ArtifactRegistry.records_pull_times());
    }
}
