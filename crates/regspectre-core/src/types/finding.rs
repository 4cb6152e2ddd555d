use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordinal priority of a finding
///
/// Ordering places `Critical` first so that sorted collections and
/// severity histograms list the most urgent entries at the top.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Immediate action required
    Critical,
    /// Should be addressed soon
    High,
    /// Worth reviewing
    Medium,
    /// Informational
    Low,
}

impl Severity {
    /// Lowercase wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of registry resource a finding points at
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// A single image manifest
    Image,
    /// A whole repository
    Repository,
}

impl ResourceType {
    /// Lowercase wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Repository => "repository",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The waste rules a scan can trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    /// Image has no tags
    UntaggedImage,
    /// Image has not been pulled (or uploaded) within the threshold
    StaleImage,
    /// Image exceeds the configured size threshold
    LargeImage,
    /// Repository has no expiration policy
    NoLifecyclePolicy,
    /// Registry scan reports critical or high CVEs
    VulnerableImage,
    /// Repository is empty or every image in it is stale
    UnusedRepo,
    /// Multi-platform manifest that is also stale
    MultiArchBloat,
}

impl FindingKind {
    /// All kinds, in rule-definition order
    pub const ALL: [Self; 7] = [
        Self::UntaggedImage,
        Self::StaleImage,
        Self::LargeImage,
        Self::NoLifecyclePolicy,
        Self::VulnerableImage,
        Self::UnusedRepo,
        Self::MultiArchBloat,
    ];

    /// Stable rule identifier used in reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UntaggedImage => "UNTAGGED_IMAGE",
            Self::StaleImage => "STALE_IMAGE",
            Self::LargeImage => "LARGE_IMAGE",
            Self::NoLifecyclePolicy => "NO_LIFECYCLE_POLICY",
            Self::VulnerableImage => "VULNERABLE_IMAGE",
            Self::UnusedRepo => "UNUSED_REPO",
            Self::MultiArchBloat => "MULTI_ARCH_BLOAT",
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single waste detection result
///
/// Findings are value objects: created once by the classifier, never
/// mutated afterwards. The metadata map carries kind-specific evidence
/// such as `days_stale` or `size_bytes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Which rule fired
    pub id: FindingKind,

    /// Priority of the finding
    pub severity: Severity,

    /// Whether this concerns one image or a whole repository
    pub resource_type: ResourceType,

    /// Stable identifier of the affected resource
    pub resource_id: String,

    /// Human-readable name, when the resource has one (e.g. `repo:tag`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    /// Region or location the resource lives in
    pub region: String,

    /// One-line description of the problem
    pub message: String,

    /// Estimated monthly storage waste in USD, never negative
    pub estimated_monthly_waste: f64,

    /// Kind-specific evidence, keyed deterministically
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}
