//! The renderer input envelope.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use regspectre_core::{Finding, Summary};

use crate::ReportError;

/// Everything a renderer needs to produce one report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    /// Tool name stamped into the output
    pub tool: String,

    /// Tool version
    pub version: String,

    /// When the report was generated
    pub timestamp: DateTime<Utc>,

    /// The audited registry
    pub target: Target,

    /// Scan configuration echoed for reproducibility
    pub config: ReportConfig,

    /// Findings that survived the cost filter
    pub findings: Vec<Finding>,

    /// Aggregate statistics over the findings
    pub summary: Summary,

    /// Non-fatal scan errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Identifies the audited registry without leaking account or project
/// identifiers; `uri_hash` is a content hash of the scan coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Registry kind, `ecr` or `artifact-registry`
    #[serde(rename = "type")]
    pub kind: String,

    /// `sha256:<hex>` over the scan coordinates
    pub uri_hash: String,
}

/// Scan thresholds echoed into the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Cloud family, `aws` or `gcp`
    pub provider: String,

    /// Regions or locations walked
    pub regions: Vec<String>,

    /// Staleness threshold in days
    pub stale_days: u32,

    /// Size threshold in megabytes
    pub max_size_mb: u64,

    /// Minimum monthly cost for a finding to be reported
    pub min_monthly_cost: f64,
}

/// Output format selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable terminal table
    #[default]
    Text,
    /// `spectre/v1` JSON envelope
    Json,
    /// SARIF v2.1.0
    Sarif,
    /// SpectreHub ingest envelope
    SpectreHub,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "sarif" => Ok(Self::Sarif),
            "spectrehub" => Ok(Self::SpectreHub),
            _ => Err(ReportError::UnknownFormat(s.to_owned())),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Sarif => "sarif",
            Self::SpectreHub => "spectrehub",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
pub(crate) fn sample() -> ReportData {
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use regspectre_core::{FindingKind, ResourceType, Severity};

    ReportData {
        tool: "regspectre".to_owned(),
        version: "0.1.0".to_owned(),
        timestamp: Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap(),
        target: Target {
            kind: "ecr".to_owned(),
            uri_hash: "sha256:abc123".to_owned(),
        },
        config: ReportConfig {
            provider: "aws".to_owned(),
            regions: vec!["us-east-1".to_owned()],
            stale_days: 90,
            max_size_mb: 1024,
            min_monthly_cost: 1.0,
        },
        findings: vec![
            Finding {
                id: FindingKind::StaleImage,
                severity: Severity::High,
                resource_type: ResourceType::Image,
                resource_id: "sha256:deadbeef".to_owned(),
                resource_name: Some("myapp:v1.0".to_owned()),
                region: "us-east-1".to_owned(),
                message: "Image not pulled in 120 days".to_owned(),
                estimated_monthly_waste: 5.50,
                metadata: BTreeMap::new(),
            },
            Finding {
                id: FindingKind::UntaggedImage,
                severity: Severity::High,
                resource_type: ResourceType::Image,
                resource_id: "sha256:cafebabe".to_owned(),
                resource_name: None,
                region: "us-east-1".to_owned(),
                message: "Image has no tags".to_owned(),
                estimated_monthly_waste: 2.30,
                metadata: BTreeMap::new(),
            },
        ],
        summary: Summary {
            total_resources_scanned: 50,
            total_findings: 2,
            total_monthly_waste: 7.80,
            by_severity: BTreeMap::from([(Severity::High, 2)]),
            by_resource_type: BTreeMap::from([(ResourceType::Image, 2)]),
            repositories_scanned: 3,
        },
        errors: Vec::new(),
    }
}
