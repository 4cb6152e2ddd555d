use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Finding;

/// Complete, unfiltered output of one provider scan
///
/// Grown incrementally by the scan engine, immutable once returned.
/// Error strings describe resources that could not be enumerated; their
/// presence does not invalidate the findings that were collected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Findings in emission order
    pub findings: Vec<Finding>,

    /// One entry per resource that failed to enumerate or inspect
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    /// Images inspected
    pub resources_scanned: usize,

    /// Repositories enumerated, excluded ones included
    pub repositories_scanned: usize,
}

impl ScanResult {
    /// Records a resource-scoped failure
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

/// Progress event emitted while a scan walks repositories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Region or location being scanned
    pub region: String,

    /// Label of the scanner that produced the event
    pub scanner: String,

    /// Human-readable progress line
    pub message: String,

    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
}
