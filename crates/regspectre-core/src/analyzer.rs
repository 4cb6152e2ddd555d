//! Post-scan filtering and aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Finding, ResourceType, ScanResult, Severity};

/// Aggregated statistics over the retained findings of one scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Images inspected, filtered or not
    pub total_resources_scanned: usize,

    /// Findings retained after cost filtering
    pub total_findings: usize,

    /// Monthly waste in USD summed over the retained findings only
    pub total_monthly_waste: f64,

    /// Retained findings per severity
    #[serde(default)]
    pub by_severity: BTreeMap<Severity, usize>,

    /// Retained findings per resource type
    #[serde(default)]
    pub by_resource_type: BTreeMap<ResourceType, usize>,

    /// Repositories enumerated during the scan
    pub repositories_scanned: usize,
}

/// Cost-filtered findings plus their summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Findings at or above the cost threshold, in emission order
    pub findings: Vec<Finding>,

    /// Statistics over `findings`
    pub summary: Summary,

    /// Scan errors, passed through unmodified
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Filters findings by minimum monthly cost and computes summary
/// statistics over the retained set.
///
/// The boundary is inclusive: a finding wasting exactly
/// `min_monthly_cost` is retained. Total waste counts retained findings
/// only. Never fails and performs no I/O.
#[must_use]
pub fn analyze(result: &ScanResult, min_monthly_cost: f64) -> AnalysisResult {
    let findings: Vec<Finding> = result
        .findings
        .iter()
        .filter(|f| f.estimated_monthly_waste >= min_monthly_cost)
        .cloned()
        .collect();

    let mut summary = Summary {
        total_resources_scanned: result.resources_scanned,
        total_findings: findings.len(),
        repositories_scanned: result.repositories_scanned,
        ..Summary::default()
    };

    for finding in &findings {
        summary.total_monthly_waste += finding.estimated_monthly_waste;
        *summary.by_severity.entry(finding.severity).or_insert(0) += 1;
        *summary
            .by_resource_type
            .entry(finding.resource_type)
            .or_insert(0) += 1;
    }

    AnalysisResult {
        findings,
        summary,
        errors: result.errors.clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::types::FindingKind;

    use super::*;

    fn finding(kind: FindingKind, severity: Severity, waste: f64) -> Finding {
        Finding {
            id: kind,
            severity,
            resource_type: match kind {
                FindingKind::UnusedRepo | FindingKind::NoLifecyclePolicy => {
                    ResourceType::Repository
                }
                _ => ResourceType::Image,
            },
            resource_id: "myapp@sha256:abc".into(),
            resource_name: None,
            region: "us-east-1".into(),
            message: "test".into(),
            estimated_monthly_waste: waste,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn filters_below_minimum_cost() {
        let result = ScanResult {
            findings: vec![
                finding(FindingKind::StaleImage, Severity::High, 5.0),
                finding(FindingKind::UntaggedImage, Severity::High, 0.05),
            ],
            resources_scanned: 10,
            repositories_scanned: 2,
            ..ScanResult::default()
        };

        let analysis = analyze(&result, 0.10);

        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].id, FindingKind::StaleImage);
        assert_eq!(analysis.summary.total_findings, 1);
        assert!((analysis.summary.total_monthly_waste - 5.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let result = ScanResult {
            findings: vec![
                finding(FindingKind::StaleImage, Severity::High, 0.10),
                finding(FindingKind::UntaggedImage, Severity::High, 0.09),
            ],
            ..ScanResult::default()
        };

        let analysis = analyze(&result, 0.10);

        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].id, FindingKind::StaleImage);
    }

    #[test]
    fn histograms_cover_the_filtered_set_only() {
        let result = ScanResult {
            findings: vec![
                finding(FindingKind::StaleImage, Severity::High, 2.0),
                finding(FindingKind::LargeImage, Severity::Medium, 3.0),
                finding(FindingKind::UnusedRepo, Severity::Low, 4.0),
                finding(FindingKind::MultiArchBloat, Severity::Low, 0.01),
            ],
            resources_scanned: 4,
            repositories_scanned: 1,
            ..ScanResult::default()
        };

        let analysis = analyze(&result, 0.10);
        let summary = &analysis.summary;

        assert_eq!(summary.total_findings, 3);
        assert_eq!(summary.by_severity[&Severity::High], 1);
        assert_eq!(summary.by_severity[&Severity::Medium], 1);
        assert_eq!(summary.by_severity[&Severity::Low], 1);
        assert_eq!(summary.by_resource_type[&ResourceType::Image], 2);
        assert_eq!(summary.by_resource_type[&ResourceType::Repository], 1);
        assert!((summary.total_monthly_waste - 9.0).abs() < 1e-9);
    }

    #[test]
    fn errors_pass_through_unfiltered() {
        let result = ScanResult {
            errors: vec!["us-east-1/broken: timeout".into()],
            ..ScanResult::default()
        };

        let analysis = analyze(&result, 100.0);

        assert!(analysis.findings.is_empty());
        assert_eq!(analysis.errors, vec!["us-east-1/broken: timeout"]);
    }

    #[test]
    fn counters_copy_from_the_scan_result() {
        let result = ScanResult {
            resources_scanned: 42,
            repositories_scanned: 7,
            ..ScanResult::default()
        };

        let analysis = analyze(&result, 0.0);

        assert_eq!(analysis.summary.total_resources_scanned, 42);
        assert_eq!(analysis.summary.repositories_scanned, 7);
        assert_eq!(analysis.summary.total_findings, 0);
    }

    #[test]
    fn zero_threshold_retains_zero_waste_findings() {
        let result = ScanResult {
            findings: vec![finding(FindingKind::NoLifecyclePolicy, Severity::Medium, 0.0)],
            ..ScanResult::default()
        };

        let analysis = analyze(&result, 0.0);
        assert_eq!(analysis.findings.len(), 1);
    }
}
