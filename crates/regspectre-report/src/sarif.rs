//! SARIF v2.1.0 output.
//!
//! One static rule per finding kind, one result per finding. The location
//! URI is synthetic (`registry://region/type/id`) since registry resources
//! have no file path.

use std::io::Write;

use serde::Serialize;
use serde_json::json;

use regspectre_core::{FindingKind, Severity};

use crate::{ReportData, ReportError, ReportRenderer};

const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json";

/// SARIF v2.1.0 renderer for code-scanning ingestion
pub struct SarifRenderer;

#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: &'static str,
    short_description: SarifMessage,
    default_configuration: SarifLevel,
}

#[derive(Serialize)]
struct SarifLevel {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
    properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

impl ReportRenderer for SarifRenderer {
    fn render(&self, data: &ReportData, out: &mut dyn Write) -> Result<(), ReportError> {
        let results = data
            .findings
            .iter()
            .map(|finding| {
                let mut properties = serde_json::Map::new();
                properties.insert(
                    "resourceName".to_owned(),
                    json!(finding.resource_name.clone().unwrap_or_default()),
                );
                properties.insert(
                    "estimatedMonthlyWaste".to_owned(),
                    json!(finding.estimated_monthly_waste),
                );
                properties.insert("metadata".to_owned(), json!(finding.metadata));

                SarifResult {
                    rule_id: finding.id.as_str(),
                    level: level_for(finding.severity),
                    message: SarifMessage {
                        text: finding.message.clone(),
                    },
                    locations: vec![SarifLocation {
                        physical_location: SarifPhysicalLocation {
                            artifact_location: SarifArtifactLocation {
                                uri: format!(
                                    "registry://{}/{}/{}",
                                    finding.region, finding.resource_type, finding.resource_id
                                ),
                            },
                        },
                    }],
                    properties,
                }
            })
            .collect();

        let report = SarifReport {
            schema: SARIF_SCHEMA,
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: data.tool.clone(),
                        version: data.version.clone(),
                        rules: rules(),
                    },
                },
                results,
            }],
        };

        serde_json::to_writer_pretty(&mut *out, &report)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

fn rules() -> Vec<SarifRule> {
    let entries: [(FindingKind, &str, &'static str); 7] = [
        (FindingKind::UntaggedImage, "Untagged container image", "error"),
        (FindingKind::StaleImage, "Stale container image", "error"),
        (FindingKind::LargeImage, "Oversized container image", "warning"),
        (
            FindingKind::NoLifecyclePolicy,
            "No lifecycle policy on repository",
            "warning",
        ),
        (
            FindingKind::VulnerableImage,
            "Vulnerable container image",
            "error",
        ),
        (
            FindingKind::UnusedRepo,
            "Unused container repository",
            "note",
        ),
        (FindingKind::MultiArchBloat, "Multi-architecture bloat", "note"),
    ];

    entries
        .into_iter()
        .map(|(kind, text, level)| SarifRule {
            id: kind.as_str(),
            short_description: SarifMessage {
                text: text.to_owned(),
            },
            default_configuration: SarifLevel { level },
        })
        .collect()
}

const fn level_for(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
    }
}
