//! Human-readable terminal output.

use std::io::Write;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::{ReportData, ReportError, ReportRenderer};

/// Findings table plus a summary block
pub struct TextRenderer;

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "SEVERITY")]
    severity: String,
    #[tabled(rename = "TYPE")]
    resource_type: String,
    #[tabled(rename = "RESOURCE")]
    resource: String,
    #[tabled(rename = "REGION")]
    region: String,
    #[tabled(rename = "WASTE/MO")]
    waste: String,
    #[tabled(rename = "MESSAGE")]
    message: String,
}

impl ReportRenderer for TextRenderer {
    fn render(&self, data: &ReportData, out: &mut dyn Write) -> Result<(), ReportError> {
        writeln!(out, "{} — Container Registry Waste Report", data.tool)?;
        writeln!(out, "{}", "=".repeat(45))?;
        writeln!(out)?;

        if data.findings.is_empty() {
            writeln!(out, "No waste found in container registries.")?;
            writeln!(out)?;
            return write_summary(data, out);
        }

        writeln!(
            out,
            "Found {} issues with estimated monthly waste of ${:.2}",
            data.summary.total_findings, data.summary.total_monthly_waste
        )?;
        writeln!(out)?;

        let rows: Vec<FindingRow> = data
            .findings
            .iter()
            .map(|f| FindingRow {
                severity: f.severity.to_string(),
                resource_type: f.resource_type.to_string(),
                resource: f
                    .resource_name
                    .clone()
                    .unwrap_or_else(|| f.resource_id.clone()),
                region: f.region.clone(),
                waste: format!("${:.2}", f.estimated_monthly_waste),
                message: f.message.clone(),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        writeln!(out, "{table}")?;
        writeln!(out)?;
        write_summary(data, out)
    }
}

fn write_summary(data: &ReportData, out: &mut dyn Write) -> Result<(), ReportError> {
    writeln!(out, "Summary")?;
    writeln!(out, "-------")?;
    writeln!(
        out,
        "Resources scanned:       {}",
        data.summary.total_resources_scanned
    )?;
    writeln!(
        out,
        "Repositories scanned:    {}",
        data.summary.repositories_scanned
    )?;
    writeln!(out, "Total findings:          {}", data.summary.total_findings)?;
    writeln!(
        out,
        "Estimated monthly waste: ${:.2}",
        data.summary.total_monthly_waste
    )?;

    if !data.summary.by_severity.is_empty() {
        let parts: Vec<String> = data
            .summary
            .by_severity
            .iter()
            .map(|(severity, count)| format!("{severity}={count}"))
            .collect();
        writeln!(out, "By severity:             {}", parts.join(", "))?;
    }
    if !data.summary.by_resource_type.is_empty() {
        let parts: Vec<String> = data
            .summary
            .by_resource_type
            .iter()
            .map(|(resource_type, count)| format!("{resource_type}={count}"))
            .collect();
        writeln!(out, "By resource type:        {}", parts.join(", "))?;
    }

    if !data.errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings ({}):", data.errors.len())?;
        for err in &data.errors {
            writeln!(out, "  - {err}")?;
        }
    }

    Ok(())
}
