//! Machine-readable envelopes.

use std::io::Write;

use serde::Serialize;

use crate::{ReportData, ReportError, ReportRenderer};

const SCHEMA: &str = "spectre/v1";

/// Versioned `spectre/v1` JSON envelope
pub struct JsonRenderer;

/// SpectreHub ingest envelope; same body, different schema tag
pub struct SpectreHubRenderer;

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "$schema")]
    schema: &'static str,
    #[serde(flatten)]
    data: &'a ReportData,
}

#[derive(Serialize)]
struct HubEnvelope<'a> {
    schema: &'static str,
    #[serde(flatten)]
    data: &'a ReportData,
}

impl ReportRenderer for JsonRenderer {
    fn render(&self, data: &ReportData, out: &mut dyn Write) -> Result<(), ReportError> {
        write_pretty(&Envelope { schema: SCHEMA, data }, out)
    }
}

impl ReportRenderer for SpectreHubRenderer {
    fn render(&self, data: &ReportData, out: &mut dyn Write) -> Result<(), ReportError> {
        write_pretty(&HubEnvelope { schema: SCHEMA, data }, out)
    }
}

fn write_pretty<T: Serialize>(value: &T, out: &mut dyn Write) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}
