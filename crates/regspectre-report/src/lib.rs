//! Report rendering.
//!
//! Four renderers share one [`ReportData`] input: a terminal table, a
//! `spectre/v1` JSON envelope, SARIF v2.1.0 for code-scanning ingestion,
//! and the SpectreHub variant of the envelope. Every renderer produces
//! valid output for an empty findings list.

#![doc(html_root_url = "https://docs.rs/regspectre-report/0.1.0")]

mod data;
mod json;
mod sarif;
mod text;

pub use data::{ReportConfig, ReportData, ReportFormat, Target};
pub use json::{JsonRenderer, SpectreHubRenderer};
pub use sarif::SarifRenderer;
pub use text::TextRenderer;

use std::io::Write;

/// Errors that can occur while rendering a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Writing to the output sink failed
    #[error("write report: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the report body failed
    #[error("encode report: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested format name is not recognized
    #[error("unsupported format: {0} (use text, json, sarif, or spectrehub)")]
    UnknownFormat(String),
}

/// Renders one report into a byte sink
pub trait ReportRenderer {
    /// Write the complete report for `data` to `out`
    fn render(&self, data: &ReportData, out: &mut dyn Write) -> Result<(), ReportError>;
}

impl ReportFormat {
    /// The renderer implementing this format
    #[must_use]
    pub fn renderer(self) -> Box<dyn ReportRenderer> {
        match self {
            Self::Text => Box::new(TextRenderer),
            Self::Json => Box::new(JsonRenderer),
            Self::Sarif => Box::new(SarifRenderer),
            Self::SpectreHub => Box::new(SpectreHubRenderer),
        }
    }
}
