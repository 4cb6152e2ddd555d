//! Core types and pure audit logic for regspectre.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Types**: snapshots of registry state, findings, scan configuration
//! - **Pricing**: flat per-GB-month storage rates with fallbacks
//! - **Classify**: the rule set that turns snapshots into findings
//! - **Analyzer**: cost filtering and summary statistics
//!
//! Provider adapters and the scan engine build on these; nothing here can
//! fail at runtime, and nothing here reads the system clock.
//!
//! # Example
//!
//! ```rust,ignore
//! use regspectre_core::{analyze, ScanResult};
//!
//! fn summarize(result: &ScanResult) {
//!     let analysis = analyze(result, 0.10);
//!     println!("${:.2}/month wasted", analysis.summary.total_monthly_waste);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/regspectre-core/0.1.0")]

pub mod analyzer;
pub mod classify;
pub mod pricing;
pub mod types;

pub use analyzer::{analyze, AnalysisResult, Summary};
pub use types::*;
