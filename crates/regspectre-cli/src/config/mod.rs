//! Configuration file loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Settings loaded from `.regspectre.yaml` in the working directory.
///
/// Every field is optional. Command-line flags take precedence over the
/// file, and built-in defaults fill whatever remains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Cloud provider the audit targets (`aws` or `gcp`).
    pub provider: Option<String>,

    /// Regions (AWS) or locations (GCP) to scan.
    pub regions: Vec<String>,

    /// AWS profile name.
    pub profile: Option<String>,

    /// GCP project ID.
    pub project: Option<String>,

    /// Staleness threshold in days.
    pub stale_days: Option<u32>,

    /// Image size threshold in megabytes.
    pub max_size_mb: Option<u64>,

    /// Minimum monthly cost, in USD, for a finding to be reported.
    pub min_monthly_cost: Option<f64>,

    /// Default output format.
    pub format: Option<String>,

    /// Scan timeout, e.g. `90s`, `10m`, `1h`.
    pub timeout: Option<String>,

    /// Resources to skip during scanning.
    pub exclude: ExcludeConfig,
}

/// Exclusion rules from the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeConfig {
    /// Repository identifiers to skip entirely.
    pub resource_ids: Vec<String>,

    /// `Key=Value` tag pairs to skip.
    pub tags: Vec<String>,
}

impl FileConfig {
    /// Candidate file names, checked in order.
    const CANDIDATES: [&'static str; 2] = [".regspectre.yaml", ".regspectre.yml"];

    /// Loads the config from `dir`, returning defaults when no file exists.
    pub fn load(dir: &Path) -> Result<Self> {
        for name in Self::CANDIDATES {
            let path = dir.join(name);
            if !path.exists() {
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("read config {}", path.display()))?;
            let config: Self = serde_yaml::from_str(&content)
                .with_context(|| format!("parse config {}", path.display()))?;
            return Ok(config);
        }

        Ok(Self::default())
    }

    /// Loads from the current directory, logging and ignoring failures.
    ///
    /// A broken config file must not block a scan the flags fully
    /// describe, so errors degrade to the defaults with a warning.
    #[must_use]
    pub fn load_or_default() -> Self {
        Self::load(Path::new(".")).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load config file");
            Self::default()
        })
    }
}

/// Parses a duration written as an integer with an `s`, `m`, or `h`
/// suffix, e.g. `90s`, `10m`, `2h`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    let unit_start = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(unit_start);

    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration: {input}"))?;

    let secs = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        _ => bail!("invalid duration: {input} (use a unit, e.g. 90s, 10m, 1h)"),
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FileConfig::load(dir.path()).unwrap();
        assert!(cfg.provider.is_none());
        assert!(cfg.regions.is_empty());
        assert!(cfg.exclude.resource_ids.is_empty());
    }

    #[test]
    fn loads_yaml_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".regspectre.yaml"),
            "provider: aws\nregions:\n  - us-east-1\n  - eu-west-1\nstale_days: 30\nexclude:\n  resource_ids:\n    - myapp/production\n",
        )
        .unwrap();

        let cfg = FileConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.provider.as_deref(), Some("aws"));
        assert_eq!(cfg.regions, vec!["us-east-1", "eu-west-1"]);
        assert_eq!(cfg.stale_days, Some(30));
        assert!(cfg.max_size_mb.is_none());
        assert_eq!(cfg.exclude.resource_ids, vec!["myapp/production"]);
    }

    #[test]
    fn prefers_yaml_over_yml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".regspectre.yaml"), "stale_days: 10\n").unwrap();
        std::fs::write(dir.path().join(".regspectre.yml"), "stale_days: 20\n").unwrap();

        let cfg = FileConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.stale_days, Some(10));
    }

    #[test]
    fn falls_back_to_yml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".regspectre.yml"), "project: acme\n").unwrap();

        let cfg = FileConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.project.as_deref(), Some("acme"));
    }

    #[test]
    fn unparseable_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".regspectre.yaml"), "stale_days: [not a number\n").unwrap();

        let err = FileConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("parse config"));
    }

    #[test]
    fn parses_durations_with_units() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn rejects_durations_without_a_unit() {
        assert!(parse_duration("90").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("").is_err());
    }
}
