//! Command implementations.

pub mod aws;
pub mod gcp;
pub mod init;
pub mod version;

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use regspectre::report::{ReportData, ReportFormat};
use regspectre_core::{
    ExcludeSet, ScanConfig, ScanProgress, ScanResult, DEFAULT_MAX_SIZE_MB,
    DEFAULT_MIN_MONTHLY_COST, DEFAULT_STALE_DAYS,
};

use crate::config::{ExcludeConfig, FileConfig};

/// Fallback scan timeout when neither flag nor config file sets one.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Effective scan thresholds after merging flags, the config file, and
/// the built-in defaults. Flags win over the file; the file wins over
/// the defaults.
#[derive(Debug)]
pub(crate) struct ScanSettings {
    pub stale_days: u32,
    pub max_size_mb: u64,
    pub min_monthly_cost: f64,
    pub format: ReportFormat,
    pub timeout: Duration,
}

impl ScanSettings {
    pub fn resolve(
        cfg: &FileConfig,
        stale_days: Option<u32>,
        max_size_mb: Option<u64>,
        min_monthly_cost: Option<f64>,
        format: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let format = match format.or(cfg.format.as_deref()) {
            Some(name) => name.parse()?,
            None => ReportFormat::default(),
        };

        let timeout = match timeout {
            Some(value) => value,
            None => cfg
                .timeout
                .as_deref()
                .map(crate::config::parse_duration)
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),
        };

        Ok(Self {
            stale_days: stale_days.or(cfg.stale_days).unwrap_or(DEFAULT_STALE_DAYS),
            max_size_mb: max_size_mb.or(cfg.max_size_mb).unwrap_or(DEFAULT_MAX_SIZE_MB),
            min_monthly_cost: min_monthly_cost
                .or(cfg.min_monthly_cost)
                .unwrap_or(DEFAULT_MIN_MONTHLY_COST),
            format,
            timeout,
        })
    }

    /// Scan-engine view of these settings.
    pub fn scan_config(&self, exclude: ExcludeSet) -> ScanConfig {
        ScanConfig {
            stale_days: self.stale_days,
            max_size_bytes: self.max_size_mb * 1024 * 1024,
            min_monthly_cost: self.min_monthly_cost,
            exclude,
        }
    }
}

/// Wraps an error with context and a remediation hint for common cloud
/// credential and permission failures.
pub(crate) fn enhance_error(action: &str, err: anyhow::Error) -> anyhow::Error {
    let msg = format!("{err:#}");

    let hint = if msg.contains("NoCredentialProviders") || msg.contains("CredentialsNotLoaded") {
        Some("Configure AWS credentials: set AWS_PROFILE, AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY, or run 'aws configure'")
    } else if msg.contains("ExpiredToken") {
        Some("AWS session token expired. Refresh credentials or run 'aws sso login'")
    } else if msg.contains("AccessDenied") || msg.contains("UnauthorizedAccess") {
        Some("Insufficient permissions. Apply the IAM policy from 'regspectre init' to your role/user")
    } else if msg.contains("RequestExpired") {
        Some("Request expired. Check system clock synchronization")
    } else if msg.contains("Throttling") {
        Some("API rate limit hit. Retry with fewer regions or increase timeout")
    } else if msg.contains("GOOGLE_APPLICATION_CREDENTIALS") {
        Some("Configure GCP credentials: set GOOGLE_APPLICATION_CREDENTIALS or run 'gcloud auth application-default login'")
    } else if msg.contains("could not find default credentials") {
        Some("Configure GCP credentials: run 'gcloud auth application-default login'")
    } else {
        None
    };

    match hint {
        Some(hint) => anyhow::anyhow!("{action}: {msg}\n  hint: {hint}"),
        None => err.context(action.to_owned()),
    }
}

/// Stable SHA-256 identifier for the scan target. Reports carry the hash
/// instead of account or project names.
pub(crate) fn compute_target_hash(provider: &str, regions: &[String], project: &str) -> String {
    let input = format!(
        "provider:{provider},regions:{},project:{project}",
        regions.join(",")
    );
    let digest = ring::digest::digest(&ring::digest::SHA256, input.as_bytes());
    format!("sha256:{}", hex::encode(digest.as_ref()))
}

/// Merges `Key=Value` exclusion tags from the config file and flags.
/// Entries without `=` become keys with an empty value.
pub(crate) fn parse_exclude_tags(
    config_tags: &[String],
    flag_tags: &[String],
) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    for entry in config_tags.iter().chain(flag_tags) {
        match entry.split_once('=') {
            Some((key, value)) => tags.insert(key.to_owned(), value.to_owned()),
            None => tags.insert(entry.clone(), String::new()),
        };
    }
    tags
}

/// Builds the exclusion set from config file entries plus flag tags.
pub(crate) fn build_exclude_set(exclude: &ExcludeConfig, flag_tags: &[String]) -> ExcludeSet {
    ExcludeSet {
        resource_ids: exclude.resource_ids.iter().cloned().collect(),
        tags: parse_exclude_tags(&exclude.tags, flag_tags),
    }
}

/// Renders the report to the output file, or stdout when none is given.
pub(crate) fn write_report(
    data: &ReportData,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let renderer = format.renderer();
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("create output file {}", path.display()))?;
            renderer.render(data, &mut file)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            renderer.render(data, &mut stdout)?;
        }
    }
    Ok(())
}

/// Progress line printer wired into the scanner unless `--no-progress`.
pub(crate) fn print_progress(progress: ScanProgress) {
    eprintln!("[{}] {}", progress.region, progress.message);
}

/// Converts a scan that enumerated nothing into a hard error.
///
/// Scans with partial errors still produce a report. A scan that could
/// not list a single repository has nothing to report, and its first
/// error usually names the credential or permission problem.
pub(crate) fn require_scan_progress(action: &str, result: &ScanResult) -> Result<()> {
    if result.repositories_scanned == 0 {
        if let Some(first) = result.errors.first() {
            return Err(enhance_error(action, anyhow::anyhow!("{first}")));
        }
    }
    Ok(())
}
