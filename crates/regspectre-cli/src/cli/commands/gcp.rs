//! `regspectre gcp` command.

use anyhow::{bail, Result};
use chrono::Utc;
use regspectre::report::{ReportConfig, ReportData, Target};
use regspectre::{ArtifactRegistryProvider, ProgressCallback, Scanner};
use regspectre_core::{analyzer, Provider};
use tokio::time::Instant;
use tracing::info;

use super::{
    build_exclude_set, compute_target_hash, enhance_error, print_progress, require_scan_progress,
    write_report, ScanSettings,
};
use crate::cli::args::GcpArgs;
use crate::config::FileConfig;

pub async fn execute(args: GcpArgs) -> Result<()> {
    let cfg = FileConfig::load_or_default();

    let settings = ScanSettings::resolve(
        &cfg,
        args.stale_days,
        args.max_size_mb,
        args.min_monthly_cost,
        args.format.as_deref(),
        args.timeout,
    )?;

    let Some(project) = args.project.or_else(|| cfg.project.clone()) else {
        bail!("--project is required for GCP scans");
    };

    let locations = if args.locations.is_empty() {
        cfg.regions.clone()
    } else {
        args.locations
    };
    if locations.is_empty() {
        bail!("--locations is required (e.g., us-central1,europe-west1)");
    }

    info!(project = %project, locations = ?locations, "scanning Artifact Registry");

    let provider = ArtifactRegistryProvider::connect(project.clone(), locations.clone())
        .await
        .map_err(|err| enhance_error("initialize GCP client", err.into()))?;

    let scan_cfg = settings.scan_config(build_exclude_set(&cfg.exclude, &args.exclude_tags));

    let mut scanner = Scanner::new(provider);
    if !settings.timeout.is_zero() {
        scanner = scanner.with_deadline(Instant::now() + settings.timeout);
    }

    let progress: Option<ProgressCallback<'_>> = if args.no_progress {
        None
    } else {
        Some(&print_progress)
    };

    let result = scanner.scan(&scan_cfg, progress).await;
    require_scan_progress("scan Artifact Registry", &result)?;

    let analysis = analyzer::analyze(&result, settings.min_monthly_cost);

    let data = ReportData {
        tool: "regspectre".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        timestamp: Utc::now(),
        target: Target {
            kind: Provider::ArtifactRegistry.target_type().to_owned(),
            uri_hash: compute_target_hash(Provider::ArtifactRegistry.family(), &locations, &project),
        },
        config: ReportConfig {
            provider: Provider::ArtifactRegistry.family().to_owned(),
            regions: locations,
            stale_days: settings.stale_days,
            max_size_mb: settings.max_size_mb,
            min_monthly_cost: settings.min_monthly_cost,
        },
        findings: analysis.findings,
        summary: analysis.summary,
        errors: analysis.errors,
    };

    write_report(&data, settings.format, args.output.as_deref())
}
