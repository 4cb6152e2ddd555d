//! `regspectre aws` command.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use chrono::Utc;
use regspectre::report::{ReportConfig, ReportData, Target};
use regspectre::{
    EcrOptions, EcrProvider, ProgressCallback, ProviderError, RegistryProvider, Scanner,
};
use regspectre_core::{
    analyzer, Finding, Provider, RepositorySnapshot, ResourceType, ScanResult,
};
use tokio::time::Instant;
use tracing::info;

use super::{
    build_exclude_set, compute_target_hash, print_progress, require_scan_progress, write_report,
    ScanSettings,
};
use crate::cli::args::AwsArgs;
use crate::config::FileConfig;

pub async fn execute(args: AwsArgs) -> Result<()> {
    let cfg = FileConfig::load_or_default();

    let settings = ScanSettings::resolve(
        &cfg,
        args.stale_days,
        args.max_size_mb,
        args.min_monthly_cost,
        args.format.as_deref(),
        args.timeout,
    )?;

    let profile = args.profile.or_else(|| cfg.profile.clone());
    let regions = if args.regions.is_empty() {
        cfg.regions.clone()
    } else {
        args.regions
    };

    let provider = EcrProvider::connect(EcrOptions {
        profile: profile.clone(),
        regions,
    })
    .await;

    if provider.scopes().is_empty() {
        bail!("no AWS region configured; use --region or set AWS_REGION");
    }
    let regions = provider.scopes().to_vec();
    info!(regions = ?regions, "scanning ECR");

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

    let mut result = scanner.scan(&scan_cfg, progress).await;
    require_scan_progress("scan ECR", &result)?;

    if args.include_scan {
        append_vulnerability_findings(&scanner, &mut result).await;
    }

    let analysis = analyzer::analyze(&result, settings.min_monthly_cost);

    let data = ReportData {
        tool: "regspectre".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        timestamp: Utc::now(),
        target: Target {
            kind: Provider::Ecr.target_type().to_owned(),
            uri_hash: compute_target_hash(
                Provider::Ecr.family(),
                &regions,
                profile.as_deref().unwrap_or_default(),
            ),
        },
        config: ReportConfig {
            provider: Provider::Ecr.family().to_owned(),
            regions,
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

/// Looks up registry CVE scan results for every image that already has a
/// finding and appends any vulnerability findings to the result.
///
/// Scan lookups are rate-limited, so only flagged images are checked,
/// each digest once.
async fn append_vulnerability_findings(scanner: &Scanner<EcrProvider>, result: &mut ScanResult) {
    let mut extra = Vec::new();

    for (region, repo_id, digest) in vulnerability_targets(&result.findings) {
        let repo = RepositorySnapshot {
            name: repo_id.clone(),
            id: repo_id,
            region,
            format: None,
        };

        match scanner.check_image_vulnerabilities(&repo, &digest).await {
            Ok(findings) => extra.extend(findings),
            Err(err @ ProviderError::DeadlineExceeded) => {
                result.push_error(err.to_string());
                break;
            }
            Err(err) => {
                result.push_error(format!("{}/{} scan: {err}", repo.region, repo.id));
            }
        }
    }

    result.findings.extend(extra);
}

/// Distinct `(region, repository, digest)` triples of image-scoped
/// findings, in a deterministic order.
fn vulnerability_targets(findings: &[Finding]) -> BTreeSet<(String, String, String)> {
    let mut targets = BTreeSet::new();
    for finding in findings {
        if finding.resource_type != ResourceType::Image {
            continue;
        }
        let Some((repo_id, digest)) = finding.resource_id.split_once('@') else {
            continue;
        };
        targets.insert((
            finding.region.clone(),
            repo_id.to_owned(),
            digest.to_owned(),
        ));
    }
    targets
}
