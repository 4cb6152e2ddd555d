//! Waste classification rules.
//!
//! Every function here is pure: snapshots plus configuration plus an
//! explicit reference time go in, findings come out. The system clock is
//! never read, which is what keeps staleness decisions deterministic
//! under test.
//!
//! An image can trip several rules at once. Each finding prices the same
//! bytes independently; waste is deliberately not deduplicated across
//! co-occurring findings because each one is a separately actionable
//! signal.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::json;

use crate::pricing;
use crate::types::{
    Finding, FindingKind, ImageSnapshot, Provider, RepositorySnapshot, ResourceType, ScanConfig,
    Severity, SeverityCounts,
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Evaluates the per-image rules against one image snapshot.
///
/// Produces zero or more findings, in rule order: untagged, stale,
/// oversized, multi-arch bloat. Repository-scoped rules live in the
/// sibling constructors below.
#[must_use]
pub fn classify_image(
    provider: Provider,
    repo: &RepositorySnapshot,
    image: &ImageSnapshot,
    cfg: &ScanConfig,
    now: DateTime<Utc>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    let resource_id = image_resource_id(repo, image);
    let cost =
        pricing::monthly_storage_cost(provider.pricing_key(), &repo.region, image.size_bytes);
    #[allow(clippy::cast_precision_loss)]
    let size_mb = image.size_bytes as f64 / BYTES_PER_MB;
    let resource_name =
        (!image.tags.is_empty()).then(|| format!("{}:{}", repo.id, image.tags.join(",")));

    if image.tags.is_empty() {
        let mut metadata = BTreeMap::new();
        metadata.insert("size_bytes".to_owned(), json!(image.size_bytes));
        if let Some(uri) = &image.uri {
            metadata.insert("uri".to_owned(), json!(uri));
        } else {
            metadata.insert("digest".to_owned(), json!(image.digest));
        }
        findings.push(Finding {
            id: FindingKind::UntaggedImage,
            severity: Severity::High,
            resource_type: ResourceType::Image,
            resource_id: resource_id.clone(),
            resource_name: None,
            region: repo.region.clone(),
            message: format!("Untagged image ({size_mb:.0} MB)"),
            estimated_monthly_waste: cost,
            metadata,
        });
    }

    let stale = stale_since(image, cfg, now);
    if let Some((last_activity, days_stale)) = stale {
        let mut metadata = BTreeMap::new();
        let timestamp = last_activity.to_rfc3339_opts(SecondsFormat::Secs, true);
        let message = if provider.records_pull_times() {
            metadata.insert("last_pull".to_owned(), json!(timestamp));
            format!("Not pulled in {days_stale} days ({size_mb:.0} MB)")
        } else {
            metadata.insert("upload_time".to_owned(), json!(timestamp));
            metadata.insert(
                "note".to_owned(),
                json!("GCP AR has no pull timestamp; staleness based on upload time"),
            );
            format!("Uploaded {days_stale} days ago, no pull data available ({size_mb:.0} MB)")
        };
        metadata.insert("days_stale".to_owned(), json!(days_stale));
        metadata.insert("size_bytes".to_owned(), json!(image.size_bytes));
        metadata.insert("stale_days".to_owned(), json!(cfg.stale_days));

        findings.push(Finding {
            id: FindingKind::StaleImage,
            severity: Severity::High,
            resource_type: ResourceType::Image,
            resource_id: resource_id.clone(),
            resource_name: resource_name.clone(),
            region: repo.region.clone(),
            message,
            estimated_monthly_waste: cost,
            metadata,
        });
    }

    if cfg.max_size_bytes > 0 && image.size_bytes > cfg.max_size_bytes {
        let mut metadata = BTreeMap::new();
        metadata.insert("size_bytes".to_owned(), json!(image.size_bytes));
        metadata.insert("threshold_bytes".to_owned(), json!(cfg.max_size_bytes));
        findings.push(Finding {
            id: FindingKind::LargeImage,
            severity: Severity::Medium,
            resource_type: ResourceType::Image,
            resource_id: resource_id.clone(),
            resource_name: resource_name.clone(),
            region: repo.region.clone(),
            message: format!(
                "Image is {size_mb:.0} MB (threshold: {} MB)",
                cfg.max_size_bytes / (1024 * 1024)
            ),
            estimated_monthly_waste: cost,
            metadata,
        });
    }

    // Bloat is only reported when the multi-platform image is also stale;
    // a fresh manifest list is presumed intentional.
    if image.is_multi_platform() && stale.is_some() {
        let mut metadata = BTreeMap::new();
        metadata.insert("size_bytes".to_owned(), json!(image.size_bytes));
        metadata.insert(
            "media_type".to_owned(),
            json!(image.media_type.clone().unwrap_or_default()),
        );
        findings.push(Finding {
            id: FindingKind::MultiArchBloat,
            severity: Severity::Low,
            resource_type: ResourceType::Image,
            resource_id,
            resource_name,
            region: repo.region.clone(),
            message: format!("Stale multi-architecture image ({size_mb:.0} MB)"),
            estimated_monthly_waste: cost,
            metadata,
        });
    }

    findings
}

/// Finding for a repository that contains no images at all
#[must_use]
pub fn empty_repository_finding(provider: Provider, repo: &RepositorySnapshot) -> Finding {
    let message = match provider {
        Provider::Ecr => "Repository has no images",
        Provider::ArtifactRegistry => "Repository has no Docker images",
    };
    Finding {
        id: FindingKind::UnusedRepo,
        severity: Severity::Low,
        resource_type: ResourceType::Repository,
        resource_id: repo.id.clone(),
        resource_name: None,
        region: repo.region.clone(),
        message: message.to_owned(),
        estimated_monthly_waste: 0.0,
        metadata: BTreeMap::new(),
    }
}

/// Finding for a repository whose every image was flagged stale.
///
/// Waste is the sum of the individual images' monthly storage costs;
/// the whole repository is a deletion candidate.
#[must_use]
pub fn stale_repository_finding(
    provider: Provider,
    repo: &RepositorySnapshot,
    images: &[ImageSnapshot],
) -> Finding {
    let total_waste: f64 = images
        .iter()
        .map(|img| {
            pricing::monthly_storage_cost(provider.pricing_key(), &repo.region, img.size_bytes)
        })
        .sum();

    let mut metadata = BTreeMap::new();
    metadata.insert("image_count".to_owned(), json!(images.len()));

    Finding {
        id: FindingKind::UnusedRepo,
        severity: Severity::Low,
        resource_type: ResourceType::Repository,
        resource_id: repo.id.clone(),
        resource_name: None,
        region: repo.region.clone(),
        message: format!("All {} images are stale", images.len()),
        estimated_monthly_waste: total_waste,
        metadata,
    }
}

/// Finding for a repository with no lifecycle policy configured
#[must_use]
pub fn missing_lifecycle_policy_finding(repo: &RepositorySnapshot) -> Finding {
    Finding {
        id: FindingKind::NoLifecyclePolicy,
        severity: Severity::Medium,
        resource_type: ResourceType::Repository,
        resource_id: repo.id.clone(),
        resource_name: None,
        region: repo.region.clone(),
        message: "No lifecycle policy configured — images accumulate indefinitely".to_owned(),
        estimated_monthly_waste: 0.0,
        metadata: BTreeMap::new(),
    }
}

/// Finding for an image whose registry scan reports blocking CVEs.
///
/// Returns `None` when the counts contain no critical or high entries;
/// low/medium-only results are not worth a finding.
#[must_use]
pub fn vulnerability_finding(
    repo: &RepositorySnapshot,
    digest: &str,
    counts: &SeverityCounts,
) -> Option<Finding> {
    if counts.critical == 0 && counts.high == 0 {
        return None;
    }

    let mut metadata = BTreeMap::new();
    metadata.insert("total_findings".to_owned(), json!(counts.total));
    metadata.insert("critical_count".to_owned(), json!(counts.critical));
    metadata.insert("high_count".to_owned(), json!(counts.high));
    metadata.insert("severity_counts".to_owned(), json!(counts.by_severity));

    Some(Finding {
        id: FindingKind::VulnerableImage,
        severity: Severity::Critical,
        resource_type: ResourceType::Image,
        resource_id: format!("{}@{digest}", repo.id),
        resource_name: None,
        region: repo.region.clone(),
        message: format!(
            "{} vulnerabilities ({} critical, {} high)",
            counts.total, counts.critical, counts.high
        ),
        estimated_monthly_waste: 0.0,
        metadata,
    })
}

/// Identifier used for image-scoped findings.
///
/// Artifact Registry images carry a pullable URI; ECR images are
/// addressed as `repo@digest`.
fn image_resource_id(repo: &RepositorySnapshot, image: &ImageSnapshot) -> String {
    image
        .uri
        .clone()
        .unwrap_or_else(|| format!("{}@{}", repo.id, image.digest))
}

/// Last activity and whole days since it, when past the staleness
/// threshold.
///
/// Activity prefers the last pull; providers without pull data fall
/// through to the push/upload time. Images with neither timestamp are
/// never stale.
fn stale_since(
    image: &ImageSnapshot,
    cfg: &ScanConfig,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, i64)> {
    if cfg.stale_days == 0 {
        return None;
    }
    let last_activity = image.last_pull.or(image.pushed_at)?;
    let threshold = now - Duration::days(i64::from(cfg.stale_days));
    (last_activity < threshold).then(|| (last_activity, (now - last_activity).num_days()))
}
