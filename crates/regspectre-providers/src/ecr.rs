//! AWS Elastic Container Registry adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ecr::error::DisplayErrorContext;
use aws_sdk_ecr::types::{
    FindingSeverity, ImageDetail, ImageIdentifier, ImageScanFindings, Repository,
};
use aws_sdk_ecr::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use regspectre_core::{ImageSnapshot, Provider, RepositorySnapshot, SeverityCounts};
use regspectre_scan::{Capabilities, ProviderError, ProviderResult, RegistryProvider};

/// Connection options for [`EcrProvider::connect`]
#[derive(Debug, Clone, Default)]
pub struct EcrOptions {
    /// Named credentials profile; the default chain applies when unset
    pub profile: Option<String>,

    /// Regions to walk. Falls back to the profile's default region
    pub regions: Vec<String>,
}

/// ECR adapter backed by the official AWS SDK.
///
/// Holds one client per region so a multi-region scan reuses the shared
/// credential cache and connection pool.
pub struct EcrProvider {
    clients: HashMap<String, Client>,
    regions: Vec<String>,
}

impl EcrProvider {
    /// Loads the AWS configuration chain and builds one client per region.
    ///
    /// Credential problems do not surface here; the SDK resolves
    /// credentials lazily on the first API call. A provider with no
    /// resolvable region scans nothing, which callers should treat as a
    /// configuration error.
    pub async fn connect(options: EcrOptions) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &options.profile {
            loader = loader.profile_name(profile);
        }
        let base = loader.load().await;

        let regions = if options.regions.is_empty() {
            base.region()
                .map(|region| vec![region.as_ref().to_owned()])
                .unwrap_or_default()
        } else {
            options.regions
        };

        let clients = regions
            .iter()
            .map(|region| {
                let conf = base
                    .to_builder()
                    .region(Region::new(region.clone()))
                    .build();
                (region.clone(), Client::new(&conf))
            })
            .collect();

        Self { clients, regions }
    }

    fn client(&self, region: &str) -> ProviderResult<&Client> {
        self.clients
            .get(region)
            .ok_or_else(|| ProviderError::Transport(format!("no client for region {region}")))
    }
}

#[async_trait]
impl RegistryProvider for EcrProvider {
    fn provider(&self) -> Provider {
        Provider::Ecr
    }

    fn scopes(&self) -> &[String] {
        &self.regions
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            lifecycle_policy: true,
            vulnerability_scan: true,
        }
    }

    async fn list_repositories(&self, scope: &str) -> ProviderResult<Vec<RepositorySnapshot>> {
        let client = self.client(scope)?;
        let mut repos = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = client.describe_repositories();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }
            let output = request.send().await.map_err(|err| {
                ProviderError::Transport(format!(
                    "describe repositories: {}",
                    DisplayErrorContext(&err)
                ))
            })?;

            repos.extend(
                output
                    .repositories()
                    .iter()
                    .map(|repo| repository_snapshot(repo, scope)),
            );

            match output.next_token() {
                Some(token) => next_token = Some(token.to_owned()),
                None => break,
            }
        }

        debug!(region = %scope, count = repos.len(), "described repositories");
        Ok(repos)
    }

    async fn list_images(&self, repo: &RepositorySnapshot) -> ProviderResult<Vec<ImageSnapshot>> {
        let client = self.client(&repo.region)?;
        let mut images = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = client.describe_images().repository_name(&repo.name);
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }
            let output = request.send().await.map_err(|err| {
                ProviderError::Transport(format!(
                    "describe images for {}: {}",
                    repo.name,
                    DisplayErrorContext(&err)
                ))
            })?;

            images.extend(output.image_details().iter().map(image_snapshot));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_owned()),
                None => break,
            }
        }

        Ok(images)
    }

    async fn has_lifecycle_policy(&self, repo: &RepositorySnapshot) -> ProviderResult<bool> {
        let client = self.client(&repo.region)?;
        match client
            .get_lifecycle_policy()
            .repository_name(&repo.name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            // Absence of a policy is an answer, not a failure.
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_lifecycle_policy_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(err) => Err(ProviderError::Transport(format!(
                "get lifecycle policy for {}: {}",
                repo.name,
                DisplayErrorContext(&err)
            ))),
        }
    }

    async fn vulnerability_counts(
        &self,
        repo: &RepositorySnapshot,
        digest: &str,
    ) -> ProviderResult<Option<SeverityCounts>> {
        let client = self.client(&repo.region)?;
        let image_id = ImageIdentifier::builder().image_digest(digest).build();

        let output = match client
            .describe_image_scan_findings()
            .repository_name(&repo.name)
            .image_id(image_id)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_scan_not_found_exception()) =>
            {
                return Ok(None);
            }
            Err(err) => {
                return Err(ProviderError::Transport(format!(
                    "describe image scan findings for {}: {}",
                    repo.name,
                    DisplayErrorContext(&err)
                )));
            }
        };

        Ok(output.image_scan_findings().map(severity_counts))
    }
}

fn repository_snapshot(repo: &Repository, region: &str) -> RepositorySnapshot {
    let name = repo.repository_name().unwrap_or_default().to_owned();
    RepositorySnapshot {
        id: name.clone(),
        name,
        region: region.to_owned(),
        format: None,
    }
}

fn image_snapshot(detail: &ImageDetail) -> ImageSnapshot {
    ImageSnapshot {
        digest: detail.image_digest().unwrap_or_default().to_owned(),
        uri: None,
        tags: detail.image_tags().to_vec(),
        size_bytes: u64::try_from(detail.image_size_in_bytes().unwrap_or_default()).unwrap_or(0),
        pushed_at: detail.image_pushed_at().and_then(to_chrono),
        last_pull: detail.last_recorded_pull_time().and_then(to_chrono),
        media_type: detail.image_manifest_media_type().map(ToOwned::to_owned),
    }
}

fn severity_counts(findings: &ImageScanFindings) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    if let Some(map) = findings.finding_severity_counts() {
        for (severity, n) in map {
            let n = usize::try_from(*n).unwrap_or(0);
            counts.total += n;
            match severity {
                FindingSeverity::Critical => counts.critical += n,
                FindingSeverity::High => counts.high += n,
                _ => {}
            }
            counts.by_severity.insert(severity.as_str().to_owned(), n);
        }
    }
    counts
}

fn to_chrono(timestamp: &aws_sdk_ecr::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}
