//! GCP Artifact Registry adapter.
//!
//! Talks to the `artifactregistry.googleapis.com` REST API directly rather
//! than through a generated client. Only Docker-format repositories are
//! surfaced; the API reports no pull timestamps, so staleness downstream is
//! based on upload time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tokio::process::Command;
use tracing::debug;

use regspectre_core::{ImageSnapshot, Provider, RepositorySnapshot};
use regspectre_scan::{Capabilities, ProviderError, ProviderResult, RegistryProvider};

/// The Artifact Registry API base URL
const DEFAULT_BASE_URL: &str = "https://artifactregistry.googleapis.com";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable consulted before shelling out to gcloud
const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Artifact Registry adapter speaking the v1 REST API
pub struct ArtifactRegistryProvider {
    http: HttpClient,
    base_url: String,
    token: String,
    project: String,
    locations: Vec<String>,
}

impl ArtifactRegistryProvider {
    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(project: impl Into<String>, locations: Vec<String>) -> ArtifactRegistryBuilder {
        ArtifactRegistryBuilder::new(project, locations)
    }

    /// Connect with default settings, resolving credentials from the
    /// environment or the gcloud CLI
    pub async fn connect(
        project: impl Into<String>,
        locations: Vec<String>,
    ) -> ProviderResult<Self> {
        ArtifactRegistryBuilder::new(project, locations).connect().await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ProviderResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ProviderError::Transport(e.to_string()))?;
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();

            // Google error envelopes carry the readable part in error.message
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(String::from)
                })
                .unwrap_or(body);

            Err(match status.as_u16() {
                401 => ProviderError::Auth(message),
                403 => ProviderError::AccessDenied(message),
                code => ProviderError::Transport(format!("HTTP {code}: {message}")),
            })
        }
    }
}

#[async_trait]
impl RegistryProvider for ArtifactRegistryProvider {
    fn provider(&self) -> Provider {
        Provider::ArtifactRegistry
    }

    fn scopes(&self) -> &[String] {
        &self.locations
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    async fn list_repositories(&self, scope: &str) -> ProviderResult<Vec<RepositorySnapshot>> {
        let parent = format!("projects/{}/locations/{}", self.project, scope);
        let url = format!("{}/v1/{parent}/repositories", self.base_url);
        debug!(parent = %parent, "listing repositories");

        let mut repos = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&self.token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListRepositoriesResponse = self
                .get_json(request)
                .await
                .map_err(|err| wrap(err, &format!("list repositories in {parent}")))?;

            repos.extend(
                page.repositories
                    .iter()
                    .filter(|repo| repo.format == "DOCKER")
                    .map(|repo| repository_snapshot(repo, scope)),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(repos)
    }

    async fn list_images(&self, repo: &RepositorySnapshot) -> ProviderResult<Vec<ImageSnapshot>> {
        let url = format!("{}/v1/{}/dockerImages", self.base_url, repo.name);
        debug!(repo = %repo.name, "listing docker images");

        let mut images = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&self.token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListDockerImagesResponse = self
                .get_json(request)
                .await
                .map_err(|err| wrap(err, &format!("list docker images in {}", repo.name)))?;

            images.extend(page.docker_images.into_iter().map(image_snapshot));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(images)
    }
}

/// Builder for configuring an [`ArtifactRegistryProvider`]
pub struct ArtifactRegistryBuilder {
    project: String,
    locations: Vec<String>,
    base_url: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl ArtifactRegistryBuilder {
    /// Create a new builder for the given project and locations
    #[must_use]
    pub fn new(project: impl Into<String>, locations: Vec<String>) -> Self {
        Self {
            project: project.into(),
            locations,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Supply an OAuth2 access token directly, skipping credential lookup
    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve credentials and build the provider
    pub async fn connect(self) -> ProviderResult<ArtifactRegistryProvider> {
        let token = match self.access_token {
            Some(token) => token,
            None => resolve_access_token().await?,
        };

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(format!("regspectre/{}", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(ArtifactRegistryProvider {
            http,
            base_url: self.base_url,
            token,
            project: self.project,
            locations: self.locations,
        })
    }
}

/// Finds an access token: environment first, then the gcloud CLI.
///
/// Matches the lookup order of Application Default Credentials closely
/// enough that anyone with a working gcloud session can scan without
/// further setup.
async fn resolve_access_token() -> ProviderResult<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim().to_owned();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    debug!("no {TOKEN_ENV} set, asking gcloud for a token");
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| {
            ProviderError::Auth(format!("could not find default credentials: gcloud: {e}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProviderError::Auth(format!(
            "could not find default credentials: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if token.is_empty() {
        return Err(ProviderError::Auth(
            "could not find default credentials".to_owned(),
        ));
    }
    Ok(token)
}

/// Prefixes transport and decode errors with the failing operation.
/// Auth errors pass through untouched; they are global, not per-call.
fn wrap(err: ProviderError, context: &str) -> ProviderError {
    match err {
        ProviderError::Transport(msg) => ProviderError::Transport(format!("{context}: {msg}")),
        ProviderError::Decode(msg) => ProviderError::Decode(format!("{context}: {msg}")),
        other => other,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRepositoriesResponse {
    #[serde(default)]
    repositories: Vec<RepositoryResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryResource {
    name: String,
    #[serde(default)]
    format: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDockerImagesResponse {
    #[serde(default)]
    docker_images: Vec<DockerImageResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerImageResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "size_from_string")]
    image_size_bytes: u64,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    upload_time: Option<DateTime<Utc>>,
}

/// int64 fields arrive as JSON strings per proto3 mapping
fn size_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

fn repository_snapshot(resource: &RepositoryResource, location: &str) -> RepositorySnapshot {
    RepositorySnapshot {
        name: resource.name.clone(),
        id: repository_id(&resource.name),
        region: location.to_owned(),
        format: Some(resource.format.clone()),
    }
}

fn image_snapshot(resource: DockerImageResource) -> ImageSnapshot {
    ImageSnapshot {
        digest: digest_from_name(&resource.name),
        uri: (!resource.uri.is_empty()).then_some(resource.uri),
        tags: resource.tags,
        size_bytes: resource.image_size_bytes,
        pushed_at: resource.upload_time,
        last_pull: None,
        media_type: resource.media_type,
    }
}

/// `projects/p/locations/l/repositories/r` keeps only the trailing `r`
fn repository_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_owned()
}

/// Docker image resource names end in `…/dockerImages/image@sha256:…`
fn digest_from_name(name: &str) -> String {
    name.rsplit_once('@')
        .map_or(name, |(_, digest)| digest)
        .to_owned()
}
