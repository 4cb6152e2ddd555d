use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use regspectre_core::{
    classify, Finding, FindingKind, RepositorySnapshot, ScanConfig, ScanProgress, ScanResult,
};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::RegistryProvider;

/// Synchronous, fire-and-forget progress callback.
///
/// Invoked on the scanning task; absence is a no-op, never an error.
pub type ProgressCallback<'a> = &'a (dyn Fn(ScanProgress) + Send + Sync);

/// Marker returned when the scan deadline expires mid-walk
struct DeadlineExpired;

/// Generic scan driver over one [`RegistryProvider`].
///
/// Walks every scope the provider exposes, classifies each image, and
/// accumulates findings and errors. The reference time for staleness is
/// pinned at construction and injectable for tests; an optional deadline
/// bounds the whole walk, with expiry yielding the partial result rather
/// than a failure.
pub struct Scanner<P> {
    provider: P,
    now: DateTime<Utc>,
    deadline: Option<Instant>,
}

impl<P: RegistryProvider> Scanner<P> {
    /// Creates a scanner with the current time as staleness reference
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            now: Utc::now(),
            deadline: None,
        }
    }

    /// Pins the reference time used for staleness decisions
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Bounds the whole scan. On expiry the scan stops, one deadline
    /// error is recorded, and everything gathered so far is returned
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs the full scan across all scopes.
    ///
    /// Failures to list repositories abort the affected scope only;
    /// failures inside one repository abort that repository only. Both
    /// are recorded as error strings on the result.
    pub async fn scan(
        &self,
        cfg: &ScanConfig,
        progress: Option<ProgressCallback<'_>>,
    ) -> ScanResult {
        let mut result = ScanResult::default();
        let kind = self.provider.provider();

        'scopes: for scope in self.provider.scopes() {
            if kind.announces_locations() {
                self.report(progress, scope, format!("Scanning location {scope}"));
            }

            let repos = match self.bounded(self.provider.list_repositories(scope)).await {
                Ok(repos) => repos,
                Err(ProviderError::DeadlineExceeded) => {
                    result.push_error(ProviderError::DeadlineExceeded.to_string());
                    break 'scopes;
                }
                Err(err) => {
                    result.push_error(format!("{scope}: {err}"));
                    continue;
                }
            };

            debug!(scope = %scope, count = repos.len(), "listed repositories");
            result.repositories_scanned += repos.len();
            self.report(progress, scope, kind.found_repositories_message(repos.len()));

            for repo in &repos {
                if cfg.exclude.contains_resource(&repo.id) {
                    continue;
                }
                if let Err(DeadlineExpired) =
                    self.scan_repository(cfg, repo, &mut result, progress).await
                {
                    result.push_error(ProviderError::DeadlineExceeded.to_string());
                    break 'scopes;
                }
            }
        }

        result
    }

    /// Separate, explicitly-invoked vulnerability check for one image.
    ///
    /// Not part of [`scan`](Self::scan): registry scan lookups are
    /// expensive and rate-limited, so callers opt in per image. Missing
    /// scan data is not an error and yields no findings.
    pub async fn check_image_vulnerabilities(
        &self,
        repo: &RepositorySnapshot,
        digest: &str,
    ) -> ProviderResult<Vec<Finding>> {
        if !self.provider.capabilities().vulnerability_scan {
            return Err(ProviderError::Unsupported);
        }

        let counts = match self
            .bounded(self.provider.vulnerability_counts(repo, digest))
            .await
        {
            Ok(Some(counts)) => counts,
            Ok(None) => return Ok(Vec::new()),
            Err(err @ ProviderError::DeadlineExceeded) => return Err(err),
            Err(err) => {
                debug!(repo = %repo.id, error = %err, "no scan findings available");
                return Ok(Vec::new());
            }
        };

        Ok(classify::vulnerability_finding(repo, digest, &counts)
            .into_iter()
            .collect())
    }

    async fn scan_repository(
        &self,
        cfg: &ScanConfig,
        repo: &RepositorySnapshot,
        result: &mut ScanResult,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<(), DeadlineExpired> {
        let kind = self.provider.provider();
        self.report(progress, &repo.region, format!("Scanning {}", repo.id));

        let images = match self.bounded(self.provider.list_images(repo)).await {
            Ok(images) => images,
            Err(ProviderError::DeadlineExceeded) => return Err(DeadlineExpired),
            Err(err) => {
                result.push_error(format!("{}/{}: {err}", repo.region, repo.id));
                return Ok(());
            }
        };

        if images.is_empty() {
            result
                .findings
                .push(classify::empty_repository_finding(kind, repo));
            return Ok(());
        }

        if self.provider.capabilities().lifecycle_policy {
            match self.bounded(self.provider.has_lifecycle_policy(repo)).await {
                Ok(true) => {}
                Ok(false) => result
                    .findings
                    .push(classify::missing_lifecycle_policy_finding(repo)),
                Err(ProviderError::DeadlineExceeded) => return Err(DeadlineExpired),
                // A failed lookup is not the same as "no policy".
                Err(err) => {
                    result.push_error(format!("{}/{} lifecycle: {err}", repo.region, repo.id));
                }
            }
        }

        let mut stale_count = 0;
        for image in &images {
            result.resources_scanned += 1;
            let findings = classify::classify_image(kind, repo, image, cfg, self.now);
            if findings.iter().any(|f| f.id == FindingKind::StaleImage) {
                stale_count += 1;
            }
            result.findings.extend(findings);
        }

        // Second pass: a repository where everything is stale is itself
        // a deletion candidate.
        if stale_count == images.len() {
            result
                .findings
                .push(classify::stale_repository_finding(kind, repo, &images));
        }

        Ok(())
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = ProviderResult<T>>,
    ) -> ProviderResult<T> {
        match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(ProviderError::DeadlineExceeded);
                }
                match tokio::time::timeout(remaining, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::DeadlineExceeded),
                }
            }
            None => fut.await,
        }
    }

    fn report(&self, progress: Option<ProgressCallback<'_>>, region: &str, message: String) {
        if let Some(callback) = progress {
            callback(ScanProgress {
                region: region.to_owned(),
                scanner: self.provider.provider().scanner_label().to_owned(),
                message,
                timestamp: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use regspectre_core::{ImageSnapshot, Provider, ResourceType, Severity, SeverityCounts};

    use crate::provider::Capabilities;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    fn repo_snapshot(id: &str, region: &str) -> RepositorySnapshot {
        RepositorySnapshot {
            name: id.to_owned(),
            id: id.to_owned(),
            region: region.to_owned(),
            format: None,
        }
    }

    fn image(digest: &str, tags: &[&str], pulled_days_ago: Option<i64>) -> ImageSnapshot {
        ImageSnapshot {
            digest: digest.to_owned(),
            uri: None,
            tags: tags.iter().map(ToString::to_string).collect(),
            size_bytes: 1024 * 1024 * 1024,
            pushed_at: Some(fixed_now() - Duration::days(400)),
            last_pull: pulled_days_ago.map(|d| fixed_now() - Duration::days(d)),
            media_type: None,
        }
    }

    struct MockProvider {
        kind: Provider,
        scopes: Vec<String>,
        caps: Capabilities,
        repos: HashMap<String, Result<Vec<RepositorySnapshot>, String>>,
        images: HashMap<String, Result<Vec<ImageSnapshot>, String>>,
        policies: HashMap<String, Result<bool, String>>,
        vulns: HashMap<String, Option<SeverityCounts>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn ecr() -> Self {
            Self {
                kind: Provider::Ecr,
                scopes: vec!["us-east-1".to_owned()],
                caps: Capabilities {
                    lifecycle_policy: true,
                    vulnerability_scan: true,
                },
                repos: HashMap::new(),
                images: HashMap::new(),
                policies: HashMap::new(),
                vulns: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn artifact_registry(locations: &[&str]) -> Self {
            Self {
                kind: Provider::ArtifactRegistry,
                scopes: locations.iter().map(ToString::to_string).collect(),
                caps: Capabilities::default(),
                ..Self::ecr()
            }
        }

        fn with_repo(mut self, scope: &str, repo: RepositorySnapshot) -> Self {
            self.repos
                .entry(scope.to_owned())
                .or_insert_with(|| Ok(Vec::new()))
                .as_mut()
                .unwrap()
                .push(repo);
            self
        }

        fn with_images(mut self, repo_id: &str, images: Vec<ImageSnapshot>) -> Self {
            self.images.insert(repo_id.to_owned(), Ok(images));
            self
        }

        fn with_policy(mut self, repo_id: &str, present: bool) -> Self {
            self.policies.insert(repo_id.to_owned(), Ok(present));
            self
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    #[async_trait]
    impl RegistryProvider for MockProvider {
        fn provider(&self) -> Provider {
            self.kind
        }

        fn scopes(&self) -> &[String] {
            &self.scopes
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        async fn list_repositories(
            &self,
            scope: &str,
        ) -> ProviderResult<Vec<RepositorySnapshot>> {
            self.record(format!("list_repositories:{scope}"));
            match self.repos.get(scope) {
                Some(Ok(repos)) => Ok(repos.clone()),
                Some(Err(msg)) => Err(ProviderError::Transport(msg.clone())),
                None => Ok(Vec::new()),
            }
        }

        async fn list_images(
            &self,
            repo: &RepositorySnapshot,
        ) -> ProviderResult<Vec<ImageSnapshot>> {
            self.record(format!("list_images:{}", repo.id));
            match self.images.get(&repo.id) {
                Some(Ok(images)) => Ok(images.clone()),
                Some(Err(msg)) => Err(ProviderError::Transport(msg.clone())),
                None => Ok(Vec::new()),
            }
        }

        async fn has_lifecycle_policy(&self, repo: &RepositorySnapshot) -> ProviderResult<bool> {
            self.record(format!("lifecycle:{}", repo.id));
            match self.policies.get(&repo.id) {
                Some(Ok(present)) => Ok(*present),
                Some(Err(msg)) => Err(ProviderError::Transport(msg.clone())),
                None => Ok(true),
            }
        }

        async fn vulnerability_counts(
            &self,
            repo: &RepositorySnapshot,
            digest: &str,
        ) -> ProviderResult<Option<SeverityCounts>> {
            self.record(format!("vulns:{}:{digest}", repo.id));
            Ok(self.vulns.get(digest).cloned().flatten())
        }
    }

    fn scan_config() -> ScanConfig {
        ScanConfig {
            stale_days: 90,
            max_size_bytes: 10 * 1024 * 1024 * 1024,
            min_monthly_cost: 0.10,
            ..ScanConfig::default()
        }
    }

    fn kinds(result: &ScanResult) -> Vec<FindingKind> {
        result.findings.iter().map(|f| f.id).collect()
    }

    #[tokio::test]
    async fn empty_repository_yields_one_unused_repo_finding() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("empty", "us-east-1"))
            .with_images("empty", vec![]);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert_eq!(kinds(&result), vec![FindingKind::UnusedRepo]);
        assert_eq!(result.findings[0].resource_type, ResourceType::Repository);
        assert_eq!(result.findings[0].estimated_monthly_waste, 0.0);
        assert_eq!(result.resources_scanned, 0);
        assert_eq!(result.repositories_scanned, 1);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn all_stale_images_aggregate_into_unused_repo() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("old", "us-east-1"))
            .with_images(
                "old",
                vec![
                    image("sha256:aaa", &["v1"], Some(120)),
                    image("sha256:bbb", &["v2"], Some(200)),
                ],
            )
            .with_policy("old", true);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert_eq!(
            kinds(&result),
            vec![
                FindingKind::StaleImage,
                FindingKind::StaleImage,
                FindingKind::UnusedRepo,
            ]
        );
        let repo_finding = &result.findings[2];
        assert_eq!(repo_finding.metadata["image_count"], json!(2));
        // Two 1 GiB images at $0.10/GB-month.
        assert!((repo_finding.estimated_monthly_waste - 0.20).abs() < 1e-9);
        assert_eq!(result.resources_scanned, 2);
    }

    #[tokio::test]
    async fn partially_stale_repository_does_not_aggregate() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("mixed", "us-east-1"))
            .with_images(
                "mixed",
                vec![
                    image("sha256:aaa", &["v1"], Some(120)),
                    image("sha256:bbb", &["v2"], Some(5)),
                ],
            )
            .with_policy("mixed", true);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert_eq!(kinds(&result), vec![FindingKind::StaleImage]);
    }

    #[tokio::test]
    async fn excluded_repositories_are_skipped_but_counted() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("keep", "us-east-1"))
            .with_repo("us-east-1", repo_snapshot("skip", "us-east-1"))
            .with_images("keep", vec![image("sha256:aaa", &[], Some(5))])
            .with_images("skip", vec![image("sha256:bbb", &[], Some(5))])
            .with_policy("keep", true)
            .with_policy("skip", true);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let mut cfg = scan_config();
        cfg.exclude.resource_ids.insert("skip".to_owned());

        let result = scanner.scan(&cfg, None).await;

        assert_eq!(kinds(&result), vec![FindingKind::UntaggedImage]);
        assert_eq!(result.findings[0].resource_id, "keep@sha256:aaa");
        assert_eq!(result.repositories_scanned, 2);
        assert_eq!(result.resources_scanned, 1);
    }

    #[tokio::test]
    async fn repository_listing_failure_aborts_the_scope() {
        let mut provider = MockProvider::ecr();
        provider.repos.insert(
            "us-east-1".to_owned(),
            Err("describe repositories: connection refused".to_owned()),
        );
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert!(result.findings.is_empty());
        assert_eq!(
            result.errors,
            vec!["us-east-1: describe repositories: connection refused"]
        );
        assert_eq!(result.repositories_scanned, 0);
    }

    #[tokio::test]
    async fn image_listing_failure_is_scoped_to_one_repository() {
        let mut provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("broken", "us-east-1"))
            .with_repo("us-east-1", repo_snapshot("fine", "us-east-1"))
            .with_images("fine", vec![image("sha256:aaa", &[], Some(5))])
            .with_policy("fine", true);
        provider
            .images
            .insert("broken".to_owned(), Err("describe images: throttled".to_owned()));
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert_eq!(kinds(&result), vec![FindingKind::UntaggedImage]);
        assert_eq!(
            result.errors,
            vec!["us-east-1/broken: describe images: throttled"]
        );
    }

    #[tokio::test]
    async fn missing_lifecycle_policy_emits_a_finding() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("nopolicy", "us-east-1"))
            .with_images("nopolicy", vec![image("sha256:aaa", &["v1"], Some(5))])
            .with_policy("nopolicy", false);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert_eq!(kinds(&result), vec![FindingKind::NoLifecyclePolicy]);
        assert_eq!(result.findings[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn lifecycle_lookup_failure_is_an_error_not_a_finding() {
        let mut provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("flaky", "us-east-1"))
            .with_images("flaky", vec![image("sha256:aaa", &["v1"], Some(5))]);
        provider
            .policies
            .insert("flaky".to_owned(), Err("get lifecycle policy: denied".to_owned()));
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert!(kinds(&result).is_empty());
        assert_eq!(
            result.errors,
            vec!["us-east-1/flaky lifecycle: get lifecycle policy: denied"]
        );
    }

    #[tokio::test]
    async fn providers_without_the_capability_never_get_policy_findings() {
        let provider = MockProvider::artifact_registry(&["us"])
            .with_repo("us", repo_snapshot("app", "us"))
            .with_images("app", vec![image("sha256:aaa", &["v1"], None)]);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert!(!kinds(&result).contains(&FindingKind::NoLifecyclePolicy));
        assert!(result.errors.is_empty());
        // The lifecycle hook must not have been invoked at all.
        assert!(scanner
            .provider
            .calls
            .lock()
            .unwrap()
            .iter()
            .all(|c| !c.starts_with("lifecycle:")));
    }

    #[tokio::test]
    async fn artifact_registry_scan_walks_all_locations() {
        let mut provider = MockProvider::artifact_registry(&["us", "europe"])
            .with_repo("us", repo_snapshot("app", "us"))
            .with_images("app", vec![image("sha256:aaa", &[], None)]);
        provider
            .repos
            .insert("europe".to_owned(), Err("list repositories: unreachable".to_owned()));
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let result = scanner.scan(&scan_config(), None).await;

        assert_eq!(kinds(&result), vec![FindingKind::UntaggedImage]);
        assert_eq!(result.errors, vec!["europe: list repositories: unreachable"]);
        assert_eq!(result.repositories_scanned, 1);
    }

    #[tokio::test]
    async fn progress_events_carry_scanner_label_and_messages() {
        let provider = MockProvider::artifact_registry(&["us"])
            .with_repo("us", repo_snapshot("app", "us"))
            .with_images("app", vec![image("sha256:aaa", &["v1"], None)]);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let events: Mutex<Vec<ScanProgress>> = Mutex::new(Vec::new());
        let callback = |p: ScanProgress| events.lock().unwrap().push(p);

        let _ = scanner.scan(&scan_config(), Some(&callback)).await;

        let events = events.into_inner().unwrap();
        let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Scanning location us",
                "Found 1 Docker repositories",
                "Scanning app",
            ]
        );
        assert!(events.iter().all(|e| e.scanner == "artifactregistry"));
    }

    #[tokio::test]
    async fn ecr_progress_skips_location_announcements() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("app", "us-east-1"))
            .with_images("app", vec![image("sha256:aaa", &["v1"], Some(5))])
            .with_policy("app", true);
        let scanner = Scanner::new(provider).with_now(fixed_now());

        let events: Mutex<Vec<ScanProgress>> = Mutex::new(Vec::new());
        let callback = |p: ScanProgress| events.lock().unwrap().push(p);

        let _ = scanner.scan(&scan_config(), Some(&callback)).await;

        let events = events.into_inner().unwrap();
        let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Found 1 repositories", "Scanning app"]);
        assert!(events.iter().all(|e| e.scanner == "ecr"));
    }

    #[tokio::test]
    async fn expired_deadline_returns_partial_result_with_one_error() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("app", "us-east-1"))
            .with_images("app", vec![image("sha256:aaa", &[], Some(5))]);
        let scanner = Scanner::new(provider)
            .with_now(fixed_now())
            .with_deadline(Instant::now());

        let result = scanner.scan(&scan_config(), None).await;

        assert!(result.findings.is_empty());
        assert_eq!(result.errors, vec!["scan deadline exceeded"]);
    }

    #[tokio::test]
    async fn generous_deadline_does_not_disturb_the_scan() {
        let provider = MockProvider::ecr()
            .with_repo("us-east-1", repo_snapshot("app", "us-east-1"))
            .with_images("app", vec![image("sha256:aaa", &[], Some(5))])
            .with_policy("app", true);
        let scanner = Scanner::new(provider)
            .with_now(fixed_now())
            .with_deadline(Instant::now() + StdDuration::from_secs(600));

        let result = scanner.scan(&scan_config(), None).await;

        assert_eq!(kinds(&result), vec![FindingKind::UntaggedImage]);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn vulnerability_check_reports_blocking_cves() {
        let mut provider = MockProvider::ecr();
        provider.vulns.insert(
            "sha256:aaa".to_owned(),
            Some(SeverityCounts {
                total: 5,
                critical: 1,
                high: 2,
                by_severity: [("CRITICAL".to_owned(), 1), ("HIGH".to_owned(), 2)]
                    .into_iter()
                    .collect(),
            }),
        );
        let scanner = Scanner::new(provider).with_now(fixed_now());
        let repo = repo_snapshot("app", "us-east-1");

        let findings = scanner
            .check_image_vulnerabilities(&repo, "sha256:aaa")
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].id, FindingKind::VulnerableImage);
        assert_eq!(findings[0].message, "5 vulnerabilities (1 critical, 2 high)");
    }

    #[tokio::test]
    async fn vulnerability_check_without_scan_data_is_empty() {
        let provider = MockProvider::ecr();
        let scanner = Scanner::new(provider).with_now(fixed_now());
        let repo = repo_snapshot("app", "us-east-1");

        let findings = scanner
            .check_image_vulnerabilities(&repo, "sha256:unscanned")
            .await
            .unwrap();

        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn vulnerability_check_requires_the_capability() {
        let provider = MockProvider::artifact_registry(&["us"]);
        let scanner = Scanner::new(provider).with_now(fixed_now());
        let repo = repo_snapshot("app", "us");

        let err = scanner
            .check_image_vulnerabilities(&repo, "sha256:aaa")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Unsupported));
    }
}
