use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;

fn cmd() -> Command {
    Command::cargo_bin("regspectre").unwrap()
}

/// Strips ambient cloud configuration so command behavior depends only
/// on the flags and files each test sets up.
fn isolated(dir: &Path) -> Command {
    let mut c = cmd();
    c.current_dir(dir)
        .env("HOME", dir)
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .env_remove("AWS_REGION")
        .env_remove("AWS_DEFAULT_REGION")
        .env_remove("AWS_PROFILE")
        .env_remove("AWS_CONFIG_FILE")
        .env_remove("AWS_SHARED_CREDENTIALS_FILE")
        .env_remove("GOOGLE_OAUTH_ACCESS_TOKEN");
    c
}

#[test]
fn no_args_shows_usage() {
    cmd().assert().failure().stderr(contains("Usage"));
}

#[test]
fn help_lists_the_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("aws"))
        .stdout(contains("gcp"))
        .stdout(contains("init"));
}

#[test]
fn version_subcommand_prints_the_version() {
    cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(contains(format!("regspectre {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn init_creates_config_and_policy() {
    let dir = tempfile::tempdir().unwrap();

    isolated(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Created .regspectre.yaml and regspectre-policy.json"))
        .stdout(contains("Next steps:"));

    let config = std::fs::read_to_string(dir.path().join(".regspectre.yaml")).unwrap();
    assert!(config.contains("stale_days: 90"));

    let policy = std::fs::read_to_string(dir.path().join("regspectre-policy.json")).unwrap();
    assert!(policy.contains("ecr:DescribeRepositories"));
}

#[test]
fn init_refuses_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".regspectre.yaml"), "existing").unwrap();

    isolated(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Skipping .regspectre.yaml (already exists, use --force to overwrite)"));

    let config = std::fs::read_to_string(dir.path().join(".regspectre.yaml")).unwrap();
    assert_eq!(config, "existing");
}

#[test]
fn init_force_overwrites_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".regspectre.yaml"), "old").unwrap();

    isolated(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();

    let config = std::fs::read_to_string(dir.path().join(".regspectre.yaml")).unwrap();
    assert_ne!(config, "old");
    assert!(config.contains("# regspectre configuration"));
}

#[test]
fn gcp_requires_a_project() {
    let dir = tempfile::tempdir().unwrap();

    isolated(dir.path())
        .arg("gcp")
        .assert()
        .failure()
        .stderr(contains("--project is required for GCP scans"));
}

#[test]
fn gcp_requires_locations() {
    let dir = tempfile::tempdir().unwrap();

    isolated(dir.path())
        .args(["gcp", "--project", "acme"])
        .assert()
        .failure()
        .stderr(contains("--locations is required (e.g., us-central1,europe-west1)"));
}

#[test]
fn gcp_project_can_come_from_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".regspectre.yaml"), "project: acme\n").unwrap();

    // Passes the project check and stops at the next missing input.
    isolated(dir.path())
        .arg("gcp")
        .assert()
        .failure()
        .stderr(contains("--locations is required"));
}

#[test]
fn aws_without_a_region_fails_with_guidance() {
    let dir = tempfile::tempdir().unwrap();

    isolated(dir.path())
        .arg("aws")
        .assert()
        .failure()
        .stderr(contains("no AWS region configured; use --region or set AWS_REGION"));
}

#[test]
fn unknown_format_is_rejected_before_scanning() {
    let dir = tempfile::tempdir().unwrap();

    isolated(dir.path())
        .args(["aws", "--format", "xml"])
        .assert()
        .failure()
        .stderr(contains("unsupported format: xml (use text, json, sarif, or spectrehub)"));
}

#[test]
fn malformed_timeout_is_rejected_by_the_parser() {
    let dir = tempfile::tempdir().unwrap();

    isolated(dir.path())
        .args(["aws", "--timeout", "10x"])
        .assert()
        .failure()
        .stderr(contains("invalid duration"));
}

#[test]
fn format_from_the_config_file_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".regspectre.yaml"), "format: bogus\n").unwrap();

    isolated(dir.path())
        .arg("aws")
        .assert()
        .failure()
        .stderr(contains("unsupported format: bogus"));
}
