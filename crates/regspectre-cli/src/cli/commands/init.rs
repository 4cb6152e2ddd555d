//! `regspectre init` command.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::args::InitArgs;

const CONFIG_PATH: &str = ".regspectre.yaml";
const POLICY_PATH: &str = "regspectre-policy.json";

pub fn execute(args: &InitArgs) -> Result<()> {
    let mut created = Vec::new();

    if write_if_absent(Path::new(CONFIG_PATH), SAMPLE_CONFIG, args.force)? {
        created.push(CONFIG_PATH);
    }
    if write_if_absent(Path::new(POLICY_PATH), SAMPLE_IAM_POLICY, args.force)? {
        created.push(POLICY_PATH);
    }

    match created.as_slice() {
        [] => return Ok(()),
        [one] => println!("{}", format!("Created {one}").green()),
        _ => println!("{}", format!("Created {CONFIG_PATH} and {POLICY_PATH}").green()),
    }

    println!("\n{}", "Next steps:".bold());
    println!("  1. Edit .regspectre.yaml to set provider (aws or gcp) and regions");
    println!("  2. For AWS: apply regspectre-policy.json to your IAM role/user");
    println!("  3. For GCP: ensure Artifact Registry Reader role on your service account");
    println!("  4. Run: regspectre aws  OR  regspectre gcp --project=PROJECT_ID");

    Ok(())
}

/// Writes `content` to `path` unless it already exists. Returns whether
/// the file was written.
fn write_if_absent(path: &Path, content: &str, force: bool) -> Result<bool> {
    if !force && path.exists() {
        println!(
            "Skipping {} (already exists, use --force to overwrite)",
            path.display()
        );
        return Ok(false);
    }

    std::fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

const SAMPLE_CONFIG: &str = r"# regspectre configuration
# See: https://github.com/regspectre/regspectre

# Cloud provider: aws or gcp
# provider: aws

# AWS profile (or set AWS_PROFILE env var)
# profile: default

# GCP project ID (required for gcp provider)
# project: my-project-id

# Regions to scan (default: from AWS config)
# regions:
#   - us-east-1
#   - us-west-2

# Age threshold for stale images (days since last pull for ECR, since push for GCP)
stale_days: 90

# Maximum acceptable image size (MB). Images above this are flagged.
max_size_mb: 1024

# Minimum monthly cost to report ($)
min_monthly_cost: 0.10

# Output format: text, json, sarif, or spectrehub
format: text

# Scan timeout
timeout: 10m

# Resources to exclude from scanning
# exclude:
#   resource_ids:
#     - myapp/production
#   tags:
#     - 'env=production'
";

const SAMPLE_IAM_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "RegspectreReadOnly",
      "Effect": "Allow",
      "Action": [
        "ecr:DescribeRepositories",
        "ecr:DescribeImages",
        "ecr:ListImages",
        "ecr:BatchGetImage",
        "ecr:GetLifecyclePolicy",
        "ecr:DescribeImageScanFindings",
        "sts:GetCallerIdentity"
      ],
      "Resource": "*"
    }
  ]
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses_as_our_own_format() {
        let cfg: crate::config::FileConfig = serde_yaml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(cfg.stale_days, Some(90));
        assert_eq!(cfg.max_size_mb, Some(1024));
        assert_eq!(cfg.format.as_deref(), Some("text"));
        assert_eq!(cfg.timeout.as_deref(), Some("10m"));
    }

    #[test]
    fn sample_policy_is_valid_json_with_readonly_actions() {
        let policy: serde_json::Value = serde_json::from_str(SAMPLE_IAM_POLICY).unwrap();
        let actions = policy["Statement"][0]["Action"].as_array().unwrap();

        let names: Vec<&str> = actions.iter().filter_map(|a| a.as_str()).collect();
        assert!(names.contains(&"ecr:DescribeRepositories"));
        assert!(names.contains(&"ecr:DescribeImageScanFindings"));
        assert!(
            names.iter().all(|a| !a.contains("Delete") && !a.contains("Put")),
            "policy must stay read-only: {names:?}"
        );
    }
}
