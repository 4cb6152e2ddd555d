//! Command-line argument definitions using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// Container registry waste auditor
///
/// regspectre finds stale, untagged, and bloated container images in AWS ECR
/// and GCP Artifact Registry that accumulate storage costs silently.
///
/// Each finding includes an estimated monthly waste in USD. The tool is
/// strictly read-only and never deletes anything.
#[derive(Parser, Debug)]
#[command(name = "regspectre")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit AWS ECR repositories for waste
    ///
    /// Scan all ECR repositories in an AWS account for stale, untagged, and
    /// oversized container images. Each finding includes an estimated monthly
    /// storage waste in USD.
    Aws(AwsArgs),

    /// Audit GCP Artifact Registry repositories for waste
    ///
    /// Scan all Artifact Registry Docker repositories in a GCP project for
    /// stale, untagged, and oversized container images.
    ///
    /// Note: GCP Artifact Registry does not provide pull timestamps, so stale
    /// detection is based on upload time only. Lifecycle policies and
    /// vulnerability scans are ECR-only features and are not checked for GCP.
    Gcp(GcpArgs),

    /// Generate sample config and IAM policy
    ///
    /// Creates a sample .regspectre.yaml config file and an IAM policy file
    /// granting the read-only access the scans need.
    Init(InitArgs),

    /// Show version and build information
    Version,
}

// ============================================================================
// aws command
// ============================================================================

#[derive(Args, Debug)]
pub struct AwsArgs {
    /// AWS regions to scan, comma-separated (default: from AWS config)
    #[arg(long = "region", value_name = "REGION", value_delimiter = ',')]
    pub regions: Vec<String>,

    /// AWS profile name
    #[arg(long)]
    pub profile: Option<String>,

    /// Image age threshold in days since last pull
    #[arg(long)]
    pub stale_days: Option<u32>,

    /// Flag images larger than this (MB)
    #[arg(long = "max-size", value_name = "MB")]
    pub max_size_mb: Option<u64>,

    /// Output format: text, json, sarif, spectrehub
    #[arg(long)]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Minimum monthly cost to report ($)
    #[arg(long)]
    pub min_monthly_cost: Option<f64>,

    /// Include vulnerability scan data if available
    #[arg(long)]
    pub include_scan: bool,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,

    /// Scan timeout (e.g. 90s, 10m, 1h)
    #[arg(long, value_parser = crate::config::parse_duration)]
    pub timeout: Option<Duration>,

    /// Exclude resources by tag (Key=Value, comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude_tags: Vec<String>,
}

// ============================================================================
// gcp command
// ============================================================================

#[derive(Args, Debug)]
pub struct GcpArgs {
    /// GCP project ID (required)
    #[arg(long)]
    pub project: Option<String>,

    /// Comma-separated location filter (e.g., us-central1,europe-west1)
    #[arg(long, value_delimiter = ',')]
    pub locations: Vec<String>,

    /// Image age threshold in days since upload
    #[arg(long)]
    pub stale_days: Option<u32>,

    /// Flag images larger than this (MB)
    #[arg(long = "max-size", value_name = "MB")]
    pub max_size_mb: Option<u64>,

    /// Output format: text, json, sarif, spectrehub
    #[arg(long)]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Minimum monthly cost to report ($)
    #[arg(long)]
    pub min_monthly_cost: Option<f64>,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,

    /// Scan timeout (e.g. 90s, 10m, 1h)
    #[arg(long, value_parser = crate::config::parse_duration)]
    pub timeout: Option<Duration>,

    /// Exclude resources by label (Key=Value, comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude_tags: Vec<String>,
}

// ============================================================================
// init command
// ============================================================================

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn region_flag_splits_on_commas() {
        let cli = Cli::parse_from(["regspectre", "aws", "--region", "us-east-1,eu-west-1"]);
        let Commands::Aws(args) = cli.command else {
            panic!("expected aws command");
        };
        assert_eq!(args.regions, vec!["us-east-1", "eu-west-1"]);
    }

    #[test]
    fn timeout_flag_parses_durations() {
        let cli = Cli::parse_from(["regspectre", "gcp", "--timeout", "5m"]);
        let Commands::Gcp(args) = cli.command else {
            panic!("expected gcp command");
        };
        assert_eq!(args.timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["regspectre", "aws", "--verbose"]);
        assert!(cli.verbose);
    }
}
