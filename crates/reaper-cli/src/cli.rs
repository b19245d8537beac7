use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "sandbox-reaper")]
#[command(about = "Tear down the Databricks sandbox of a closed pull request")]
#[command(version)]
pub struct Cli {
    /// Pull request number (e.g. 123 or #123)
    #[arg(long, env = "PR_NUMBER")]
    pub pr: Option<String>,

    /// GitHub pull_request event payload, used when --pr is not given
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    /// Catalog name to delete (skips the state snapshot)
    #[arg(long, env = "CATALOG_NAME")]
    pub catalog: Option<String>,

    /// SQL warehouse ID to delete (skips the state snapshot)
    #[arg(long, env = "WAREHOUSE_ID")]
    pub warehouse_id: Option<String>,

    /// Terraform state file to scan when no explicit identifiers are given
    #[arg(long, env = "TERRAFORM_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Databricks workspace host (overrides config)
    #[arg(long, env = "DATABRICKS_HOST")]
    pub host: Option<String>,

    /// Databricks personal access token (overrides config)
    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Config file path (defaults to ./sandbox-reaper.toml when present)
    #[arg(short, long, env = "REAPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Resolve and report, but do not delete anything
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 3 when any resource failed to delete
    #[arg(long)]
    pub strict: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
