use std::sync::Arc;

use anyhow::{Context, Result};
use reaper_core::build_handler;
use reaper_databricks::DatabricksClient;
use tracing::info;

use crate::cli::Cli;
use crate::config::loader::load_config;
use crate::event::{Trigger, trigger_from_cli};
use crate::observability;
use crate::output::{print_notice, print_summary};

/// The controller ran, whatever the individual resource outcomes.
pub const EXIT_OK: i32 = 0;
/// Input or configuration could not be resolved.
pub const EXIT_HARD_FAILURE: i32 = 1;
/// `--strict` and at least one resource failed.
pub const EXIT_RESOURCE_FAILURE: i32 = 3;

pub async fn run(cli: Cli) -> Result<i32> {
    let mut cfg = load_config(cli.config.as_deref()).map_err(anyhow::Error::msg)?;
    cfg.apply_cli(&cli);
    observability::init_tracing_with_level(&cfg.logging.level);

    let request = match trigger_from_cli(&cli)? {
        Trigger::Cleanup(request) => request,
        Trigger::Ignored { action, pr } => {
            let pr = pr.map(|p| format!(" for PR #{p}")).unwrap_or_default();
            print_notice(&format!(
                "Ignoring pull request event with action \"{action}\"{pr}"
            ));
            return Ok(EXIT_OK);
        }
    };

    let controller = cfg.controller_config()?;
    info!(
        pr = %request.pr,
        host = %controller.host,
        state_path = ?controller.state_path,
        dry_run = cli.dry_run,
        "Starting cleanup"
    );

    let client = DatabricksClient::new(&controller).context("Failed to create Databricks client")?;
    let handler = build_handler(&controller, Arc::new(client))?;

    let summary = if cli.dry_run {
        handler.preview(&request)
    } else {
        handler.on_pull_request_closed(&request).await
    };

    print_summary(&summary, cli.format)?;

    if cli.strict && summary.has_failures() {
        return Ok(EXIT_RESOURCE_FAILURE);
    }
    Ok(EXIT_OK)
}
