//! Turns the invocation surface into a [`CleanupRequest`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reaper_core::{CleanupRequest, PullRequestId, ReaperError};
use serde::Deserialize;

use crate::cli::Cli;

/// Subset of a GitHub `pull_request` webhook payload.
#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    action: Option<String>,
    number: Option<u64>,
    pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: Option<u64>,
}

/// What the trigger asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Cleanup(CleanupRequest),
    /// The event is not a PR close; nothing should happen.
    Ignored {
        action: String,
        pr: Option<PullRequestId>,
    },
}

pub fn trigger_from_cli(cli: &Cli) -> Result<Trigger> {
    let pr = match (&cli.pr, &cli.event_path) {
        (Some(raw), _) => raw.parse::<PullRequestId>()?,
        (None, Some(path)) => match read_event(path)? {
            Trigger::Cleanup(request) => request.pr,
            ignored => return Ok(ignored),
        },
        (None, None) => {
            return Err(ReaperError::input(
                "pull request number is required: pass --pr, set PR_NUMBER, or provide --event-path",
            )
            .into());
        }
    };

    Ok(Trigger::Cleanup(CleanupRequest::explicit(
        pr,
        cli.catalog.clone(),
        cli.warehouse_id.clone(),
    )))
}

pub fn read_event(path: &Path) -> Result<Trigger> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload: {}", path.display()))?;
    parse_event(&raw).with_context(|| format!("Invalid event payload: {}", path.display()))
}

pub fn parse_event(raw: &str) -> Result<Trigger> {
    let event: PullRequestEvent = serde_json::from_str(raw).context("Invalid JSON")?;
    let number = event
        .number
        .or_else(|| event.pull_request.as_ref().and_then(|p| p.number));
    let pr = number.map(PullRequestId::new).transpose()?;

    match (event.action.as_deref(), pr) {
        (Some("closed"), Some(pr)) => Ok(Trigger::Cleanup(CleanupRequest::new(pr))),
        (Some("closed"), None) => {
            Err(ReaperError::input("closed event does not carry a pull request number").into())
        }
        (action, pr) => Ok(Trigger::Ignored {
            action: action.unwrap_or("unknown").to_string(),
            pr,
        }),
    }
}
