//! Entry point for PR-closed events.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::ReaperError;
use crate::executor::TeardownExecutor;
use crate::model::{ResourceSet, RunSummary};
use crate::resolver::{CleanupRequest, ResourceResolver};

/// Composes resolver and executor for one PR-closed signal.
///
/// The handler holds no mutable state, so it can serve concurrent events
/// for different pull requests and repeated deliveries of the same one.
pub struct EventHandler {
    resolver: Box<dyn ResourceResolver>,
    executor: TeardownExecutor,
}

impl EventHandler {
    pub fn new(resolver: Box<dyn ResourceResolver>, executor: TeardownExecutor) -> Self {
        Self { resolver, executor }
    }

    pub async fn on_pull_request_closed(&self, request: &CleanupRequest) -> RunSummary {
        info!(pr = %request.pr, "Received PR closed event");
        let started = Instant::now();

        let mut summary = match self.resolve(request) {
            Ok(resources) => {
                info!(
                    pr = %request.pr,
                    catalog = ?resources.catalog,
                    warehouse_id = ?resources.warehouse_id,
                    "Resolved resources"
                );
                self.executor.execute(request.pr, &resources).await
            }
            Err(summary) => summary,
        };

        summary.duration_ms = started.elapsed().as_millis() as u64;
        summary
    }

    /// Resolve and report what would be deleted, without deleting anything.
    pub fn preview(&self, request: &CleanupRequest) -> RunSummary {
        match self.resolve(request) {
            Ok(resources) => self.executor.plan(request.pr, &resources),
            Err(summary) => summary,
        }
    }

    fn resolve(&self, request: &CleanupRequest) -> Result<ResourceSet, RunSummary> {
        match self.resolver.resolve(request) {
            Ok(resources) => Ok(resources),
            Err(ReaperError::StateUnreadable { path, reason }) => {
                warn!(
                    pr = %request.pr,
                    path = %path.display(),
                    reason = %reason,
                    "State snapshot unreadable, no resources found"
                );
                Err(RunSummary::state_unreadable(
                    request.pr,
                    format!("{}: {reason}", path.display()),
                ))
            }
            Err(ReaperError::NotFound { .. }) => {
                info!(pr = %request.pr, "No resources found, nothing to clean");
                Err(RunSummary::nothing_to_clean(request.pr))
            }
            Err(e) => {
                warn!(pr = %request.pr, error = %e, "Resolution failed, nothing to clean");
                Err(RunSummary::nothing_to_clean(request.pr))
            }
        }
    }
}
