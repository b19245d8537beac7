//! Teardown executor: one attempt per resource, catalog before warehouse.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::api::{self, ApiResponse, ManagementApi};
use crate::error::ReaperError;
use crate::model::{
    CleanupOutcome, FailureReason, PullRequestId, ResourceDescriptor, ResourceKind,
    ResourceReport, ResourceSet, RunDisposition, RunSummary,
};
use crate::policy::ProtectionPolicy;

/// Issues the destructive calls for a resolved [`ResourceSet`].
///
/// Calls are made sequentially in [`ResourceKind::TEARDOWN_ORDER`]. A
/// failure on one kind never prevents the next kind from being attempted,
/// and nothing is retried: re-running the whole controller is the retry.
pub struct TeardownExecutor {
    api: Arc<dyn ManagementApi>,
    policy: ProtectionPolicy,
}

impl TeardownExecutor {
    pub fn new(api: Arc<dyn ManagementApi>, policy: ProtectionPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &ProtectionPolicy {
        &self.policy
    }

    pub async fn execute(&self, pr: PullRequestId, resources: &ResourceSet) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new(pr, RunDisposition::Executed);

        for kind in ResourceKind::TEARDOWN_ORDER {
            let report = self.teardown(pr, kind, resources.descriptor(kind)).await;
            summary.push(report);
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            pr = %pr,
            run_id = %summary.run_id,
            deleted = summary.deleted_count(),
            failed = summary.failed_count(),
            duration_ms = summary.duration_ms,
            "Teardown finished"
        );
        summary
    }

    /// Describe what [`execute`](Self::execute) would do without calling out.
    pub fn plan(&self, pr: PullRequestId, resources: &ResourceSet) -> RunSummary {
        let mut summary = RunSummary::new(pr, RunDisposition::DryRun);

        for kind in ResourceKind::TEARDOWN_ORDER {
            let report = match resources.descriptor(kind) {
                None => absent(kind),
                Some(descriptor) if self.policy.vetoes(&descriptor) => protected(&descriptor),
                Some(descriptor) => {
                    info!(pr = %pr, resource = %descriptor.description(), "[DRY RUN] Would delete");
                    ResourceReport {
                        kind,
                        identifier: Some(descriptor.identifier().to_string()),
                        outcome: None,
                        detail: format!("would delete {}", descriptor.description()),
                    }
                }
            };
            summary.push(report);
        }

        summary
    }

    async fn teardown(
        &self,
        pr: PullRequestId,
        kind: ResourceKind,
        descriptor: Option<ResourceDescriptor>,
    ) -> ResourceReport {
        let Some(descriptor) = descriptor else {
            info!(pr = %pr, kind = %kind, "No resource to delete");
            return absent(kind);
        };

        // Checked before the call is built, never after.
        if let Err(veto) = self.policy.check(&descriptor) {
            info!(pr = %pr, resource = %descriptor.description(), reason = %veto, "Skipping delete");
            return protected(&descriptor);
        }

        let description = descriptor.description();
        let target = api::bind(descriptor, self.api.clone());
        let identifier = target.identifier().to_string();
        let outcome = classify(target.delete().await);

        match &outcome {
            CleanupOutcome::Failed(reason) => {
                warn!(pr = %pr, resource = %description, reason = %reason, "Delete failed");
            }
            CleanupOutcome::NotFound => {
                info!(pr = %pr, resource = %description, "Already gone");
            }
            _ => info!(pr = %pr, resource = %description, "Deleted"),
        }

        let detail = match &outcome {
            CleanupOutcome::Failed(reason) => reason.to_string(),
            CleanupOutcome::NotFound => format!("{description} no longer exists"),
            _ => format!("deleted {description}"),
        };

        ResourceReport {
            kind,
            identifier: Some(identifier),
            outcome: Some(outcome),
            detail,
        }
    }
}

/// Map an API answer to an outcome. A missing resource means an earlier run
/// (or someone else) already removed it, which counts as done.
fn classify(result: Result<ApiResponse, ReaperError>) -> CleanupOutcome {
    match result.and_then(ApiResponse::error_for_status) {
        Ok(resp) if resp.is_not_found() => CleanupOutcome::NotFound,
        Ok(_) => CleanupOutcome::Deleted,
        Err(ReaperError::RemoteFailure { status, body }) => {
            CleanupOutcome::Failed(FailureReason::Remote { status, body })
        }
        Err(e) => CleanupOutcome::Failed(FailureReason::Transport {
            message: e.to_string(),
        }),
    }
}

fn absent(kind: ResourceKind) -> ResourceReport {
    ResourceReport {
        kind,
        identifier: None,
        outcome: Some(CleanupOutcome::NotFound),
        detail: format!("no {kind} associated with the pull request"),
    }
}

fn protected(descriptor: &ResourceDescriptor) -> ResourceReport {
    ResourceReport {
        kind: descriptor.kind(),
        identifier: Some(descriptor.identifier().to_string()),
        outcome: Some(CleanupOutcome::Protected),
        detail: format!("{} is protected", descriptor.description()),
    }
}
