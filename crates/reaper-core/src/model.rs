//! Data model shared by the resolver, executor and event handler.
//!
//! Everything here is built fresh for a single invocation and dropped at
//! the end of it. The controller keeps no state between runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReaperError, Result};

/// Pull request number supplied by the trigger source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestId(u64);

impl PullRequestId {
    pub fn new(number: u64) -> Result<Self> {
        if number == 0 {
            return Err(ReaperError::input("pull request number must be > 0"));
        }
        Ok(Self(number))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PullRequestId {
    type Err = ReaperError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(ReaperError::input("pull request number is required"));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| ReaperError::input(format!("invalid pull request number: \"{s}\"")))?;
        Self::new(number)
    }
}

/// Kinds of resources a pull request sandbox owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Unity Catalog catalog (recursive, data-bearing)
    Catalog,
    /// SQL warehouse (compute only)
    Warehouse,
}

impl ResourceKind {
    /// Kinds in the order they are torn down.
    pub const TEARDOWN_ORDER: [ResourceKind; 2] = [ResourceKind::Catalog, ResourceKind::Warehouse];

    /// Get cleanup priority (lower number = cleanup first)
    ///
    /// The catalog delete cascades over schemas and tables, so it is
    /// evaluated against the protection policy and attempted first. The
    /// warehouse has no data behind it and is attempted regardless of how
    /// the catalog went.
    pub fn cleanup_priority(self) -> u8 {
        match self {
            ResourceKind::Catalog => 0,
            ResourceKind::Warehouse => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Catalog => "catalog",
            ResourceKind::Warehouse => "warehouse",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete resource to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDescriptor {
    Catalog { name: String },
    Warehouse { id: String },
}

impl ResourceDescriptor {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDescriptor::Catalog { .. } => ResourceKind::Catalog,
            ResourceDescriptor::Warehouse { .. } => ResourceKind::Warehouse,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            ResourceDescriptor::Catalog { name } => name,
            ResourceDescriptor::Warehouse { id } => id,
        }
    }

    /// Get a human-readable description for logging
    pub fn description(&self) -> String {
        match self {
            ResourceDescriptor::Catalog { name } => format!("catalog {name}"),
            ResourceDescriptor::Warehouse { id } => format!("SQL warehouse {id}"),
        }
    }
}

/// Resources associated with one pull request: zero or one of each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    pub catalog: Option<String>,
    pub warehouse_id: Option<String>,
}

impl ResourceSet {
    pub fn new(catalog: Option<String>, warehouse_id: Option<String>) -> Self {
        Self {
            catalog,
            warehouse_id,
        }
    }

    pub fn descriptor(&self, kind: ResourceKind) -> Option<ResourceDescriptor> {
        match kind {
            ResourceKind::Catalog => self
                .catalog
                .clone()
                .map(|name| ResourceDescriptor::Catalog { name }),
            ResourceKind::Warehouse => self
                .warehouse_id
                .clone()
                .map(|id| ResourceDescriptor::Warehouse { id }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_none() && self.warehouse_id.is_none()
    }

    /// The catalog anchors a sandbox; without one there is nothing to clean.
    pub fn has_anchor(&self) -> bool {
        self.catalog.is_some()
    }
}

/// Why a resource could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// The API answered with a non-success status.
    Remote { status: u16, body: String },
    /// The call never completed.
    Transport { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Remote { status, body } if body.is_empty() => {
                write!(f, "HTTP {status}")
            }
            FailureReason::Remote { status, body } => write!(f, "HTTP {status}: {body}"),
            FailureReason::Transport { message } => write!(f, "transport: {message}"),
        }
    }
}

/// Result of handling a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum CleanupOutcome {
    Deleted,
    Protected,
    NotFound,
    Failed(FailureReason),
}

impl CleanupOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CleanupOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CleanupOutcome::Deleted => "deleted",
            CleanupOutcome::Protected => "protected",
            CleanupOutcome::NotFound => "not found",
            CleanupOutcome::Failed(_) => "failed",
        }
    }
}

/// What happened to one resource kind during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub kind: ResourceKind,
    pub identifier: Option<String>,
    /// `None` only in dry runs, for resources that would be deleted.
    pub outcome: Option<CleanupOutcome>,
    pub detail: String,
}

/// How far a run got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunDisposition {
    /// Teardown ran; see the per-resource entries.
    Executed,
    /// No anchor catalog was resolved for the pull request.
    NothingToClean,
    /// The state snapshot could not be read, so nothing was resolved.
    StateUnreadable { reason: String },
    /// Resources were resolved but no destructive call was made.
    DryRun,
}

/// Outcome of one invocation, one entry per resource kind attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub pr: PullRequestId,
    pub disposition: RunDisposition,
    pub entries: Vec<ResourceReport>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn new(pr: PullRequestId, disposition: RunDisposition) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pr,
            disposition,
            entries: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn nothing_to_clean(pr: PullRequestId) -> Self {
        Self::new(pr, RunDisposition::NothingToClean)
    }

    pub fn state_unreadable(pr: PullRequestId, reason: impl Into<String>) -> Self {
        Self::new(
            pr,
            RunDisposition::StateUnreadable {
                reason: reason.into(),
            },
        )
    }

    pub fn push(&mut self, report: ResourceReport) {
        self.entries.push(report);
    }

    pub fn entry(&self, kind: ResourceKind) -> Option<&ResourceReport> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn outcome(&self, kind: ResourceKind) -> Option<&CleanupOutcome> {
        self.entry(kind).and_then(|e| e.outcome.as_ref())
    }

    pub fn deleted_count(&self) -> usize {
        self.count(|o| matches!(o, CleanupOutcome::Deleted))
    }

    pub fn failed_count(&self) -> usize {
        self.count(CleanupOutcome::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    fn count(&self, pred: impl Fn(&CleanupOutcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref())
            .filter(|o| pred(o))
            .count()
    }
}
