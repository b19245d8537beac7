//! Resource identifier resolution.
//!
//! Explicit identifiers handed over by the trigger source always win. The
//! snapshot scan is a fallback that guesses ownership from naming
//! conventions and sits behind the same [`ResourceResolver`] trait so it
//! can be dropped without touching the executor or the handler.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{ReaperError, Result};
use crate::model::{PullRequestId, ResourceSet};
use crate::snapshot::StateSnapshot;

/// A PR-closed signal plus whatever identifiers the trigger already knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRequest {
    pub pr: PullRequestId,
    pub catalog: Option<String>,
    pub warehouse_id: Option<String>,
}

impl CleanupRequest {
    pub fn new(pr: PullRequestId) -> Self {
        Self {
            pr,
            catalog: None,
            warehouse_id: None,
        }
    }

    /// Build a request from optional explicit identifiers. Blank strings
    /// count as absent.
    pub fn explicit(
        pr: PullRequestId,
        catalog: Option<String>,
        warehouse_id: Option<String>,
    ) -> Self {
        Self {
            pr,
            catalog: non_blank(catalog),
            warehouse_id: non_blank(warehouse_id),
        }
    }

    pub fn with_catalog(mut self, name: impl Into<String>) -> Self {
        self.catalog = non_blank(Some(name.into()));
        self
    }

    pub fn with_warehouse_id(mut self, id: impl Into<String>) -> Self {
        self.warehouse_id = non_blank(Some(id.into()));
        self
    }

    pub fn has_explicit(&self) -> bool {
        self.catalog.is_some() || self.warehouse_id.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Naming conventions that tie snapshot entries to a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    pub catalog_prefix: String,
    pub warehouse_prefix: String,
    /// Snapshot `type` of catalog entries
    pub catalog_kind: String,
    /// Snapshot `type` of warehouse entries
    pub warehouse_kind: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            catalog_prefix: "sandbox_pr_".into(),
            warehouse_prefix: "pr_warehouse_".into(),
            catalog_kind: "databricks_catalog".into(),
            warehouse_kind: "databricks_sql_warehouse".into(),
        }
    }
}

impl NamingConvention {
    /// `<prefix><pr>` anywhere in the name, not followed by another digit,
    /// so PR 12 never claims `sandbox_pr_123`.
    fn matcher(prefix: &str, pr: PullRequestId) -> Result<Regex> {
        Regex::new(&format!("{}{}(?:$|[^0-9])", regex::escape(prefix), pr))
            .map_err(|e| ReaperError::config(format!("invalid naming prefix \"{prefix}\": {e}")))
    }

    pub fn catalog_matcher(&self, pr: PullRequestId) -> Result<Regex> {
        Self::matcher(&self.catalog_prefix, pr)
    }

    pub fn warehouse_matcher(&self, pr: PullRequestId) -> Result<Regex> {
        Self::matcher(&self.warehouse_prefix, pr)
    }
}

/// Resolve the resources for a request.
///
/// Explicit identifiers take precedence and the snapshot is not consulted.
/// Otherwise the snapshot is scanned; when several managed entries of one
/// kind match, the last one in declared order wins. A missing catalog is
/// reported as [`ReaperError::NotFound`] even if a warehouse matched.
pub fn resolve(
    request: &CleanupRequest,
    snapshot: Option<&StateSnapshot>,
    naming: &NamingConvention,
) -> Result<ResourceSet> {
    let pr = request.pr;

    if request.has_explicit() {
        debug!(pr = %pr, "Using explicit resource identifiers");
        let set = ResourceSet::new(request.catalog.clone(), request.warehouse_id.clone());
        return anchored(pr, set);
    }

    let Some(snapshot) = snapshot else {
        return Err(ReaperError::NotFound { pr });
    };

    let catalog_re = naming.catalog_matcher(pr)?;
    let warehouse_re = naming.warehouse_matcher(pr)?;
    let mut set = ResourceSet::default();

    for entry in snapshot.managed_entries() {
        let Some(name) = entry.instance.attribute("name") else {
            continue;
        };

        if entry.kind == naming.catalog_kind && catalog_re.is_match(name) {
            if let Some(previous) = set.catalog.replace(name.to_string()) {
                warn!(
                    pr = %pr,
                    previous = %previous,
                    current = %name,
                    "Multiple catalogs match PR, using the last one"
                );
            }
        } else if entry.kind == naming.warehouse_kind && warehouse_re.is_match(name) {
            let Some(id) = entry.instance.attribute("id") else {
                warn!(pr = %pr, warehouse = %name, "Matching warehouse has no id attribute, skipping");
                continue;
            };
            if let Some(previous) = set.warehouse_id.replace(id.to_string()) {
                warn!(
                    pr = %pr,
                    previous = %previous,
                    current = %id,
                    "Multiple warehouses match PR, using the last one"
                );
            }
        }
    }

    anchored(pr, set)
}

fn anchored(pr: PullRequestId, set: ResourceSet) -> Result<ResourceSet> {
    if set.has_anchor() {
        return Ok(set);
    }
    if let Some(id) = &set.warehouse_id {
        info!(pr = %pr, warehouse_id = %id, "Warehouse found without a catalog, nothing to clean");
    }
    Err(ReaperError::NotFound { pr })
}

/// Turns a cleanup request into the concrete resources to act on.
pub trait ResourceResolver: Send + Sync {
    fn resolve(&self, request: &CleanupRequest) -> Result<ResourceSet>;
}

/// Uses only the identifiers carried by the request.
#[derive(Debug, Clone, Default)]
pub struct ExplicitResolver;

impl ResourceResolver for ExplicitResolver {
    fn resolve(&self, request: &CleanupRequest) -> Result<ResourceSet> {
        let set = ResourceSet::new(request.catalog.clone(), request.warehouse_id.clone());
        anchored(request.pr, set)
    }
}

/// Scans a state snapshot on disk. The file is re-read on every call so
/// each invocation sees the current state.
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    path: PathBuf,
    naming: NamingConvention,
}

impl SnapshotResolver {
    pub fn new(path: impl Into<PathBuf>, naming: NamingConvention) -> Self {
        Self {
            path: path.into(),
            naming,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResourceResolver for SnapshotResolver {
    fn resolve(&self, request: &CleanupRequest) -> Result<ResourceSet> {
        let snapshot = StateSnapshot::from_path(&self.path)?;
        debug!(
            pr = %request.pr,
            path = %self.path.display(),
            resources = snapshot.resources.len(),
            "Loaded state snapshot"
        );
        let scan_only = CleanupRequest::new(request.pr);
        resolve(&scan_only, Some(&snapshot), &self.naming)
    }
}

/// Explicit identifiers first, snapshot scan as the fallback.
#[derive(Debug, Clone, Default)]
pub struct LayeredResolver {
    explicit: ExplicitResolver,
    snapshot: Option<SnapshotResolver>,
}

impl LayeredResolver {
    pub fn new(snapshot: Option<SnapshotResolver>) -> Self {
        Self {
            explicit: ExplicitResolver,
            snapshot,
        }
    }
}

impl ResourceResolver for LayeredResolver {
    fn resolve(&self, request: &CleanupRequest) -> Result<ResourceSet> {
        match &self.snapshot {
            Some(snapshot) if !request.has_explicit() => snapshot.resolve(request),
            _ => self.explicit.resolve(request),
        }
    }
}
