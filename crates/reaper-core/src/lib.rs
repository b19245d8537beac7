//! Lifecycle controller for pull-request-scoped Databricks sandboxes.
//!
//! When a pull request closes, the [`EventHandler`] resolves the catalog and
//! SQL warehouse that belong to it, checks the catalog against the
//! [`ProtectionPolicy`], and hands the rest to the [`TeardownExecutor`],
//! which deletes them through a [`ManagementApi`] implementation.

pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod handler;
pub mod model;
pub mod policy;
pub mod resolver;
pub mod snapshot;

pub use api::{ApiResponse, CatalogTarget, Destroyable, ManagementApi, WarehouseTarget};
pub use config::{ControllerConfig, Credential};
pub use error::{ReaperError, Result};
pub use executor::TeardownExecutor;
pub use handler::EventHandler;
pub use model::{
    CleanupOutcome, FailureReason, PullRequestId, ResourceDescriptor, ResourceKind,
    ResourceReport, ResourceSet, RunDisposition, RunSummary,
};
pub use policy::{DEFAULT_PROTECTED_CATALOGS, ProtectionPolicy, ProtectionSet};
pub use resolver::{
    CleanupRequest, ExplicitResolver, LayeredResolver, NamingConvention, ResourceResolver,
    SnapshotResolver,
};
pub use snapshot::StateSnapshot;

use std::sync::Arc;

/// Wire a handler from configuration and an API implementation.
///
/// The snapshot fallback is only enabled when `state_path` is configured.
pub fn build_handler(config: &ControllerConfig, api: Arc<dyn ManagementApi>) -> Result<EventHandler> {
    config.validate()?;
    let snapshot = config
        .state_path
        .as_ref()
        .map(|path| SnapshotResolver::new(path.clone(), config.naming.clone()));
    let resolver = LayeredResolver::new(snapshot);
    let executor = TeardownExecutor::new(api, ProtectionPolicy::new(config.protected_names.clone()));
    Ok(EventHandler::new(Box::new(resolver), executor))
}
