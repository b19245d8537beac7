//! Seam between the controller and the remote resource management API.
//!
//! [`ManagementApi`] is the collaborator the executor talks to;
//! [`Destroyable`] binds one resolved resource to it so the teardown loop
//! treats every kind the same way.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ReaperError, Result};
use crate::model::{ResourceDescriptor, ResourceKind};

/// Raw answer from the management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `error_code` field of a Databricks error body, if there is one.
    pub fn error_code(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorBody {
            error_code: Option<String>,
        }
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.error_code)
    }

    /// A 404 that the API itself attributes to a missing resource. A bare
    /// 404 from a proxy or a wrong path prefix does not count.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
            && self
                .error_code()
                .is_some_and(|code| code.ends_with("DOES_NOT_EXIST") || code == "NOT_FOUND")
    }

    /// Pass successes and missing resources through, turn every other
    /// status into [`ReaperError::RemoteFailure`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() || self.is_not_found() {
            Ok(self)
        } else {
            Err(ReaperError::RemoteFailure {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Destructive operations offered by the remote management API.
///
/// Implementations return every HTTP answer as an [`ApiResponse`], whatever
/// its status. Only a call that could not complete is an error, reported as
/// [`ReaperError::TransportFailure`].
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Delete a catalog. With `force` the delete cascades over schemas and
    /// tables.
    async fn delete_catalog(&self, name: &str, force: bool) -> Result<ApiResponse>;

    async fn delete_warehouse(&self, id: &str) -> Result<ApiResponse>;
}

/// A resource that can be torn down with a single remote call.
#[async_trait]
pub trait Destroyable: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn identifier(&self) -> &str;

    async fn delete(&self) -> Result<ApiResponse>;
}

/// Catalog bound to the API; always deleted recursively.
pub struct CatalogTarget {
    name: String,
    api: Arc<dyn ManagementApi>,
}

impl CatalogTarget {
    pub fn new(name: impl Into<String>, api: Arc<dyn ManagementApi>) -> Self {
        Self {
            name: name.into(),
            api,
        }
    }
}

#[async_trait]
impl Destroyable for CatalogTarget {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Catalog
    }

    fn identifier(&self) -> &str {
        &self.name
    }

    async fn delete(&self) -> Result<ApiResponse> {
        self.api.delete_catalog(&self.name, true).await
    }
}

pub struct WarehouseTarget {
    id: String,
    api: Arc<dyn ManagementApi>,
}

impl WarehouseTarget {
    pub fn new(id: impl Into<String>, api: Arc<dyn ManagementApi>) -> Self {
        Self { id: id.into(), api }
    }
}

#[async_trait]
impl Destroyable for WarehouseTarget {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Warehouse
    }

    fn identifier(&self) -> &str {
        &self.id
    }

    async fn delete(&self) -> Result<ApiResponse> {
        self.api.delete_warehouse(&self.id).await
    }
}

/// Bind a descriptor to the API it will be deleted through.
pub fn bind(descriptor: ResourceDescriptor, api: Arc<dyn ManagementApi>) -> Box<dyn Destroyable> {
    match descriptor {
        ResourceDescriptor::Catalog { name } => Box::new(CatalogTarget::new(name, api)),
        ResourceDescriptor::Warehouse { id } => Box::new(WarehouseTarget::new(id, api)),
    }
}
