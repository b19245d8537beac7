//! Databricks REST implementation of [`reaper_core::ManagementApi`].
//!
//! Endpoints used:
//! - `DELETE /api/2.1/unity-catalog/catalogs/{name}?force=true`
//! - `DELETE /api/2.0/sql/warehouses/{id}`

mod client;

pub use client::DatabricksClient;
