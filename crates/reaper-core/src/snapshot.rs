//! Read-only model of the Terraform state document the resolver scans.
//!
//! Only the handful of fields the resolver needs are modelled; everything
//! else in the document is ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ReaperError, Result};

/// Whether an entry is owned by the state or only read through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    Managed,
    Data,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub resources: Vec<StateResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateResource {
    pub mode: ResourceMode,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instances: Vec<StateInstance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateInstance {
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl StateInstance {
    /// String attribute lookup; non-string values are treated as absent.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// A managed instance flattened out of the snapshot, in declared order.
#[derive(Debug, Clone, Copy)]
pub struct ManagedEntry<'a> {
    pub kind: &'a str,
    pub instance: &'a StateInstance,
}

impl StateSnapshot {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Load a snapshot from disk. Both a missing file and malformed JSON
    /// surface as [`ReaperError::StateUnreadable`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw =
            fs::read_to_string(path).map_err(|e| ReaperError::state_unreadable(path, e))?;
        Self::from_json(&raw).map_err(|e| ReaperError::state_unreadable(path, e))
    }

    /// Managed instances only, resource order first, then instance order.
    pub fn managed_entries(&self) -> impl Iterator<Item = ManagedEntry<'_>> {
        self.resources
            .iter()
            .filter(|r| r.mode == ResourceMode::Managed)
            .flat_map(|r| {
                r.instances.iter().map(move |instance| ManagedEntry {
                    kind: r.kind.as_str(),
                    instance,
                })
            })
    }
}
