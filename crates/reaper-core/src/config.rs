//! Controller configuration, handed to [`build_handler`](crate::build_handler)
//! instead of being read from the process environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReaperError, Result};
use crate::policy::{ProtectionSet, default_protection_set};
use crate::resolver::NamingConvention;

/// Bearer token for the management API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Everything the controller needs, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Workspace host, with or without scheme
    pub host: String,
    pub credential: Credential,
    pub protected_names: ProtectionSet,
    pub naming: NamingConvention,
    /// Snapshot to scan when no explicit identifiers are given
    pub state_path: Option<PathBuf>,
    /// Per-request deadline applied by the HTTP client
    pub request_timeout: Option<Duration>,
}

impl ControllerConfig {
    pub fn new(host: impl Into<String>, credential: Credential) -> Self {
        Self {
            host: host.into(),
            credential,
            protected_names: default_protection_set(),
            naming: NamingConvention::default(),
            state_path: None,
            request_timeout: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ReaperError::config("host must not be empty"));
        }
        if self.credential.is_empty() {
            return Err(ReaperError::config("credential must not be empty"));
        }
        if self.naming.catalog_prefix.is_empty() || self.naming.warehouse_prefix.is_empty() {
            return Err(ReaperError::config("naming prefixes must not be empty"));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ReaperError::config("request timeout must be > 0"));
        }
        Ok(())
    }
}
