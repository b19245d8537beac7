//! Error taxonomy for the cleanup controller.
//!
//! Only [`ReaperError::Input`] and [`ReaperError::Config`] abort an
//! invocation. Every other variant is recorded against the resource it
//! concerns and never stops the sibling resource from being processed.

use std::path::PathBuf;

use crate::model::PullRequestId;

/// Errors raised while resolving or tearing down pull request resources.
#[derive(Debug, thiserror::Error)]
pub enum ReaperError {
    /// The invocation did not carry a usable pull request identifier.
    #[error("Invalid input: {0}")]
    Input(String),

    /// The state snapshot could not be read or parsed.
    #[error("State snapshot unreadable at {}: {reason}", path.display())]
    StateUnreadable {
        /// Location the snapshot was expected at.
        path: PathBuf,
        /// Underlying I/O or parse failure.
        reason: String,
    },

    /// No anchor catalog is associated with the pull request.
    #[error("No resources found for PR #{pr}")]
    NotFound {
        /// Pull request that was searched for.
        pr: PullRequestId,
    },

    /// The protection policy vetoed the deletion.
    #[error("Catalog '{name}' is protected")]
    Protected {
        /// Name of the protected catalog.
        name: String,
    },

    /// The management API answered with a non-success status.
    #[error("Remote API rejected the request (HTTP {status}): {body}")]
    RemoteFailure {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The call to the management API could not complete.
    #[error("Transport failure: {message}")]
    TransportFailure {
        /// Description of the transport error.
        message: String,
    },

    /// Configuration cannot be turned into a working controller.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReaperError {
    /// Create a new `Input` error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Create a new `StateUnreadable` error
    pub fn state_unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StateUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new `TransportFailure` error
    pub fn transport(message: impl ToString) -> Self {
        Self::TransportFailure {
            message: message.to_string(),
        }
    }

    /// Create a new `Config` error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error ends the invocation instead of being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, ReaperError>;
