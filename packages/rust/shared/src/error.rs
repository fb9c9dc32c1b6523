//! Error types for sitegen.
//!
//! Library crates use [`SitegenError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::{Action, ProvisionStep};

/// Top-level error type for all sitegen operations.
#[derive(Debug, thiserror::Error)]
pub enum SitegenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// No bearer token could be obtained from any provider.
    #[error("auth error: {message}")]
    Auth { message: String },

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The remote API answered with a non-2xx status.
    #[error("{operation} failed: HTTP {status} {reason}")]
    Http {
        operation: String,
        status: u16,
        reason: String,
    },

    /// Malformed response payload.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input or state validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A provisioning step failed; later steps were not attempted.
    #[error("{step} step failed: {source}")]
    Step {
        step: ProvisionStep,
        source: Box<SitegenError>,
    },

    /// One or more pages failed during a preview/publish fan-out.
    /// `source` is the first failure in page order.
    #[error("{action} failed for {failed} of {total} pages: {source}")]
    Action {
        action: Action,
        failed: usize,
        total: usize,
        source: Box<SitegenError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SitegenError>;

impl SitegenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an auth error from any displayable message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an HTTP error from a response status.
    pub fn http(operation: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::Http {
            operation: operation.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Attribute this error to a provisioning step.
    pub fn in_step(self, step: ProvisionStep) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The HTTP status code, looking through step/action wrappers.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Step { source, .. } | Self::Action { source, .. } => source.http_status(),
            _ => None,
        }
    }
}
