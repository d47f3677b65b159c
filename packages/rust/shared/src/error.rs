//! Error types for the DCP core.
//!
//! Library crates use [`DcpError`] via `thiserror`.
//! The `dcp` binary wraps this with `color-eyre` for rich diagnostics.
//!
//! Three kinds matter to callers and must not be conflated:
//! - [`DcpError::InvalidInput`]: a whole argument is missing.
//! - [`DcpError::BadParameter`]: one named request parameter is unusable (client error).
//! - [`DcpError::ConfigurationIntegrity`]: stored provider configuration breaks
//!   an invariant (administrator-facing, always fatal).

use std::path::PathBuf;

/// Suffix appended to every configuration-integrity message.
const CONTACT_ADMINS: &str = "Contact administrators please.";

/// Top-level error type for all DCP operations.
#[derive(Debug, thiserror::Error)]
pub enum DcpError {
    /// Caller passed a wholly absent or unusable argument.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A named request parameter has an unparsable or out-of-range value.
    #[error("Parameter {name} has bad value{}", .description.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    BadParameter {
        name: String,
        description: Option<String>,
    },

    /// Stored provider configuration violates an invariant
    /// (duplicate unique keys, malformed structure, missing required field).
    #[error("configuration integrity violation: {message}")]
    ConfigurationIntegrity { message: String },

    /// Application configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Document store or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization error outside of provider documents.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DcpError>;

impl DcpError {
    /// Create an invalid-input error from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Create a bad-parameter error naming the offending parameter.
    pub fn bad_parameter(name: impl Into<String>) -> Self {
        Self::BadParameter {
            name: name.into(),
            description: None,
        }
    }

    /// Create a bad-parameter error with a detailed description.
    pub fn bad_parameter_with(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::BadParameter {
            name: name.into(),
            description: Some(description.into()),
        }
    }

    /// Create a configuration-integrity error. The administrator hint is appended.
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::ConfigurationIntegrity {
            message: format!("{} {CONTACT_ADMINS}", msg.into()),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Name of the offending parameter, for [`DcpError::BadParameter`] only.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::BadParameter { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether this error should be reported to the client as its own fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::BadParameter { .. })
    }
}
