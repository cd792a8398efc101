//! Error types for GuideVault.
//!
//! Library crates use [`GuideVaultError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all GuideVault operations.
#[derive(Debug, thiserror::Error)]
pub enum GuideVaultError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to a provider API.
    #[error("network error: {0}")]
    Network(String),

    /// A referenced session, agent, campaign, or template does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An answer value or template document does not match its expected shape.
    #[error("malformed {kind}: {message}")]
    Malformed { kind: String, message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GuideVaultError>;

impl GuideVaultError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a not-found error naming the missing entity.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a malformed-data error for a given kind of input
    /// (e.g. "answer value", "template").
    pub fn malformed(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Malformed {
            kind: kind.into(),
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

    /// Whether this error means the referenced entity simply does not exist,
    /// as opposed to a transient or structural failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = GuideVaultError::config("missing provider base URL");
        assert_eq!(err.to_string(), "config error: missing provider base URL");

        let err = GuideVaultError::malformed("answer value", "non-indexed map");
        assert!(err.to_string().contains("answer value"));
        assert!(err.to_string().contains("non-indexed map"));
    }

    #[test]
    fn not_found_classification() {
        assert!(GuideVaultError::not_found("session abc").is_not_found());
        assert!(!GuideVaultError::Network("timeout".into()).is_not_found());
    }
}
