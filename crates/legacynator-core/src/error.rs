//! Error types for configuration, discovery and build orchestration
//!
//! The rewrite itself never fails; everything here comes from the layers
//! around it.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::BuildPhase;

/// Main error type for legacynator operations
#[derive(Debug, Error)]
pub enum LegacyError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A Restore, Build or Pack phase finished unsuccessfully
    #[error("{phase} failed, see binary log at '{}'", binlog.display())]
    BuildFailed { phase: BuildPhase, binlog: PathBuf },

    /// The build tool could not be started at all
    #[error("Could not run '{tool}': {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Source document discovery errors (bad globs, unreadable directories)
    #[error("Discovery error: {message}")]
    DiscoveryError { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    Build,
    Tool,
    Discovery,
    Internal,
}

impl LegacyError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LegacyError::ConfigError { .. } => ErrorKind::Config,
            LegacyError::IoError { .. } => ErrorKind::Io,
            LegacyError::BuildFailed { .. } => ErrorKind::Build,
            LegacyError::ToolUnavailable { .. } => ErrorKind::Tool,
            LegacyError::DiscoveryError { .. } => ErrorKind::Discovery,
            LegacyError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Io | ErrorKind::Discovery)
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    pub fn build_failed(phase: BuildPhase, binlog: impl Into<PathBuf>) -> Self {
        Self::BuildFailed {
            phase,
            binlog: binlog.into(),
        }
    }

    pub fn tool_unavailable(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self::ToolUnavailable {
            tool: tool.into(),
            source,
        }
    }

    pub fn discovery_error(message: impl Into<String>) -> Self {
        Self::DiscoveryError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for LegacyError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failed_message_names_phase_and_log() {
        let err = LegacyError::build_failed(BuildPhase::Restore, "Moq-Restore.binlog");
        assert_eq!(
            err.to_string(),
            "Restore failed, see binary log at 'Moq-Restore.binlog'"
        );
        assert_eq!(err.kind(), ErrorKind::Build);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_errors_are_recoverable() {
        let err = LegacyError::io_error(
            "Mock.cs",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("Mock.cs"));
    }
}
