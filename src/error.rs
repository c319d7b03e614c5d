//! Top-level error type for hostguard.
//!
//! Component errors live next to their components (`security`, `shell`,
//! `editor`, `tools`, `logging`). This module holds the error for setup
//! failures: configuration, project root and logging.
//!
//! Each error type implements Display, Debug, Clone, PartialEq, Eq, and
//! std::error::Error. No external error crates are used in the library.

use crate::logging::LoggingError;
use crate::security::PathValidationError;
use std::fmt;

/// Errors that can occur while setting hostguard up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGuardError {
    /// The specific error that occurred
    pub kind: HostGuardErrorKind,
}

/// Specific setup error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostGuardErrorKind {
    /// Configuration could not be read or parsed
    Configuration {
        /// Description of what was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },
    /// The project root is unusable
    ProjectRoot(PathValidationError),
    /// Logging could not be initialized
    Logging {
        /// Description of the failure
        reason: String,
    },
}

impl HostGuardError {
    /// Creates a new HostGuardError with the given kind.
    #[must_use]
    pub fn new(kind: HostGuardErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(HostGuardErrorKind::Configuration {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if this error indicates a configuration problem.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, HostGuardErrorKind::Configuration { .. })
    }

    /// Returns true if the project root was rejected.
    #[must_use]
    pub fn is_project_root(&self) -> bool {
        matches!(self.kind, HostGuardErrorKind::ProjectRoot(_))
    }
}

impl From<PathValidationError> for HostGuardError {
    fn from(error: PathValidationError) -> Self {
        Self::new(HostGuardErrorKind::ProjectRoot(error))
    }
}

impl From<LoggingError> for HostGuardError {
    fn from(error: LoggingError) -> Self {
        Self::new(HostGuardErrorKind::Logging {
            reason: error.to_string(),
        })
    }
}

impl fmt::Display for HostGuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HostGuardErrorKind::Configuration { field, reason } => {
                write!(f, "configuration error for '{}': {}", field, reason)
            }
            HostGuardErrorKind::ProjectRoot(error) => {
                write!(f, "{}; pass --root or set project_root", error)
            }
            HostGuardErrorKind::Logging { reason } => {
                write!(f, "logging setup failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for HostGuardError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn configuration_error_display() {
        let error = HostGuardError::configuration("config_file", "invalid TOML");
        let message = error.to_string();
        assert!(error.is_configuration());
        assert!(message.contains("config_file"));
        assert!(message.contains("invalid TOML"));
    }

    #[test]
    fn project_root_error_suggests_flag() {
        let error = HostGuardError::from(PathValidationError::InvalidRoot {
            root: PathBuf::from("/missing"),
            reason: "does not exist".to_string(),
        });
        assert!(error.is_project_root());
        assert!(error.to_string().contains("--root"));
    }

    #[test]
    fn errors_are_eq() {
        let a = HostGuardError::configuration("a", "b");
        assert_eq!(a.clone(), a);
        assert_ne!(a, HostGuardError::configuration("a", "c"));
    }
}
