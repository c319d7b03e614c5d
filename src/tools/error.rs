//! Tool error types.
//!
//! Errors raised by tools and the tool box. At the tool boundary they are
//! flattened into `"Error: ..."` strings.

use std::fmt;
use std::time::Duration;

/// Errors that can occur in tool operations.
///
/// This type uses Box<ToolErrorKind> to keep the error size small,
/// enabling efficient use in Result types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    /// The specific error that occurred (boxed for size efficiency)
    kind: Box<ToolErrorKind>,
}

/// Specific tool error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Tool not found in the tool box
    NotFound {
        /// The name of the tool that was not found
        tool_name: String,
    },
    /// Tool arguments are invalid
    ValidationFailed {
        /// The name of the tool
        tool_name: String,
        /// What was invalid
        reason: String,
    },
    /// A security check refused the request
    Rejected {
        /// The name of the tool
        tool_name: String,
        /// Why the request was refused
        reason: String,
    },
    /// Tool execution failed
    ExecutionFailed {
        /// The name of the tool
        tool_name: String,
        /// Reason for failure
        reason: String,
    },
    /// Tool execution timed out
    Timeout {
        /// The name of the tool
        tool_name: String,
        /// The timeout duration that was exceeded
        duration: Duration,
    },
    /// Internal error
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl ToolError {
    /// Creates a new ToolError with the given kind.
    #[must_use]
    pub fn new(kind: ToolErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &ToolErrorKind {
        &self.kind
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(tool_name: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound {
            tool_name: tool_name.into(),
        })
    }

    /// Creates a validation failed error.
    #[must_use]
    pub fn validation_failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ValidationFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates a rejected error.
    #[must_use]
    pub fn rejected(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Rejected {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(tool_name: impl Into<String>, duration: Duration) -> Self {
        Self::new(ToolErrorKind::Timeout {
            tool_name: tool_name.into(),
            duration,
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal {
            message: message.into(),
        })
    }

    /// Returns true if this error indicates the tool was not found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::NotFound { .. })
    }

    /// Returns true if a security check refused the request.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::Rejected { .. })
    }

    /// Returns true if this error is worth retrying unchanged.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::Timeout { .. })
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            ToolErrorKind::NotFound { tool_name } => {
                write!(
                    f,
                    "tool '{}' not found; verify the tool is enabled",
                    tool_name
                )
            }
            ToolErrorKind::ValidationFailed { tool_name, reason } => {
                write!(
                    f,
                    "tool '{}' validation failed: {}; check the input arguments",
                    tool_name, reason
                )
            }
            ToolErrorKind::Rejected { tool_name, reason } => {
                write!(f, "tool '{}' refused the request: {}", tool_name, reason)
            }
            ToolErrorKind::ExecutionFailed { tool_name, reason } => {
                write!(f, "tool '{}' execution failed: {}", tool_name, reason)
            }
            ToolErrorKind::Timeout {
                tool_name,
                duration,
            } => {
                write!(
                    f,
                    "tool '{}' timed out after {} seconds; the command may still be running, reset the session to stop it",
                    tool_name,
                    duration.as_secs()
                )
            }
            ToolErrorKind::Internal { message } => {
                write!(f, "internal tool error: {}", message)
            }
        }
    }
}

impl std::error::Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_not_found_display() {
        let error = ToolError::not_found("calculator");
        let message = error.to_string();
        assert!(message.contains("calculator"));
        assert!(message.contains("not found"));
    }

    #[test]
    fn tool_error_rejected_display() {
        let error = ToolError::rejected("bash", "forbidden pattern detected: background execution");
        let message = error.to_string();
        assert!(error.is_rejected());
        assert!(message.contains("refused"));
        assert!(message.contains("background execution"));
    }

    #[test]
    fn tool_error_execution_failed_display() {
        let error = ToolError::execution_failed("ls", "permission denied");
        let message = error.to_string();
        assert!(message.contains("ls"));
        assert!(message.contains("execution failed"));
        assert!(message.contains("permission denied"));
    }

    #[test]
    fn tool_error_timeout_display() {
        let error = ToolError::timeout("bash", Duration::from_secs(30));
        let message = error.to_string();
        assert!(message.contains("timed out"));
        assert!(message.contains("30"));
        assert!(error.is_retriable());
    }

    #[test]
    fn tool_error_validation_failed_display() {
        let error = ToolError::validation_failed("grep", "missing required field");
        let message = error.to_string();
        assert!(message.contains("validation failed"));
        assert!(message.contains("missing required field"));
        assert!(!error.is_retriable());
    }

    #[test]
    fn errors_are_eq() {
        assert_eq!(ToolError::internal("x"), ToolError::internal("x"));
        assert_ne!(ToolError::internal("x"), ToolError::not_found("x"));
    }

    #[test]
    fn tool_error_kind_accessor() {
        let error = ToolError::not_found("test");
        assert!(error.is_not_found());
        assert!(matches!(error.kind(), ToolErrorKind::NotFound { .. }));
    }
}
