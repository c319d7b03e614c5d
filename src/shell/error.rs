//! Shell session error types.

use crate::security::CommandValidationError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur while driving the keep-alive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellError {
    /// The specific error that occurred
    pub kind: ShellErrorKind,
}

/// Specific shell error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellErrorKind {
    /// Command was rejected before reaching the shell
    Rejected(CommandValidationError),
    /// The shell process could not be spawned
    SpawnFailed {
        /// Program that was launched
        program: String,
        /// Reason for the failure
        reason: String,
    },
    /// The startup `cd` into the working directory failed
    WorkingDirectory {
        /// Directory the session tried to enter
        path: PathBuf,
        /// Shell output explaining the failure
        output: String,
    },
    /// No sentinel arrived within the time limit
    Timeout {
        /// The limit that was exceeded
        duration: Duration,
    },
    /// The shell exited while a command was in flight
    Exited,
    /// Reading from or writing to the shell failed
    Io {
        /// Description of the failure
        reason: String,
    },
    /// The session was closed
    Closed,
}

impl ShellError {
    /// Creates a new ShellError with the given kind.
    #[must_use]
    pub fn new(kind: ShellErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a spawn failed error.
    #[must_use]
    pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ShellErrorKind::SpawnFailed {
            program: program.into(),
            reason: reason.into(),
        })
    }

    /// Creates a working directory error.
    #[must_use]
    pub fn working_directory(path: PathBuf, output: impl Into<String>) -> Self {
        Self::new(ShellErrorKind::WorkingDirectory {
            path,
            output: output.into(),
        })
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(duration: Duration) -> Self {
        Self::new(ShellErrorKind::Timeout { duration })
    }

    /// Creates an exited error.
    #[must_use]
    pub fn exited() -> Self {
        Self::new(ShellErrorKind::Exited)
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::new(ShellErrorKind::Io {
            reason: reason.into(),
        })
    }

    /// Creates a closed error.
    #[must_use]
    pub fn closed() -> Self {
        Self::new(ShellErrorKind::Closed)
    }

    /// Returns true if the command was rejected by validation.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, ShellErrorKind::Rejected(_))
    }

    /// Returns true if the command timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ShellErrorKind::Timeout { .. })
    }

    /// Returns true if the shell process went away.
    #[must_use]
    pub fn is_exited(&self) -> bool {
        matches!(self.kind, ShellErrorKind::Exited)
    }
}

impl From<CommandValidationError> for ShellError {
    fn from(error: CommandValidationError) -> Self {
        Self::new(ShellErrorKind::Rejected(error))
    }
}

impl From<std::io::Error> for ShellError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ShellErrorKind::Rejected(error) => write!(f, "command rejected: {error}"),
            ShellErrorKind::SpawnFailed { program, reason } => {
                write!(f, "failed to start shell '{program}': {reason}")
            }
            ShellErrorKind::WorkingDirectory { path, output } => {
                write!(
                    f,
                    "cannot enter working directory '{}': {}",
                    path.display(),
                    output
                )
            }
            ShellErrorKind::Timeout { duration } => {
                write!(
                    f,
                    "command timed out after {} seconds; reset the session to abort it",
                    duration.as_secs()
                )
            }
            ShellErrorKind::Exited => {
                write!(f, "shell exited unexpectedly; the next command starts a new shell")
            }
            ShellErrorKind::Io { reason } => write!(f, "shell I/O error: {reason}"),
            ShellErrorKind::Closed => {
                write!(f, "shell session is closed; reset it to start a new shell")
            }
        }
    }
}

impl std::error::Error for ShellError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::CommandValidator;

    #[test]
    fn rejected_wraps_validation_error() {
        let validation = CommandValidator::new().validate("a; b").unwrap_err();
        let error = ShellError::from(validation);
        assert!(error.is_rejected());
        assert!(error.to_string().contains("semicolon"));
    }

    #[test]
    fn timeout_display_mentions_reset() {
        let error = ShellError::timeout(Duration::from_secs(30));
        let message = error.to_string();
        assert!(error.is_timeout());
        assert!(message.contains("30 seconds"));
        assert!(message.contains("reset"));
    }

    #[test]
    fn io_conversion() {
        let error = ShellError::from(std::io::Error::other("broken pipe"));
        assert!(matches!(error.kind, ShellErrorKind::Io { .. }));
        assert!(error.to_string().contains("broken pipe"));
    }

    #[test]
    fn errors_are_clone_and_eq() {
        let error = ShellError::closed();
        assert_eq!(error.clone(), error);
        assert_ne!(error, ShellError::exited());
    }
}
