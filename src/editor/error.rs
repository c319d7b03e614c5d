//! Text editor error types.

use crate::security::PathValidationError;
use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during a text editor operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperationError {
    /// The specific error that occurred
    pub kind: FileOperationErrorKind,
}

/// Specific file operation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperationErrorKind {
    /// Path failed security validation
    InvalidPath(PathValidationError),
    /// Path is relative
    NotAbsolute {
        /// The path that was given
        path: PathBuf,
        /// Absolute path the caller probably meant
        suggestion: PathBuf,
    },
    /// Path exists but is not a regular file
    NotAFile {
        /// The offending path
        path: PathBuf,
    },
    /// Path is a directory where a file was expected
    IsADirectory {
        /// The offending path
        path: PathBuf,
    },
    /// Search string does not occur in the file
    StringNotFound {
        /// The file that was searched
        path: PathBuf,
    },
    /// Search string is empty
    EmptySearchString,
    /// View range is malformed or out of bounds
    InvalidViewRange {
        /// Description of the problem
        reason: String,
    },
    /// Insert line is past the end of the file
    InvalidInsertLine {
        /// The requested line
        line: usize,
        /// Number of lines in the file
        line_count: usize,
    },
    /// Reading or writing the file failed
    Io {
        /// The file involved
        path: PathBuf,
        /// What was being done ("read", "write", ...)
        operation: String,
        /// Description of the failure
        reason: String,
    },
}

impl FileOperationError {
    /// Creates a new FileOperationError with the given kind.
    #[must_use]
    pub fn new(kind: FileOperationErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a not-absolute error with a suggested absolute path.
    #[must_use]
    pub fn not_absolute(path: impl Into<PathBuf>, suggestion: impl Into<PathBuf>) -> Self {
        Self::new(FileOperationErrorKind::NotAbsolute {
            path: path.into(),
            suggestion: suggestion.into(),
        })
    }

    /// Creates a not-a-file error.
    #[must_use]
    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileOperationErrorKind::NotAFile { path: path.into() })
    }

    /// Creates an is-a-directory error.
    #[must_use]
    pub fn is_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::new(FileOperationErrorKind::IsADirectory { path: path.into() })
    }

    /// Creates a string-not-found error.
    #[must_use]
    pub fn string_not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(FileOperationErrorKind::StringNotFound { path: path.into() })
    }

    /// Creates an empty-search-string error.
    #[must_use]
    pub fn empty_search_string() -> Self {
        Self::new(FileOperationErrorKind::EmptySearchString)
    }

    /// Creates an invalid view range error.
    #[must_use]
    pub fn invalid_view_range(reason: impl Into<String>) -> Self {
        Self::new(FileOperationErrorKind::InvalidViewRange {
            reason: reason.into(),
        })
    }

    /// Creates an invalid insert line error.
    #[must_use]
    pub fn invalid_insert_line(line: usize, line_count: usize) -> Self {
        Self::new(FileOperationErrorKind::InvalidInsertLine { line, line_count })
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(FileOperationErrorKind::Io {
            path: path.into(),
            operation: operation.into(),
            reason: reason.into(),
        })
    }

    /// Returns true if the path failed security validation.
    #[must_use]
    pub fn is_invalid_path(&self) -> bool {
        matches!(self.kind, FileOperationErrorKind::InvalidPath(_))
    }

    /// Returns true if the path escaped the project root.
    #[must_use]
    pub fn is_outside_root(&self) -> bool {
        matches!(&self.kind, FileOperationErrorKind::InvalidPath(e) if e.is_outside_root())
    }
}

impl From<PathValidationError> for FileOperationError {
    fn from(error: PathValidationError) -> Self {
        Self::new(FileOperationErrorKind::InvalidPath(error))
    }
}

impl fmt::Display for FileOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FileOperationErrorKind::InvalidPath(error) => write!(f, "{error}"),
            FileOperationErrorKind::NotAbsolute { path, suggestion } => {
                write!(
                    f,
                    "the path {} is not an absolute path, it should start with `/`; did you mean {}?",
                    path.display(),
                    suggestion.display()
                )
            }
            FileOperationErrorKind::NotAFile { path } => {
                write!(f, "path is not a file: {}", path.display())
            }
            FileOperationErrorKind::IsADirectory { path } => {
                write!(
                    f,
                    "the path {} is a directory; provide a file path",
                    path.display()
                )
            }
            FileOperationErrorKind::StringNotFound { path } => {
                write!(
                    f,
                    "string not found in file: {}; view the file and copy the exact text",
                    path.display()
                )
            }
            FileOperationErrorKind::EmptySearchString => {
                write!(f, "old_str must not be empty")
            }
            FileOperationErrorKind::InvalidViewRange { reason } => {
                write!(f, "invalid `view_range`: {reason}")
            }
            FileOperationErrorKind::InvalidInsertLine { line, line_count } => {
                write!(
                    f,
                    "invalid insert_line: {line}; line number cannot be greater than the number of lines in the file ({line_count})"
                )
            }
            FileOperationErrorKind::Io {
                path,
                operation,
                reason,
            } => {
                write!(f, "failed to {operation} {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for FileOperationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_absolute_suggests_path() {
        let error = FileOperationError::not_absolute("src/lib.rs", "/project/src/lib.rs");
        let message = error.to_string();
        assert!(message.contains("not an absolute path"));
        assert!(message.contains("did you mean /project/src/lib.rs?"));
    }

    #[test]
    fn outside_root_is_detected_through_wrapper() {
        let error = FileOperationError::from(PathValidationError::OutsideRoot {
            path: PathBuf::from("/etc/passwd"),
            project_root: PathBuf::from("/project"),
        });
        assert!(error.is_invalid_path());
        assert!(error.is_outside_root());
        assert!(error.to_string().contains("outside project root"));
    }

    #[test]
    fn insert_line_display() {
        let error = FileOperationError::invalid_insert_line(5, 3);
        assert!(error.to_string().contains("invalid insert_line: 5"));
        assert!(error.to_string().contains("(3)"));
    }

    #[test]
    fn io_display_names_operation() {
        let error = FileOperationError::io("/project/a.txt", "read", "permission denied");
        assert_eq!(
            error.to_string(),
            "failed to read /project/a.txt: permission denied"
        );
    }
}
