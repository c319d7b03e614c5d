//! Path-confined text editing.
//!
//! [`TextEditor`] offers `view`, `create`, `str_replace` and `insert` on files
//! inside the project root. Paths go through the
//! [`PathValidator`](crate::security::PathValidator) before any I/O; only
//! `create` accepts a path that does not exist yet.

mod error;
mod text_editor;

pub use error::{FileOperationError, FileOperationErrorKind};
pub use text_editor::{TextEditor, ViewRange};
