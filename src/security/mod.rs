//! Security validation for side-effecting tools.
//!
//! This module provides the two validators that stand between an agent and
//! the host machine:
//!
//! - **Path Validation**: Confines filesystem access to one project root
//! - **Command Validation**: Screens shell commands for injection patterns
//!
//! ## Path Validation
//!
//! The [`PathValidator`] canonicalizes a path before checking containment, so
//! neither `..` segments nor symlinks can carry an operation outside the root:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use hostguard::security::PathValidator;
//!
//! let validator = PathValidator::new("/home/user/project").unwrap();
//!
//! match validator.validate(Path::new("/home/user/project/src/main.rs"), false) {
//!     Ok(canonical) => println!("Validated: {}", canonical.display()),
//!     Err(e) => eprintln!("Rejected: {}", e),
//! }
//! ```
//!
//! ## Command Validation
//!
//! The [`CommandValidator`] rejects chaining (`;`, `&&`, `||`, line breaks),
//! trailing `&`, `$()` and backtick substitution, and redirection into
//! `/etc/` or `/dev/` (other than `/dev/null`). Pipes and redirection are
//! allowed unless disabled.

mod command;
mod path;

pub use command::{CommandCategory, CommandValidationError, CommandValidator};
pub use path::{PathValidationError, PathValidator};
