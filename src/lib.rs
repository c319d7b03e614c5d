//! # hostguard: guarded host access for coding agents
//!
//! The security layer between an AI coding agent and the machine it works
//! on. Every filesystem and shell operation the agent requests passes a
//! validator first.
//!
//! ## Architecture
//!
//! - **Security**: [`PathValidator`](security::PathValidator) confines paths
//!   to one project root; [`CommandValidator`](security::CommandValidator)
//!   screens shell commands for chaining, substitution and dangerous
//!   redirection
//! - **Shell**: [`PersistentShellSession`](shell::PersistentShellSession)
//!   keeps one shell alive so working directory and environment persist
//! - **Editor**: [`TextEditor`](editor::TextEditor) views and edits files
//!   inside the root
//! - **Tools**: [`ToolBox`](tools::ToolBox) exposes all of it as named tools
//!   taking JSON arguments and returning text
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostguard::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = Arc::new(ToolContext::for_root("/home/user/project")?);
//!     let tools = ToolBox::all(Arc::clone(&context));
//!
//!     let listing = tools.call("ls", json!({"path": "/home/user/project"})).await;
//!     println!("{listing}");
//!
//!     // Refused before it reaches the shell.
//!     let refused = tools.call("bash", json!({"command": "make && rm -rf /"})).await;
//!     assert!(refused.starts_with("Error:"));
//!
//!     context.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod security;
pub mod shell;
pub mod tools;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{HostGuardConfig, ShellConfig};
    pub use crate::editor::{FileOperationError, TextEditor, ViewRange};
    pub use crate::error::HostGuardError;
    pub use crate::logging::{init_logging, LogLevel, LoggingConfig};
    pub use crate::security::{
        CommandCategory, CommandValidationError, CommandValidator, PathValidationError,
        PathValidator,
    };
    pub use crate::shell::{CommandOutput, PersistentShellSession, ShellError};
    pub use crate::tools::{ToolBox, ToolContext, ToolDefinition, ToolError, ToolGroup};
}
