//! Built-in tools.
//!
//! ## Available Tools
//!
//! ### Filesystem Tools
//! - **grep**: Search file contents with regex
//! - **ls**: List directory contents with metadata
//! - **tree**: Show the directory structure
//!
//! ### Editor Tools
//! - **text_editor**: View, create, replace in and insert into files
//!
//! ### Terminal Tools
//! - **bash**: Run commands in the shared keep-alive shell
//!
//! Every tool is bound to a [`ToolContext`](crate::tools::ToolContext) and
//! goes through its validators before touching the host.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hostguard::tools::{ToolBox, ToolContext, ToolGroup};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let context = Arc::new(ToolContext::for_root("/home/user/project")?);
//! let tools = ToolBox::for_groups(context, &[ToolGroup::Filesystem]);
//! let listing = tools.call("ls", serde_json::json!({"path": "/home/user/project"})).await;
//! println!("{listing}");
//! # Ok(())
//! # }
//! ```

mod bash;
mod grep;
mod list_directory;
mod text_editor;
mod tree;

pub use bash::BashTool;
pub use grep::GrepTool;
pub use list_directory::ListDirectoryTool;
pub use text_editor::TextEditorTool;
pub use tree::TreeTool;
