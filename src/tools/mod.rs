//! Tool layer: the boundary between a calling agent and the host.
//!
//! - **Tool Box**: Name-indexed registry of enabled tools
//! - **Tool Context**: Validators, editor and the keep-alive shell shared by
//!   all tools
//! - **Built-ins**: `bash`, `text_editor`, `grep`, `ls`
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                        ToolBox                               |
//! |                                                              |
//! |  call(name, args) --> executor.execute(args) --> String     |
//! |                       (own task; errors -> "Error: ...")    |
//! +-------------------------------------------------------------+
//!                            |
//!                            | Arc<ToolContext>
//!                            v
//! +-------------------------------------------------------------+
//! |                      ToolContext                             |
//! |                                                              |
//! |  PathValidator   TextEditor   Mutex<PersistentShellSession> |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hostguard::tools::{ToolBox, ToolContext};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let context = Arc::new(ToolContext::for_root("/home/user/project")?);
//! let tools = ToolBox::all(Arc::clone(&context));
//!
//! let output = tools.call("bash", json!({"command": "cargo --version"})).await;
//! println!("{output}");
//!
//! context.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod builtins;
mod context;
mod definition;
mod error;
mod registry;

pub use context::ToolContext;
pub use definition::{
    BoxedToolExecutor, ToolConfig, ToolDefinition, ToolExecutionFuture, ToolExecutorTrait,
};
pub use error::{ToolError, ToolErrorKind};
pub use registry::{ToolBox, ToolGroup};
