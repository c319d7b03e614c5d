//! Bash command execution built-in tool.
//!
//! Runs commands in the shared keep-alive shell, so `cd` and exported
//! variables carry over between calls.

use crate::shell::{ShellError, ShellErrorKind};
use crate::tools::definition::parse_args;
use crate::tools::registry::ToolGroup;
use crate::tools::{
    ToolConfig, ToolContext, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const TOOL_NAME: &str = "bash";

/// Bash command execution tool executor.
#[derive(Debug, Clone)]
pub struct BashTool {
    context: Arc<ToolContext>,
}

/// Arguments for the bash tool.
#[derive(Debug, Deserialize)]
struct BashArgs {
    /// Command to execute
    command: String,
    /// Restart the shell in the project root before running
    #[serde(default)]
    reset_cwd: Option<bool>,
}

impl BashTool {
    /// Creates a bash tool bound to the context's shell session.
    #[must_use]
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config() -> ToolConfig {
        ToolConfig::new(
            ToolDefinition {
                name: TOOL_NAME.to_string(),
                description: "Execute a bash command in a keep-alive shell and return its output. \
                    The working directory and environment persist between calls. \
                    Command chaining (;, &&, ||), background jobs and command substitution are refused; \
                    run one command per call."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "The command to execute"
                        },
                        "reset_cwd": {
                            "type": "boolean",
                            "description": "Restart the shell in the project root directory before running the command"
                        }
                    },
                    "required": ["command"]
                }),
            },
            ToolGroup::Terminal,
        )
    }
}

/// Truncates output to `max_bytes`, preferring a line boundary.
fn truncate_output(output: &str, max_bytes: usize) -> (String, bool) {
    if output.len() <= max_bytes {
        return (output.to_string(), false);
    }

    let mut cut = max_bytes;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    let cut = output[..cut].rfind('\n').unwrap_or(cut);
    (
        format!(
            "{}\n\n... (output truncated, {} bytes total)",
            &output[..cut],
            output.len()
        ),
        true,
    )
}

fn to_tool_error(error: ShellError) -> ToolError {
    match &error.kind {
        ShellErrorKind::Rejected(rejection) => ToolError::rejected(TOOL_NAME, rejection.to_string()),
        ShellErrorKind::Timeout { duration } => ToolError::timeout(TOOL_NAME, *duration),
        _ => ToolError::execution_failed(TOOL_NAME, error.to_string()),
    }
}

impl ToolExecutorTrait for BashTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let context = Arc::clone(&self.context);

        Box::pin(async move {
            let args: BashArgs = parse_args(TOOL_NAME, args)?;
            let max_bytes = context.shell_config().max_output_bytes;

            let mut shell = context.shell().lock().await;
            if args.reset_cwd.unwrap_or(false) {
                info!("resetting shell to project root");
                shell.reset().await.map_err(to_tool_error)?;
            }

            let result = shell.execute(&args.command).await.map_err(to_tool_error)?;
            drop(shell);

            let (output, _) = truncate_output(&result.output, max_bytes);
            let mut text = format!("```\n{output}\n```");
            if let Some(code) = result.exit_code.filter(|code| *code != 0) {
                text.push_str(&format!("\nexit code: {code}"));
            }
            Ok(text)
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        parse_args::<BashArgs>(TOOL_NAME, args.clone()).map(|_| ())
    }
}
