//! Text editor built-in tool.
//!
//! Exposes [`TextEditor`](crate::editor::TextEditor) as one tool with four
//! commands: `view`, `create`, `str_replace` and `insert`.

use crate::editor::{FileOperationError, FileOperationErrorKind, ViewRange};
use crate::tools::definition::parse_args;
use crate::tools::registry::ToolGroup;
use crate::tools::{
    ToolConfig, ToolContext, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

const TOOL_NAME: &str = "text_editor";

/// Text editor tool executor.
#[derive(Debug, Clone)]
pub struct TextEditorTool {
    context: Arc<ToolContext>,
}

/// Arguments for the text_editor tool.
#[derive(Debug, Deserialize)]
struct TextEditorArgs {
    /// One of view, create, str_replace, insert
    command: String,
    /// Absolute path to the file
    path: String,
    #[serde(default)]
    file_text: Option<String>,
    #[serde(default)]
    view_range: Option<Vec<i64>>,
    #[serde(default)]
    old_str: Option<String>,
    #[serde(default)]
    new_str: Option<String>,
    #[serde(default)]
    insert_line: Option<i64>,
}

impl TextEditorTool {
    /// Creates a text editor tool using the context's editor.
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
                description: "A text editor supporting view, create, str_replace and insert. \
                    `view` again when `str_replace` or `insert` fails. \
                    `create` also overwrites an existing file. \
                    `str_replace` without `new_str` deletes the text."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "enum": ["view", "create", "str_replace", "insert"],
                            "description": "The operation to perform"
                        },
                        "path": {
                            "type": "string",
                            "description": "Absolute path to the file inside the project; missing directories are created"
                        },
                        "file_text": {
                            "type": "string",
                            "description": "For `create`: the content to write"
                        },
                        "view_range": {
                            "type": "array",
                            "items": {"type": "integer"},
                            "minItems": 2,
                            "maxItems": 2,
                            "description": "For `view`: 1-indexed [start, end] lines; -1 as end reads to the end of the file"
                        },
                        "old_str": {
                            "type": "string",
                            "description": "For `str_replace`: the exact text to replace, including whitespace"
                        },
                        "new_str": {
                            "type": "string",
                            "description": "For `str_replace` and `insert`: the new text"
                        },
                        "insert_line": {
                            "type": "integer",
                            "minimum": 0,
                            "description": "For `insert`: the line after which to insert (0 for the beginning of the file)"
                        }
                    },
                    "required": ["command", "path"]
                }),
            },
            ToolGroup::Editor,
        )
    }
}

fn to_tool_error(error: FileOperationError) -> ToolError {
    match &error.kind {
        FileOperationErrorKind::InvalidPath(_) | FileOperationErrorKind::NotAbsolute { .. } => {
            ToolError::rejected(TOOL_NAME, error.to_string())
        }
        _ => ToolError::execution_failed(TOOL_NAME, error.to_string()),
    }
}

fn missing(argument: &str, command: &str) -> ToolError {
    ToolError::validation_failed(TOOL_NAME, format!("`{argument}` is required for `{command}`"))
}

impl ToolExecutorTrait for TextEditorTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let context = Arc::clone(&self.context);

        Box::pin(async move {
            let args: TextEditorArgs = parse_args(TOOL_NAME, args)?;
            let editor = context.editor();
            let path = Path::new(&args.path);

            match args.command.as_str() {
                "view" => {
                    let range = args
                        .view_range
                        .as_deref()
                        .map(ViewRange::from_slice)
                        .transpose()
                        .map_err(to_tool_error)?;
                    let content = editor.view(path, range).await.map_err(to_tool_error)?;
                    Ok(format!(
                        "Here's the result of running `cat -n` on {}:\n\n```\n{content}\n```",
                        path.display()
                    ))
                }
                "create" => {
                    let text = args.file_text.unwrap_or_default();
                    editor.create(path, &text).await.map_err(to_tool_error)?;
                    Ok(format!("File successfully created at {}.", path.display()))
                }
                "str_replace" => {
                    let old = args.old_str.ok_or_else(|| missing("old_str", "str_replace"))?;
                    let occurrences = editor
                        .str_replace(path, &old, args.new_str.as_deref())
                        .await
                        .map_err(to_tool_error)?;
                    Ok(format!(
                        "Successfully replaced {occurrences} occurrences in {}.",
                        path.display()
                    ))
                }
                "insert" => {
                    let line = args.insert_line.ok_or_else(|| missing("insert_line", "insert"))?;
                    let text = args.new_str.ok_or_else(|| missing("new_str", "insert"))?;
                    let after_line = usize::try_from(line).map_err(|_| {
                        ToolError::validation_failed(
                            TOOL_NAME,
                            format!("invalid insert_line: {line}; line numbers start at 0"),
                        )
                    })?;
                    editor
                        .insert(path, after_line, &text)
                        .await
                        .map_err(to_tool_error)?;
                    Ok(format!(
                        "Successfully inserted text at line {after_line} in {}.",
                        path.display()
                    ))
                }
                other => Err(ToolError::validation_failed(
                    TOOL_NAME,
                    format!("invalid command: {other}"),
                )),
            }
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        parse_args::<TextEditorArgs>(TOOL_NAME, args.clone()).map(|_| ())
    }
}
