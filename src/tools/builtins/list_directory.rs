//! List directory built-in tool.
//!
//! Lists directory contents with type, size and modification time.

use crate::tools::definition::parse_args;
use crate::tools::registry::ToolGroup;
use crate::tools::{
    ToolConfig, ToolContext, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait,
};
use glob::Pattern;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const TOOL_NAME: &str = "ls";

/// List directory tool executor.
#[derive(Debug, Clone)]
pub struct ListDirectoryTool {
    context: Arc<ToolContext>,
}

/// Arguments for the ls tool.
#[derive(Debug, Deserialize)]
struct ListDirectoryArgs {
    /// Absolute directory path to list
    path: String,
    /// Glob patterns of entry names to leave out
    #[serde(default)]
    ignore: Vec<String>,
}

/// Information about a directory entry.
#[derive(Debug)]
struct DirEntry {
    name: String,
    entry_type: &'static str,
    /// Size in bytes (files only)
    size: Option<u64>,
    modified: Option<String>,
}

impl DirEntry {
    fn render(&self) -> String {
        let name = if self.entry_type == "dir" {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        };
        let size = self.size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        let modified = self.modified.as_deref().unwrap_or("-");
        format!("{:<7} {size:>10}  {modified}  {name}", self.entry_type)
    }
}

impl ListDirectoryTool {
    /// Creates an ls tool confined to the context's project root.
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
                description: "List directory contents with metadata (type, size, modified time)."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Absolute path of a directory inside the project"
                        },
                        "ignore": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "Glob patterns of names to leave out (e.g. ['*.log', 'node_modules'])"
                        }
                    },
                    "required": ["path"]
                }),
            },
            ToolGroup::Filesystem,
        )
    }

    /// Formats a system time as ISO 8601.
    fn format_time(time: std::time::SystemTime) -> String {
        let datetime = chrono::DateTime::<chrono::Utc>::from(time);
        datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

fn ignore_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ToolError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| {
                ToolError::validation_failed(TOOL_NAME, format!("invalid ignore pattern '{pattern}': {e}"))
            })
        })
        .collect()
}

impl ToolExecutorTrait for ListDirectoryTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let context = Arc::clone(&self.context);

        Box::pin(async move {
            let args: ListDirectoryArgs = parse_args(TOOL_NAME, args)?;
            let ignore = ignore_patterns(&args.ignore)?;

            let path = context.validator().validate_str(&args.path, false).map_err(|e| {
                if e.is_not_found() {
                    ToolError::execution_failed(TOOL_NAME, e.to_string())
                } else {
                    ToolError::rejected(TOOL_NAME, e.to_string())
                }
            })?;

            if !path.is_dir() {
                return Err(ToolError::execution_failed(
                    TOOL_NAME,
                    format!("path is not a directory: {}", path.display()),
                ));
            }

            let mut read_dir = tokio::fs::read_dir(&path).await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to read directory: {e}"))
            })?;

            let mut entries = Vec::new();
            while let Some(entry) = read_dir.next_entry().await.map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to read entry: {e}"))
            })? {
                let name = entry.file_name().to_string_lossy().to_string();
                if ignore.iter().any(|pattern| pattern.matches(&name)) {
                    continue;
                }

                // Symlinks are described, never followed.
                let metadata = tokio::fs::symlink_metadata(entry.path()).await.ok();
                let entry_type = match metadata.as_ref().map(std::fs::Metadata::file_type) {
                    Some(ft) if ft.is_symlink() => "symlink",
                    Some(ft) if ft.is_dir() => "dir",
                    _ => "file",
                };
                let size = metadata.as_ref().filter(|m| m.is_file()).map(std::fs::Metadata::len);
                let modified = metadata
                    .as_ref()
                    .and_then(|m| m.modified().ok())
                    .map(Self::format_time);

                entries.push(DirEntry {
                    name,
                    entry_type,
                    size,
                    modified,
                });
            }

            if entries.is_empty() {
                return Ok(format!("The directory {} is empty.", path.display()));
            }

            entries.sort_by(|a, b| a.name.cmp(&b.name));
            let listing: Vec<String> = entries.iter().map(DirEntry::render).collect();
            Ok(format!(
                "Here's the result in {}:\n\n```\n{}\n```",
                path.display(),
                listing.join("\n")
            ))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: ListDirectoryArgs = parse_args(TOOL_NAME, args.clone())?;
        if args.path.is_empty() {
            return Err(ToolError::validation_failed(TOOL_NAME, "path cannot be empty"));
        }
        ignore_patterns(&args.ignore).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ListDirectoryTool, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let tool = ListDirectoryTool::new(Arc::new(ToolContext::for_root(&root).unwrap()));
        (dir, tool, root)
    }

    #[tokio::test]
    async fn list_directory_basic() {
        let (_dir, tool, root) = setup();
        fs::write(root.join("file1.txt"), "content1").unwrap();
        fs::write(root.join("file2.txt"), "content2").unwrap();
        fs::create_dir(root.join("subdir")).unwrap();

        let result = tool.execute(json!({"path": root})).await.unwrap();

        assert!(result.starts_with(&format!("Here's the result in {}:", root.display())));
        let lines: Vec<&str> = result.lines().filter(|l| l.starts_with("file") || l.starts_with("dir")).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("file") && lines[0].contains(" 8 ") && lines[0].ends_with("file1.txt"));
        assert!(lines[1].ends_with("file2.txt"));
        assert!(lines[2].starts_with("dir") && lines[2].ends_with("subdir/"));
    }

    #[tokio::test]
    async fn list_directory_ignore_patterns() {
        let (_dir, tool, root) = setup();
        fs::write(root.join("keep.rs"), "").unwrap();
        fs::write(root.join("drop.log"), "").unwrap();
        fs::create_dir(root.join("node_modules")).unwrap();

        let result = tool
            .execute(json!({"path": root, "ignore": ["*.log", "node_modules"]}))
            .await
            .unwrap();
        assert!(result.contains("keep.rs"));
        assert!(!result.contains("drop.log"));
        assert!(!result.contains("node_modules"));
    }

    #[tokio::test]
    async fn list_directory_empty() {
        let (_dir, tool, root) = setup();
        let result = tool.execute(json!({"path": root})).await.unwrap();
        assert_eq!(result, format!("The directory {} is empty.", root.display()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn list_directory_reports_symlinks() {
        let (_dir, tool, root) = setup();
        std::os::unix::fs::symlink("/etc", root.join("escape")).unwrap();

        let result = tool.execute(json!({"path": root})).await.unwrap();
        assert!(result.lines().any(|l| l.starts_with("symlink") && l.ends_with("escape")));

        let error = tool
            .execute(json!({"path": root.join("escape")}))
            .await
            .unwrap_err();
        assert!(error.is_rejected());
    }

    #[tokio::test]
    async fn list_directory_outside_root_rejected() {
        let (_dir, tool, root) = setup();
        let error = tool
            .execute(json!({"path": root.join("..")}))
            .await
            .unwrap_err();
        assert!(error.is_rejected());

        let error = tool.execute(json!({"path": "relative"})).await.unwrap_err();
        assert!(error.is_rejected());
        assert!(error.to_string().contains("absolute"));
    }

    #[tokio::test]
    async fn list_directory_not_a_directory() {
        let (_dir, tool, root) = setup();
        fs::write(root.join("file.txt"), "x").unwrap();

        let error = tool
            .execute(json!({"path": root.join("file.txt")}))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("not a directory"));

        let error = tool
            .execute(json!({"path": root.join("missing")}))
            .await
            .unwrap_err();
        assert!(!error.is_rejected());
    }

    #[test]
    fn validate_args_checks_path_and_patterns() {
        let (_dir, tool, _root) = setup();
        assert!(tool.validate_args(&json!({"path": ""})).is_err());
        assert!(tool.validate_args(&json!({"path": "/x", "ignore": ["[z-a"]})).is_err());
        assert!(tool.validate_args(&json!({"path": "/x"})).is_ok());
    }

    #[test]
    fn config_has_correct_schema() {
        let config = ListDirectoryTool::config();
        assert_eq!(config.definition.name, "ls");
        assert_eq!(config.group, ToolGroup::Filesystem);
        assert!(config.definition.input_schema["properties"]["ignore"].is_object());
    }
}
