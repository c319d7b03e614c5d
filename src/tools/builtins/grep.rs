//! Grep content search built-in tool.
//!
//! Searches file contents with regex support, confined to the project root.
//! Output follows ripgrep conventions: `path` per matching file, `path:count`
//! in count mode, and `path:line:text` / `path-line-text` in content mode.

use crate::security::PathValidationError;
use crate::tools::definition::parse_args;
use crate::tools::registry::ToolGroup;
use crate::tools::{
    ToolConfig, ToolContext, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait,
};
use glob::Pattern;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

const TOOL_NAME: &str = "grep";

/// Maximum file size to search (10MB).
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of context lines around a match.
const MAX_CONTEXT: usize = 10;

/// Directories never descended into.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    "dist",
    "build",
    "venv",
    "vendor",
];

/// Grep content search tool executor.
#[derive(Debug, Clone)]
pub struct GrepTool {
    context: Arc<ToolContext>,
}

/// What the search reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OutputMode {
    #[default]
    FilesWithMatches,
    Content,
    Count,
}

/// Arguments for the grep tool.
#[derive(Debug, Deserialize)]
struct GrepArgs {
    /// Regex pattern to search for
    pattern: String,
    /// File or directory to search in (default: project root)
    #[serde(default)]
    path: Option<String>,
    /// File glob pattern to filter files (e.g., "*.rs")
    #[serde(default)]
    glob: Option<String>,
    #[serde(default)]
    output_mode: OutputMode,
    /// Context lines before and after each match, content mode only
    #[serde(default)]
    context: Option<usize>,
    #[serde(default)]
    ignore_case: Option<bool>,
    /// Keep only the first N output lines
    #[serde(default)]
    head_limit: Option<usize>,
}

impl GrepArgs {
    fn regex(&self) -> Result<Regex, ToolError> {
        if self.pattern.trim().is_empty() {
            return Err(ToolError::validation_failed(TOOL_NAME, "pattern cannot be empty"));
        }
        RegexBuilder::new(&self.pattern)
            .case_insensitive(self.ignore_case.unwrap_or(false))
            .build()
            .map_err(|e| ToolError::validation_failed(TOOL_NAME, format!("invalid regex pattern: {e}")))
    }

    fn globs(&self) -> Result<Vec<Pattern>, ToolError> {
        let Some(glob) = self.glob.as_deref() else {
            return Ok(Vec::new());
        };
        expand_braces(glob)
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| {
                    ToolError::validation_failed(TOOL_NAME, format!("invalid glob '{glob}': {e}"))
                })
            })
            .collect()
    }
}

impl GrepTool {
    /// Creates a grep tool confined to the context's project root.
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
                description: "Search file contents with a regular expression. \
                    Use this instead of running grep or rg through bash. \
                    Hidden files and build directories are skipped."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "pattern": {
                            "type": "string",
                            "description": "Regex pattern to search for"
                        },
                        "path": {
                            "type": "string",
                            "description": "Absolute file or directory inside the project to search (default: project root)"
                        },
                        "glob": {
                            "type": "string",
                            "description": "File pattern to filter files (e.g., '*.rs', '*.{ts,tsx}')"
                        },
                        "output_mode": {
                            "type": "string",
                            "enum": ["files_with_matches", "content", "count"],
                            "description": "files_with_matches lists paths (default), content shows matching lines, count shows matches per file"
                        },
                        "context": {
                            "type": "integer",
                            "description": "Lines of context before and after each match (content mode only)",
                            "minimum": 0,
                            "maximum": MAX_CONTEXT
                        },
                        "ignore_case": {
                            "type": "boolean",
                            "description": "Case insensitive search (default: false)"
                        },
                        "head_limit": {
                            "type": "integer",
                            "description": "Limit output to the first N lines",
                            "minimum": 1
                        }
                    },
                    "required": ["pattern"]
                }),
            },
            ToolGroup::Filesystem,
        )
    }
}

impl ToolExecutorTrait for GrepTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let context = Arc::clone(&self.context);

        Box::pin(async move {
            let args: GrepArgs = parse_args(TOOL_NAME, args)?;
            let regex = args.regex()?;
            let globs = args.globs()?;

            let search_path = match args.path.as_deref() {
                Some(raw) => {
                    let joined = context.project_root().join(raw);
                    context
                        .validator()
                        .validate_str(&joined.to_string_lossy(), false)
                        .map_err(path_error)?
                }
                None => context.project_root().to_path_buf(),
            };

            let search = Search {
                regex,
                globs,
                mode: args.output_mode,
                context: args.context.unwrap_or(0).min(MAX_CONTEXT),
            };
            let root = search_path.clone();
            let mut lines = tokio::task::spawn_blocking(move || search.run(&root))
                .await
                .map_err(|e| ToolError::internal(format!("grep task failed: {e}")))?;

            if let Some(limit) = args.head_limit {
                lines.truncate(limit);
            }

            if lines.is_empty() {
                return Ok("No matches found.".to_string());
            }
            Ok(format!(
                "Here's the result in {}:\n\n```\n{}\n```",
                search_path.display(),
                lines.join("\n")
            ))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: GrepArgs = parse_args(TOOL_NAME, args.clone())?;
        args.regex()?;
        args.globs()?;
        Ok(())
    }
}

fn path_error(error: PathValidationError) -> ToolError {
    if error.is_not_found() {
        ToolError::execution_failed(TOOL_NAME, error.to_string())
    } else {
        ToolError::rejected(TOOL_NAME, error.to_string())
    }
}

/// Expands one level of `{a,b}` alternatives, e.g. `*.{ts,tsx}`.
fn expand_braces(glob: &str) -> Vec<String> {
    let (Some(open), Some(close)) = (glob.find('{'), glob.find('}')) else {
        return vec![glob.to_string()];
    };
    if close < open {
        return vec![glob.to_string()];
    }

    let (prefix, suffix) = (&glob[..open], &glob[close + 1..]);
    glob[open + 1..close]
        .split(',')
        .map(|alternative| format!("{prefix}{alternative}{suffix}"))
        .collect()
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && IGNORED_DIRS.contains(&name.as_ref()))
}

fn is_binary(content: &[u8]) -> bool {
    content[..content.len().min(8192)].contains(&0)
}

struct Search {
    regex: Regex,
    globs: Vec<Pattern>,
    mode: OutputMode,
    context: usize,
}

impl Search {
    fn run(&self, root: &Path) -> Vec<String> {
        let mut lines = Vec::new();

        let files = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry))
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file());

        for entry in files {
            if !self.matches_glob(root, entry.path()) {
                continue;
            }
            if entry.metadata().map(|m| m.len() > MAX_FILE_SIZE).unwrap_or(true) {
                continue;
            }
            let Ok(bytes) = std::fs::read(entry.path()) else {
                continue;
            };
            if is_binary(&bytes) {
                continue;
            }
            let content = String::from_utf8_lossy(&bytes);
            self.search_file(entry.path(), &content, &mut lines);
        }

        lines
    }

    fn matches_glob(&self, root: &Path, path: &Path) -> bool {
        if self.globs.is_empty() {
            return true;
        }
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.globs
            .iter()
            .any(|glob| glob.matches(&name) || glob.matches_path(relative))
    }

    fn search_file(&self, path: &Path, content: &str, out: &mut Vec<String>) {
        let file_lines: Vec<&str> = content.lines().collect();
        let hits: Vec<usize> = file_lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.regex.is_match(line))
            .map(|(index, _)| index)
            .collect();
        if hits.is_empty() {
            return;
        }

        let display = path.display();
        match self.mode {
            OutputMode::FilesWithMatches => out.push(display.to_string()),
            OutputMode::Count => out.push(format!("{display}:{}", hits.len())),
            OutputMode::Content => {
                let hit_set: BTreeSet<usize> = hits.iter().copied().collect();
                let mut shown: BTreeSet<usize> = BTreeSet::new();
                for &hit in &hits {
                    let start = hit.saturating_sub(self.context);
                    let end = (hit + self.context).min(file_lines.len() - 1);
                    shown.extend(start..=end);
                }

                let mut previous: Option<usize> = None;
                for index in shown {
                    if previous.is_some_and(|p| index > p + 1) {
                        out.push("--".to_string());
                    }
                    let separator = if hit_set.contains(&index) { ':' } else { '-' };
                    out.push(format!(
                        "{display}{separator}{}{separator}{}",
                        index + 1,
                        file_lines[index]
                    ));
                    previous = Some(index);
                }
            }
        }
    }
}
