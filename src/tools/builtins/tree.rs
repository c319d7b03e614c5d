//! Directory tree built-in tool.
//!
//! Renders the layout of a directory as an indented tree.

use crate::tools::definition::parse_args;
use crate::tools::registry::ToolGroup;
use crate::tools::{
    ToolConfig, ToolContext, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait,
};
use glob::Pattern;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

const TOOL_NAME: &str = "tree";

/// Depth used when the caller does not give one.
const DEFAULT_MAX_DEPTH: usize = 3;

/// Entries rendered before the listing is cut off.
const MAX_ENTRIES: usize = 1000;

/// Names left out of every tree.
const DEFAULT_IGNORE: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".DS_Store",
    "node_modules",
    "target",
    "__pycache__",
    "*.pyc",
    ".venv",
    "venv",
    "dist",
    "build",
    ".idea",
    ".vscode",
];

/// Tree tool executor.
#[derive(Debug, Clone)]
pub struct TreeTool {
    context: Arc<ToolContext>,
}

/// Arguments for the tree tool.
#[derive(Debug, Deserialize)]
struct TreeArgs {
    /// Directory to render (default: project root)
    path: Option<String>,
    /// Levels below `path` to descend
    max_depth: Option<usize>,
    /// Extra glob patterns of names to leave out
    #[serde(default)]
    ignore: Vec<String>,
}

/// One rendered entry, in walk order.
#[derive(Debug)]
struct Node {
    depth: usize,
    name: String,
    kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Dir,
    File,
    Symlink,
}

impl Node {
    fn label(&self) -> String {
        match self.kind {
            NodeKind::Dir => format!("{}/", self.name),
            NodeKind::Symlink => format!("{}@", self.name),
            NodeKind::File => self.name.clone(),
        }
    }
}

impl TreeTool {
    /// Creates a tree tool confined to the context's project root.
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
                description: "Show the directory structure as a tree. Version control, \
                              dependency and build directories are left out."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Directory to show, absolute or relative to the project root (default: project root)"
                        },
                        "max_depth": {
                            "type": "integer",
                            "minimum": 1,
                            "description": "Levels to descend (default: 3)"
                        },
                        "ignore": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "Extra glob patterns of names to leave out (e.g. ['*.log', 'fixtures'])"
                        }
                    },
                    "required": []
                }),
            },
            ToolGroup::Filesystem,
        )
    }
}

/// Compiles ignore patterns. A trailing `/**` or `/` is dropped so that
/// `.git/**` and `dist/` match the directory name itself.
fn ignore_patterns(extra: &[String]) -> Result<Vec<Pattern>, ToolError> {
    DEFAULT_IGNORE
        .iter()
        .copied()
        .chain(extra.iter().map(String::as_str))
        .map(|raw| {
            let trimmed = raw.trim_end_matches("/**").trim_end_matches('/');
            Pattern::new(trimmed).map_err(|e| {
                ToolError::validation_failed(TOOL_NAME, format!("invalid ignore pattern '{raw}': {e}"))
            })
        })
        .collect()
}

fn should_ignore(name: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches(name))
}

/// Walks `root` without following symlinks. Unreadable entries are skipped.
fn collect_nodes(root: &Path, max_depth: usize, patterns: &[Pattern]) -> Vec<Node> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by(|a, b| {
            b.file_type()
                .is_dir()
                .cmp(&a.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !should_ignore(&entry.file_name().to_string_lossy(), patterns)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .map(|entry| {
            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                NodeKind::Symlink
            } else if file_type.is_dir() {
                NodeKind::Dir
            } else {
                NodeKind::File
            };
            Node {
                depth: entry.depth(),
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            }
        })
        .collect()
}

/// For each node, whether it is the last child of its parent.
fn last_sibling_flags(nodes: &[Node]) -> Vec<bool> {
    let mut flags = vec![false; nodes.len()];
    // seen[d] is set once a later sibling at depth d + 1 has been visited.
    let mut seen: Vec<bool> = Vec::new();
    for (i, node) in nodes.iter().enumerate().rev() {
        let level = node.depth - 1;
        seen.truncate(level + 1);
        seen.resize(level + 1, false);
        flags[i] = !seen[level];
        seen[level] = true;
    }
    flags
}

fn render(root: &Path, nodes: &[Node]) -> String {
    let last = last_sibling_flags(nodes);
    let mut lines = vec![format!("{}/", root.display())];
    // open[d] is true while the ancestor at depth d + 1 has siblings below.
    let mut open: Vec<bool> = Vec::new();

    for (node, is_last) in nodes.iter().zip(last).take(MAX_ENTRIES) {
        open.truncate(node.depth - 1);
        let mut line: String = open
            .iter()
            .map(|&more| if more { "│   " } else { "    " })
            .collect();
        line.push_str(if is_last { "└── " } else { "├── " });
        line.push_str(&node.label());
        lines.push(line);
        open.push(!is_last);
    }

    if nodes.len() > MAX_ENTRIES {
        lines.push(format!(
            "... ({} more entries not shown; narrow `path` or lower `max_depth`)",
            nodes.len() - MAX_ENTRIES
        ));
    }
    lines.join("\n")
}

impl ToolExecutorTrait for TreeTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let context = Arc::clone(&self.context);

        Box::pin(async move {
            let args: TreeArgs = parse_args(TOOL_NAME, args)?;
            let patterns = ignore_patterns(&args.ignore)?;
            let max_depth = args.max_depth.unwrap_or(DEFAULT_MAX_DEPTH).max(1);

            let root = match args.path.as_deref() {
                Some(raw) => {
                    let joined = context.project_root().join(raw);
                    context
                        .validator()
                        .validate_str(&joined.to_string_lossy(), false)
                        .map_err(|e| {
                            if e.is_not_found() {
                                ToolError::execution_failed(TOOL_NAME, e.to_string())
                            } else {
                                ToolError::rejected(TOOL_NAME, e.to_string())
                            }
                        })?
                }
                None => context.project_root().to_path_buf(),
            };

            if !root.is_dir() {
                return Err(ToolError::execution_failed(
                    TOOL_NAME,
                    format!("path is not a directory: {}", root.display()),
                ));
            }

            let walk_root = root.clone();
            let nodes =
                tokio::task::spawn_blocking(move || collect_nodes(&walk_root, max_depth, &patterns))
                    .await
                    .map_err(|e| ToolError::internal(format!("tree task failed: {e}")))?;

            if nodes.is_empty() {
                return Ok(format!("The directory {} is empty.", root.display()));
            }

            Ok(format!(
                "Here's the result in {}:\n\n```\n{}\n```",
                root.display(),
                render(&root, &nodes)
            ))
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: TreeArgs = parse_args(TOOL_NAME, args.clone())?;
        if args.max_depth == Some(0) {
            return Err(ToolError::validation_failed(
                TOOL_NAME,
                "max_depth must be 1 or greater",
            ));
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

    fn setup() -> (TempDir, TreeTool, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let tool = TreeTool::new(Arc::new(ToolContext::for_root(&root).unwrap()));
        (dir, tool, root)
    }

    #[tokio::test]
    async fn tree_renders_nested_layout() {
        let (_dir, tool, root) = setup();
        fs::write(root.join("file.txt"), "content").unwrap();
        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(root.join("subdir/nested.txt"), "nested").unwrap();

        let result = tool.execute(json!({})).await.unwrap();

        let expected = format!(
            "Here's the result in {root}:\n\n```\n{root}/\n├── subdir/\n│   └── nested.txt\n└── file.txt\n```",
            root = root.display()
        );
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn tree_respects_max_depth() {
        let (_dir, tool, root) = setup();
        fs::create_dir_all(root.join("level1/level2/level3")).unwrap();
        fs::write(root.join("level1/level2/level3/deep.txt"), "deep").unwrap();

        let shallow = tool.execute(json!({"max_depth": 1})).await.unwrap();
        assert!(shallow.contains("level1/"));
        assert!(!shallow.contains("level2"));
        assert!(!shallow.contains("deep.txt"));

        let full = tool.execute(json!({"max_depth": 4})).await.unwrap();
        assert!(full.contains("        └── deep.txt"));
    }

    #[tokio::test]
    async fn tree_applies_ignore_patterns() {
        let (_dir, tool, root) = setup();
        fs::write(root.join("important.py"), "code").unwrap();
        fs::write(root.join("notes.log"), "log").unwrap();
        fs::create_dir(root.join("fixtures")).unwrap();
        fs::write(root.join("fixtures/data.json"), "{}").unwrap();

        let result = tool
            .execute(json!({"ignore": ["*.log", "fixtures/**"]}))
            .await
            .unwrap();
        assert!(result.contains("important.py"));
        assert!(!result.contains("notes.log"));
        assert!(!result.contains("fixtures"));
        assert!(!result.contains("data.json"));
    }

    #[tokio::test]
    async fn tree_skips_default_ignored_names() {
        let (_dir, tool, root) = setup();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir(root.join("__pycache__")).unwrap();
        fs::write(root.join("cache.pyc"), "").unwrap();
        fs::write(root.join("main.py"), "").unwrap();

        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.contains("main.py"));
        for hidden in [".git", "objects", "node_modules", "__pycache__", "cache.pyc"] {
            assert!(!result.contains(hidden), "{hidden} listed in {result}");
        }
    }

    #[tokio::test]
    async fn tree_empty_directory() {
        let (_dir, tool, root) = setup();
        fs::create_dir(root.join("empty")).unwrap();

        let result = tool.execute(json!({"path": "empty"})).await.unwrap();
        assert_eq!(
            result,
            format!("The directory {} is empty.", root.join("empty").display())
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tree_does_not_follow_escaping_symlinks() {
        let (_dir, tool, root) = setup();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("escape")).unwrap();

        let result = tool.execute(json!({})).await.unwrap();
        assert!(result.contains("└── escape@"));
        assert!(!result.contains("secret.txt"));

        let error = tool
            .execute(json!({"path": root.join("escape")}))
            .await
            .unwrap_err();
        assert!(error.is_rejected());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tree_skips_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, tool, root) = setup();
        let locked = root.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("inner.txt"), "").unwrap();
        fs::write(root.join("open.txt"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = tool.execute(json!({})).await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let result = result.unwrap();
        assert!(result.contains("locked/"));
        assert!(result.contains("open.txt"));
    }

    #[tokio::test]
    async fn tree_outside_root_rejected() {
        let (_dir, tool, root) = setup();
        let error = tool
            .execute(json!({"path": root.join("..")}))
            .await
            .unwrap_err();
        assert!(error.is_rejected());

        let error = tool.execute(json!({"path": "../.."})).await.unwrap_err();
        assert!(error.is_rejected());
    }

    #[test]
    fn ignore_patterns_match_names() {
        let patterns = ignore_patterns(&["*.pyc".to_string(), ".cache/**".to_string()]).unwrap();
        assert!(should_ignore("node_modules", &patterns));
        assert!(should_ignore("test.pyc", &patterns));
        assert!(should_ignore(".cache", &patterns));
        assert!(!should_ignore("main.py", &patterns));
    }

    #[test]
    fn last_sibling_flags_follow_parents() {
        let node = |depth, name: &str| Node {
            depth,
            name: name.to_string(),
            kind: NodeKind::File,
        };
        let nodes = vec![node(1, "a"), node(2, "a1"), node(2, "a2"), node(1, "b"), node(2, "b1")];
        assert_eq!(last_sibling_flags(&nodes), vec![false, false, true, true, true]);
    }

    #[test]
    fn validate_args_checks_depth_and_patterns() {
        let (_dir, tool, _root) = setup();
        assert!(tool.validate_args(&json!({"max_depth": 0})).is_err());
        assert!(tool.validate_args(&json!({"ignore": ["[z-a"]})).is_err());
        assert!(tool.validate_args(&json!({"max_depth": 2})).is_ok());
    }

    #[test]
    fn config_has_correct_schema() {
        let config = TreeTool::config();
        assert_eq!(config.definition.name, "tree");
        assert_eq!(config.group, ToolGroup::Filesystem);
        assert!(config.definition.input_schema["properties"]["max_depth"].is_object());
    }
}
