//! The tool box: a name-indexed set of enabled tools.
//!
//! [`ToolBox::call`] is the boundary toward the calling agent. It never
//! fails: every error, including a panic inside a tool, comes back as an
//! `"Error: ..."` string.

use crate::tools::builtins::{BashTool, GrepTool, ListDirectoryTool, TextEditorTool, TreeTool};
use crate::tools::{BoxedToolExecutor, ToolConfig, ToolContext, ToolDefinition, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Groups of tools that are enabled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolGroup {
    /// Read-only filesystem tools: `grep`, `ls`, `tree`.
    Filesystem,
    /// The `text_editor` tool.
    Editor,
    /// The `bash` tool.
    Terminal,
    /// Every tool.
    All,
}

impl ToolGroup {
    /// Returns the names of the tools in this group.
    #[must_use]
    pub fn tool_names(self) -> &'static [&'static str] {
        match self {
            Self::Filesystem => &["grep", "ls", "tree"],
            Self::Editor => &["text_editor"],
            Self::Terminal => &["bash"],
            Self::All => &["bash", "grep", "ls", "text_editor", "tree"],
        }
    }
}

/// Registry of enabled tools sharing one [`ToolContext`].
#[derive(Debug)]
pub struct ToolBox {
    context: Arc<ToolContext>,
    /// Tool configurations by name
    configs: HashMap<String, ToolConfig>,
    /// Tool executors by name
    executors: HashMap<String, Arc<BoxedToolExecutor>>,
}

impl ToolBox {
    /// Creates a tool box with every built-in tool.
    #[must_use]
    pub fn all(context: Arc<ToolContext>) -> Self {
        let mut registry = Self::empty(Arc::clone(&context));

        registry.register(
            BashTool::config(),
            Box::new(BashTool::new(Arc::clone(&context))),
        );
        registry.register(
            TextEditorTool::config(),
            Box::new(TextEditorTool::new(Arc::clone(&context))),
        );
        registry.register(
            GrepTool::config(),
            Box::new(GrepTool::new(Arc::clone(&context))),
        );
        registry.register(
            ListDirectoryTool::config(),
            Box::new(ListDirectoryTool::new(Arc::clone(&context))),
        );
        registry.register(TreeTool::config(), Box::new(TreeTool::new(context)));

        registry
    }

    /// Creates a tool box with the tools of the given groups.
    #[must_use]
    pub fn for_groups(context: Arc<ToolContext>, groups: &[ToolGroup]) -> Self {
        let all = Self::all(Arc::clone(&context));
        if groups.contains(&ToolGroup::All) {
            return all;
        }

        let mut registry = Self::empty(context);
        for name in groups.iter().flat_map(|group| group.tool_names()) {
            registry.copy_from(&all, name);
        }
        registry
    }

    /// Creates a tool box with only the named tools.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not a built-in tool.
    pub fn select(context: Arc<ToolContext>, names: &[&str]) -> Result<Self, ToolError> {
        let all = Self::all(Arc::clone(&context));
        let mut registry = Self::empty(context);

        for name in names {
            if !registry.copy_from(&all, name) {
                return Err(ToolError::not_found(*name));
            }
        }

        Ok(registry)
    }

    /// Lists all built-in tool names.
    #[must_use]
    pub fn available() -> Vec<&'static str> {
        ToolGroup::All.tool_names().to_vec()
    }

    /// Returns the names of the enabled tools, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the definitions of the enabled tools, sorted by name.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.names()
            .into_iter()
            .filter_map(|name| self.configs.get(name))
            .map(|config| config.definition.clone())
            .collect()
    }

    /// Returns the configuration for a specific tool.
    #[must_use]
    pub fn get_config(&self, name: &str) -> Option<&ToolConfig> {
        self.configs.get(name)
    }

    /// Returns the shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<ToolContext> {
        &self.context
    }

    /// Returns the number of enabled tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Returns true if no tools are enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Runs a tool and returns its result or an `"Error: ..."` string.
    pub async fn call(&self, name: &str, args: Value) -> String {
        match self.try_call(name, args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Runs a tool, keeping the structured error.
    ///
    /// The tool runs in its own task so that a panic surfaces as an
    /// internal error instead of unwinding into the caller.
    ///
    /// # Errors
    ///
    /// Returns the tool's error, `NotFound` for unknown names, or `Internal`
    /// if the tool panicked.
    pub async fn try_call(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let executor = self.executors.get(name).cloned().ok_or_else(|| {
            warn!(tool = name, "unknown tool requested");
            ToolError::not_found(name)
        })?;

        executor.validate_args(&args).inspect_err(|e| {
            warn!(tool = name, error = %e, "tool arguments rejected");
        })?;

        debug!(tool = name, "running tool");
        let task = tokio::spawn(executor.execute(args));
        let result = match task.await {
            Ok(result) => result,
            Err(join_error) => {
                error!(tool = name, error = %join_error, "tool task failed");
                Err(ToolError::internal(format!("tool '{name}' crashed: {join_error}")))
            }
        };

        if let Err(e) = &result {
            warn!(tool = name, error = %e, "tool failed");
        }
        result
    }

    fn empty(context: Arc<ToolContext>) -> Self {
        Self {
            context,
            configs: HashMap::new(),
            executors: HashMap::new(),
        }
    }

    fn register(&mut self, config: ToolConfig, executor: BoxedToolExecutor) {
        let name = config.name().to_string();
        self.configs.insert(name.clone(), config);
        self.executors.insert(name, Arc::new(executor));
    }

    fn copy_from(&mut self, other: &Self, name: &str) -> bool {
        match (other.configs.get(name), other.executors.get(name)) {
            (Some(config), Some(executor)) => {
                self.configs.insert(name.to_string(), config.clone());
                self.executors.insert(name.to_string(), Arc::clone(executor));
                true
            }
            _ => false,
        }
    }
}
