//! Tool definition and executor traits.
//!
//! Defines the core trait for tool execution and the ToolConfig structure
//! that wraps a tool definition with its registration details.

use crate::tools::error::ToolError;
use crate::tools::registry::ToolGroup;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// Definition of a tool as presented to a calling agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the tool's input parameters
    pub input_schema: Value,
}

/// Configuration for a registered tool.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// The tool definition
    pub definition: ToolDefinition,
    /// The group the tool belongs to
    pub group: ToolGroup,
}

impl ToolConfig {
    /// Creates a new tool configuration.
    #[must_use]
    pub fn new(definition: ToolDefinition, group: ToolGroup) -> Self {
        Self { definition, group }
    }

    /// Returns the tool's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// The result type for tool execution futures.
pub type ToolExecutionFuture =
    Pin<Box<dyn Future<Output = Result<String, ToolError>> + Send + 'static>>;

/// Trait for executing tools.
///
/// A tool receives JSON arguments and resolves to a text result.
///
/// # Example
///
/// ```rust
/// use hostguard::tools::{ToolExecutorTrait, ToolError, ToolExecutionFuture};
/// use serde_json::Value;
///
/// #[derive(Debug)]
/// struct EchoTool;
///
/// impl ToolExecutorTrait for EchoTool {
///     fn execute(&self, args: Value) -> ToolExecutionFuture {
///         Box::pin(async move {
///             Ok(args.to_string())
///         })
///     }
/// }
/// ```
pub trait ToolExecutorTrait: Send + Sync + Debug {
    /// Executes the tool with the given arguments.
    fn execute(&self, args: Value) -> ToolExecutionFuture;

    /// Validates the input arguments before execution.
    ///
    /// The default implementation accepts any arguments.
    fn validate_args(&self, _args: &Value) -> Result<(), ToolError> {
        Ok(())
    }
}

/// A boxed tool executor for dynamic dispatch.
pub type BoxedToolExecutor = Box<dyn ToolExecutorTrait>;

/// Parses tool arguments into their typed form.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    args: Value,
) -> Result<T, ToolError> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::validation_failed(tool_name, format!("invalid arguments: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Args {
        #[allow(dead_code)]
        name: String,
    }

    #[test]
    fn tool_config_keeps_group() {
        let config = ToolConfig::new(
            ToolDefinition {
                name: "t".to_string(),
                description: "d".to_string(),
                input_schema: json!({"type": "object"}),
            },
            ToolGroup::Editor,
        );
        assert_eq!(config.name(), "t");
        assert_eq!(config.group, ToolGroup::Editor);
    }

    #[test]
    fn parse_args_reports_tool_name() {
        let error = parse_args::<Args>("demo", json!({"other": 1})).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("demo"));
        assert!(message.contains("invalid arguments"));
    }

    #[test]
    fn definition_serializes_schema() {
        let definition = ToolDefinition {
            name: "ls".to_string(),
            description: "list".to_string(),
            input_schema: json!({"type": "object", "required": ["path"]}),
        };
        let value = serde_json::to_value(&definition).unwrap();
        assert_eq!(value["input_schema"]["required"][0], "path");
    }
}
