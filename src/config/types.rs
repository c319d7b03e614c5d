//! Configuration types.
//!
//! These types map directly onto the TOML configuration file.

use crate::logging::LoggingConfig;
use crate::security::CommandValidator;
use crate::tools::ToolGroup;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default shell program.
pub const DEFAULT_SHELL_PROGRAM: &str = "/bin/bash";

/// Default per-command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default time allowed for the shell to come up, in seconds.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 5;

/// Default maximum output captured per command (1MB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Root configuration structure for hostguard.
///
/// ```toml
/// project_root = "/home/user/project"
///
/// [shell]
/// command_timeout_secs = 60
/// allow_pipes = true
/// allow_redirects = false
///
/// [logging]
/// level = "debug"
///
/// [tools]
/// groups = ["editor", "terminal"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostGuardConfig {
    /// Directory every file operation is confined to.
    ///
    /// Defaults to the process working directory when unset.
    #[serde(default)]
    pub project_root: Option<PathBuf>,

    /// Keep-alive shell settings.
    #[serde(default)]
    pub shell: ShellConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Which tools are exposed.
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl HostGuardConfig {
    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project root.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Sets the shell configuration.
    #[must_use]
    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the tool groups to expose.
    #[must_use]
    pub fn with_tool_groups(mut self, groups: Vec<ToolGroup>) -> Self {
        self.tools.groups = groups;
        self
    }
}

/// Settings for the keep-alive shell session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell program to launch.
    pub program: String,

    /// Arguments passed to the shell program.
    pub args: Vec<String>,

    /// Seconds to wait for a command to finish.
    pub command_timeout_secs: u64,

    /// Seconds to wait for the shell to become ready.
    pub startup_timeout_secs: u64,

    /// Whether `|` is permitted in commands.
    pub allow_pipes: bool,

    /// Whether `>`, `>>` and `<` are permitted in commands.
    pub allow_redirects: bool,

    /// Maximum bytes of output kept per command.
    pub max_output_bytes: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_SHELL_PROGRAM.to_string(),
            args: vec!["--noprofile".to_string(), "--norc".to_string()],
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            allow_pipes: true,
            allow_redirects: true,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ShellConfig {
    /// Sets the shell program and its arguments.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    /// Sets the per-command timeout in seconds.
    #[must_use]
    pub fn with_command_timeout_secs(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    /// Sets the startup timeout in seconds.
    #[must_use]
    pub fn with_startup_timeout_secs(mut self, secs: u64) -> Self {
        self.startup_timeout_secs = secs;
        self
    }

    /// Enables or disables pipes.
    #[must_use]
    pub fn with_pipes(mut self, allow: bool) -> Self {
        self.allow_pipes = allow;
        self
    }

    /// Enables or disables redirection.
    #[must_use]
    pub fn with_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = allow;
        self
    }

    /// Sets the per-command output cap.
    #[must_use]
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Returns the per-command timeout.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Returns the startup timeout.
    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    /// Builds the command validator these settings describe.
    #[must_use]
    pub fn validator(&self) -> CommandValidator {
        CommandValidator::new()
            .with_pipes(self.allow_pipes)
            .with_redirects(self.allow_redirects)
    }
}

/// Tool exposure settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Enabled tool groups.
    pub groups: Vec<ToolGroup>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            groups: vec![ToolGroup::All],
        }
    }
}
