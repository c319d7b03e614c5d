//! Configuration management for hostguard.
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format. The search order is:
//! 1. `./hostguard.toml` (project-local)
//! 2. `~/.config/hostguard/config.toml` (XDG config)
//!
//! Every section is optional; missing values take their defaults.
//!
//! ```toml
//! # Directory all file operations are confined to (default: cwd)
//! project_root = "/home/user/project"
//!
//! [shell]
//! program = "/bin/bash"
//! args = ["--noprofile", "--norc"]
//! command_timeout_secs = 30
//! startup_timeout_secs = 5
//! allow_pipes = true
//! allow_redirects = true
//! max_output_bytes = 1048576
//!
//! [logging]
//! enabled = true
//! level = "info"
//!
//! [tools]
//! groups = ["all"]
//! ```

mod file;
mod types;

// Re-export file loading functions
pub use file::{from_path, from_str, load, search_paths, xdg_config_dir};

// Re-export types
pub use types::{
    HostGuardConfig, ShellConfig, ToolsConfig, DEFAULT_COMMAND_TIMEOUT_SECS,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SHELL_PROGRAM, DEFAULT_STARTUP_TIMEOUT_SECS,
};
