//! `hostguard` command line interface.
//!
//! Exercises the validators and tools from a terminal: check a path or a
//! command, list or invoke tools, or drive the guarded shell interactively.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use hostguard::config::{self, HostGuardConfig};
use hostguard::logging::{init_logging, LogLevel};
use hostguard::security::PathValidator;
use hostguard::shell::PersistentShellSession;
use hostguard::tools::{ToolBox, ToolContext};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "hostguard", version, about = "Guarded filesystem and shell access for coding agents")]
struct Cli {
    /// Configuration file (default: ./hostguard.toml, then the XDG config dir)
    #[arg(long, global = true, env = "HOSTGUARD_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Project root all operations are confined to (default: cwd)
    #[arg(long, global = true, env = "HOSTGUARD_ROOT", value_name = "DIR")]
    root: Option<PathBuf>,

    /// Log to stderr; repeat for more detail
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Refuse commands containing `|`
    #[arg(long, global = true)]
    no_pipes: bool,

    /// Refuse commands containing `>`, `>>` or `<`
    #[arg(long, global = true)]
    no_redirects: bool,

    /// Per-command timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether a path is inside the project root
    CheckPath {
        path: PathBuf,
        /// Accept paths that do not exist yet
        #[arg(long)]
        allow_nonexistent: bool,
    },
    /// Check whether a shell command would be accepted
    CheckCommand { command: String },
    /// Print the enabled tool definitions as JSON
    Tools,
    /// Invoke one tool with JSON arguments and print its result
    Tool {
        name: String,
        #[arg(default_value = "{}")]
        args: String,
    },
    /// Interactive guarded shell (`:reset`, `:pwd`, `:quit`)
    Shell,
}

impl Cli {
    fn console_level(&self) -> Option<LogLevel> {
        match self.verbose {
            0 => None,
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }

    fn load_config(&self) -> Result<HostGuardConfig> {
        let mut config = match &self.config {
            Some(path) => config::from_path(path)?,
            None => config::load()?,
        };

        if let Some(root) = &self.root {
            config.project_root = Some(absolute(root)?);
        }
        if self.no_pipes {
            config.shell.allow_pipes = false;
        }
        if self.no_redirects {
            config.shell.allow_redirects = false;
        }
        if let Some(secs) = self.timeout {
            config.shell.command_timeout_secs = secs;
        }
        Ok(config)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    Ok(cwd.join(path))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.load_config()?;

    let _logging = match init_logging(&config.logging, cli.console_level()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: {e}");
            None
        }
    };

    match cli.command {
        Command::CheckPath {
            path,
            allow_nonexistent,
        } => check_path(&config, &path, allow_nonexistent),
        Command::CheckCommand { command } => Ok(check_command(&config, &command)),
        Command::Tools => list_tools(&config),
        Command::Tool { name, args } => invoke_tool(&config, &name, &args).await,
        Command::Shell => interactive_shell(&config).await,
    }
}

fn validator(config: &HostGuardConfig) -> Result<PathValidator> {
    let validator = match &config.project_root {
        Some(root) => PathValidator::new(root)?,
        None => PathValidator::from_current_dir()?,
    };
    Ok(validator)
}

fn check_path(config: &HostGuardConfig, path: &Path, allow_nonexistent: bool) -> Result<ExitCode> {
    let validator = validator(config)?;
    match validator.validate(&absolute(path)?, allow_nonexistent) {
        Ok(resolved) => {
            println!("allowed: {}", resolved.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("rejected: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check_command(config: &HostGuardConfig, command: &str) -> ExitCode {
    match config.shell.validator().validate(command) {
        Ok(()) => {
            println!("allowed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("rejected: {e}");
            ExitCode::FAILURE
        }
    }
}

fn list_tools(config: &HostGuardConfig) -> Result<ExitCode> {
    let context = Arc::new(ToolContext::from_config(config)?);
    let tools = ToolBox::for_groups(context, &config.tools.groups);
    let definitions = serde_json::to_string_pretty(&tools.definitions())?;
    println!("{definitions}");
    Ok(ExitCode::SUCCESS)
}

async fn invoke_tool(config: &HostGuardConfig, name: &str, raw_args: &str) -> Result<ExitCode> {
    let args: serde_json::Value =
        serde_json::from_str(raw_args).context("tool arguments must be a JSON object")?;

    let context = Arc::new(ToolContext::from_config(config)?);
    let tools = ToolBox::for_groups(Arc::clone(&context), &config.tools.groups);

    let result = tools.try_call(name, args).await;
    context.shutdown().await;

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("Error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn interactive_shell(config: &HostGuardConfig) -> Result<ExitCode> {
    let root = validator(config)?.project_root().to_path_buf();
    let mut session =
        PersistentShellSession::with_config(config.shell.clone()).with_working_dir(&root);
    session.start().await?;
    info!(root = %root.display(), "interactive shell started");

    let mut line_editor = Reedline::create();
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("hostguard".to_string()),
        DefaultPromptSegment::Empty,
    );

    loop {
        let line = match line_editor.read_line(&prompt)? {
            Signal::Success(line) => line,
            Signal::CtrlD => break,
            _ => continue,
        };

        match line.trim() {
            "" => {}
            ":quit" | ":exit" => break,
            ":reset" => match session.reset().await {
                Ok(()) => println!("shell restarted in {}", root.display()),
                Err(e) => eprintln!("Error: {e}"),
            },
            ":pwd" => match session.current_dir().await {
                Ok(dir) => println!("{}", dir.display()),
                Err(e) => eprintln!("Error: {e}"),
            },
            command => match session.execute(command).await {
                Ok(result) => {
                    if !result.output.is_empty() {
                        println!("{}", result.output);
                    }
                    if let Some(code) = result.exit_code.filter(|code| *code != 0) {
                        eprintln!("exit code: {code}");
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }

    session.close().await;
    Ok(ExitCode::SUCCESS)
}
