//! The keep-alive shell session.

use crate::config::ShellConfig;
use crate::security::CommandValidator;
use crate::shell::framing::{clean_output, Frame, Sentinel, SentinelFramer};
use crate::shell::{ShellError, ShellErrorKind};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Time `close()` gives the shell to exit on its own before killing it.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Size of a single read from the shell's stdout.
const READ_CHUNK: usize = 8192;

/// Result of one command run in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Cleaned combined stdout and stderr.
    pub output: String,
    /// Exit status of the command, when the shell reported one.
    pub exit_code: Option<i32>,
    /// Bytes dropped because the output exceeded the configured cap.
    pub omitted_bytes: usize,
}

impl CommandOutput {
    /// Returns true if the command exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A long-lived shell process that runs validated commands one at a time.
///
/// The shell starts lazily on the first [`execute`](Self::execute) call and
/// keeps its state (working directory, environment, shell variables) between
/// calls. Every command passes through the session's [`CommandValidator`]
/// before it reaches the process.
///
/// Callers must serialize access; wrap the session in a mutex when it is
/// shared.
#[derive(Debug)]
pub struct PersistentShellSession {
    config: ShellConfig,
    validator: CommandValidator,
    working_dir: Option<PathBuf>,
    state: SessionState,
}

#[derive(Debug)]
enum SessionState {
    Uninitialized,
    Ready(Box<ShellProcess>),
    Closed,
}

/// The live child process and its framing state.
#[derive(Debug)]
struct ShellProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    sentinel: Sentinel,
    framer: SentinelFramer,
    next_sequence: u64,
}

impl Default for PersistentShellSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentShellSession {
    /// Creates a session with default settings and no working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ShellConfig::default())
    }

    /// Creates a session from shell settings.
    ///
    /// The command validator is derived from the pipe and redirect flags.
    #[must_use]
    pub fn with_config(config: ShellConfig) -> Self {
        let validator = config.validator();
        Self {
            config,
            validator,
            working_dir: None,
            state: SessionState::Uninitialized,
        }
    }

    /// Sets the directory the shell enters at startup.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replaces the command validator.
    #[must_use]
    pub fn with_validator(mut self, validator: CommandValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Returns the session's settings.
    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Returns the validator guarding this session.
    #[must_use]
    pub fn validator(&self) -> &CommandValidator {
        &self.validator
    }

    /// Returns the startup working directory, if one was configured.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Returns true once a shell process has been started and not yet lost.
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    /// Returns true after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// Returns true if the shell process is running.
    pub fn is_alive(&mut self) -> bool {
        match &mut self.state {
            SessionState::Ready(process) => matches!(process.child.try_wait(), Ok(None)),
            _ => false,
        }
    }

    /// Starts the shell if it is not running yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed, the process cannot be
    /// spawned, it does not come up in time, or the working directory cannot
    /// be entered.
    pub async fn start(&mut self) -> Result<(), ShellError> {
        match self.state {
            SessionState::Ready(_) => Ok(()),
            SessionState::Closed => Err(ShellError::closed()),
            SessionState::Uninitialized => {
                let process = self.spawn().await?;
                self.state = SessionState::Ready(process);
                Ok(())
            }
        }
    }

    /// Validates and runs one command, returning its cleaned output.
    ///
    /// A rejected command never reaches the shell and leaves the session
    /// untouched. A timeout leaves the command running; its late output is
    /// discarded by later calls. Call [`reset`](Self::reset) to abort it.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError`] on rejection, startup failure, timeout, I/O
    /// failure, when the shell exits, or when the session is closed.
    pub async fn execute(&mut self, command: &str) -> Result<CommandOutput, ShellError> {
        if self.is_closed() {
            return Err(ShellError::closed());
        }

        if let Err(rejection) = self.validator.validate(command) {
            warn!(category = rejection.category.label(), "shell command rejected");
            return Err(rejection.into());
        }

        self.start().await?;
        let limit = self.config.command_timeout();
        let command = command.trim();

        let result = match &mut self.state {
            SessionState::Ready(process) => process.run(command, limit).await,
            _ => Err(ShellError::closed()),
        };

        match result {
            Ok(frame) => Ok(finish(frame, command)),
            Err(e) => {
                if e.is_exited() {
                    info!("shell exited; next command starts a new shell");
                    self.state = SessionState::Uninitialized;
                } else if e.is_timeout() {
                    warn!(seconds = limit.as_secs(), "shell command timed out");
                }
                Err(e)
            }
        }
    }

    /// Returns the shell's current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `pwd` cannot be run.
    pub async fn current_dir(&mut self) -> Result<PathBuf, ShellError> {
        let output = self.execute("pwd").await?;
        Ok(PathBuf::from(output.output.trim()))
    }

    /// Terminates any running shell and starts a fresh one.
    ///
    /// Allowed from every state; a closed session becomes usable again.
    ///
    /// # Errors
    ///
    /// Returns an error if the new shell cannot be started.
    pub async fn reset(&mut self) -> Result<(), ShellError> {
        info!("resetting shell session");
        self.shutdown().await;
        self.state = SessionState::Uninitialized;
        self.start().await
    }

    /// Asks the shell to exit, then kills it after a short grace period.
    ///
    /// Closing a closed session does nothing.
    pub async fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.shutdown().await;
        self.state = SessionState::Closed;
    }

    async fn shutdown(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Uninitialized);
        if let SessionState::Ready(process) = state {
            process.terminate().await;
        }
    }

    async fn spawn(&self) -> Result<Box<ShellProcess>, ShellError> {
        let program = &self.config.program;
        let mut child = Command::new(program)
            .args(&self.config.args)
            .env("TERM", "dumb")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ShellError::spawn_failed(program.as_str(), e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShellError::spawn_failed(program.as_str(), "stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ShellError::spawn_failed(program.as_str(), "stdout not captured"))?;

        let sentinel = Sentinel::generate();
        let framer = SentinelFramer::new(sentinel.text()).with_limit(self.config.max_output_bytes);
        let mut process = Box::new(ShellProcess {
            child,
            stdin,
            stdout,
            sentinel,
            framer,
            next_sequence: 0,
        });

        info!(program = %program, pid = ?process.child.id(), "shell started");

        let startup = self.config.startup_timeout();
        if let Err(e) = process.run("exec 2>&1", startup).await {
            process.terminate().await;
            let not_ready = matches!(
                e.kind,
                ShellErrorKind::Timeout { .. } | ShellErrorKind::Exited
            );
            return Err(if not_ready {
                ShellError::spawn_failed(
                    program.as_str(),
                    format!("shell did not become ready: {e}"),
                )
            } else {
                e
            });
        }

        if let Some(dir) = &self.working_dir {
            let escaped = shell_escape::unix::escape(Cow::Owned(dir.to_string_lossy().into_owned()));
            let frame = match process.run(&format!("cd -- {escaped}"), startup).await {
                Ok(frame) => frame,
                Err(e) => {
                    process.terminate().await;
                    return Err(e);
                }
            };
            if frame.status != Some(0) {
                process.terminate().await;
                let message = clean_output(&frame.body, "");
                warn!(dir = %dir.display(), "shell could not enter working directory");
                return Err(ShellError::working_directory(dir.clone(), message));
            }
            debug!(dir = %dir.display(), "shell entered working directory");
        }

        Ok(process)
    }
}

/// Cleans a frame into the caller-facing output.
fn finish(frame: Frame, command: &str) -> CommandOutput {
    let mut output = clean_output(&frame.body, command);
    if frame.omitted > 0 {
        output.push_str(&format!(
            "\n\n... (output truncated, {} bytes omitted)",
            frame.omitted
        ));
    }
    CommandOutput {
        output,
        exit_code: frame.status,
        omitted_bytes: frame.omitted,
    }
}

impl ShellProcess {
    /// Writes a command followed by its marker and waits for the matching
    /// frame.
    async fn run(&mut self, command: &str, limit: Duration) -> Result<Frame, ShellError> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let script = format!("{command}\n{}\n", self.sentinel.marker_command(sequence));
        debug!(sequence, command, "sending command to shell");
        self.write(script.as_bytes()).await?;

        match timeout(limit, self.read_frame(sequence)).await {
            Ok(result) => result,
            Err(_) => Err(ShellError::timeout(limit)),
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), ShellError> {
        let result = async {
            self.stdin.write_all(bytes).await?;
            self.stdin.flush().await
        }
        .await;

        result.map_err(|e| match e.kind() {
            std::io::ErrorKind::BrokenPipe => ShellError::exited(),
            _ => ShellError::from(e),
        })
    }

    async fn read_frame(&mut self, sequence: u64) -> Result<Frame, ShellError> {
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            while let Some(frame) = self.framer.next_frame() {
                if frame.sequence == Some(sequence) {
                    return Ok(frame);
                }
                debug!(
                    expected = sequence,
                    received = ?frame.sequence,
                    "discarding stale shell output"
                );
            }

            let read = self.stdout.read(&mut chunk).await?;
            if read == 0 {
                return Err(ShellError::exited());
            }
            self.framer.push(&chunk[..read]);
        }
    }

    async fn terminate(self: Box<Self>) {
        let ShellProcess {
            mut child,
            mut stdin,
            ..
        } = *self;

        // Ignore write errors: the shell may already be gone.
        let _ = stdin.write_all(b"exit\n").await;
        let _ = stdin.flush().await;
        drop(stdin);

        match timeout(CLOSE_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "shell exited"),
            Ok(Err(e)) => warn!(error = %e, "failed to wait for shell"),
            Err(_) => {
                warn!("shell did not exit in time; killing it");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill shell");
                }
            }
        }
        info!("shell stopped");
    }
}
