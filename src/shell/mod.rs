//! Keep-alive shell session.
//!
//! [`PersistentShellSession`] owns one long-lived shell process and runs
//! commands in it one at a time, so that `cd`, exported variables and other
//! shell state carry over between calls. Every command is screened by a
//! [`CommandValidator`](crate::security::CommandValidator) first.
//!
//! Command completion is detected by scanning the shell's output for a unique
//! sentinel printed after each command (see [`SentinelFramer`]).
//!
//! ```rust,no_run
//! use hostguard::shell::PersistentShellSession;
//!
//! # async fn run() -> Result<(), hostguard::shell::ShellError> {
//! let mut session = PersistentShellSession::new().with_working_dir("/home/user/project");
//! let result = session.execute("git status --short").await?;
//! println!("{} (exit {:?})", result.output, result.exit_code);
//! session.close().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod framing;
mod session;

pub use error::{ShellError, ShellErrorKind};
pub use framing::{clean_output, strip_ansi, Frame, Sentinel, SentinelFramer};
pub use session::{CommandOutput, PersistentShellSession};
