//! Shared execution context for the built-in tools.

use crate::config::{HostGuardConfig, ShellConfig};
use crate::editor::TextEditor;
use crate::error::HostGuardError;
use crate::security::PathValidator;
use crate::shell::PersistentShellSession;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Everything the built-in tools operate on.
///
/// The context owns the path validator, the text editor built on it, and
/// the single keep-alive shell session. Tools hold an `Arc` of the context;
/// the shell is behind a mutex so that commands run one at a time.
#[derive(Debug)]
pub struct ToolContext {
    validator: Arc<PathValidator>,
    editor: TextEditor,
    shell: Mutex<PersistentShellSession>,
    shell_config: ShellConfig,
}

impl ToolContext {
    /// Creates a context confined by `validator`.
    ///
    /// The shell starts in the validator's project root on first use.
    #[must_use]
    pub fn new(validator: PathValidator, shell_config: ShellConfig) -> Self {
        let validator = Arc::new(validator);
        let shell = PersistentShellSession::with_config(shell_config.clone())
            .with_working_dir(validator.project_root());

        Self {
            editor: TextEditor::new(Arc::clone(&validator)),
            validator,
            shell: Mutex::new(shell),
            shell_config,
        }
    }

    /// Creates a context rooted at `root` with default shell settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not an existing absolute directory.
    pub fn for_root(root: impl AsRef<Path>) -> Result<Self, HostGuardError> {
        let validator = PathValidator::new(root)?;
        Ok(Self::new(validator, ShellConfig::default()))
    }

    /// Creates a context from loaded configuration.
    ///
    /// Uses the configured project root, or the process working directory
    /// when none is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the project root is unusable.
    pub fn from_config(config: &HostGuardConfig) -> Result<Self, HostGuardError> {
        let validator = match &config.project_root {
            Some(root) => PathValidator::new(root)?,
            None => PathValidator::from_current_dir()?,
        };
        info!(root = %validator.project_root().display(), "tool context ready");
        Ok(Self::new(validator, config.shell.clone()))
    }

    /// Returns the path validator.
    #[must_use]
    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    /// Returns the canonical project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        self.validator.project_root()
    }

    /// Returns the text editor.
    #[must_use]
    pub fn editor(&self) -> &TextEditor {
        &self.editor
    }

    /// Returns the shell session.
    #[must_use]
    pub fn shell(&self) -> &Mutex<PersistentShellSession> {
        &self.shell
    }

    /// Returns the shell settings.
    #[must_use]
    pub fn shell_config(&self) -> &ShellConfig {
        &self.shell_config
    }

    /// Closes the shell session.
    pub async fn shutdown(&self) {
        self.shell.lock().await.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn for_root_canonicalizes() {
        let dir = TempDir::new().unwrap();
        let context = ToolContext::for_root(dir.path()).unwrap();
        assert_eq!(
            context.project_root(),
            dir.path().canonicalize().unwrap().as_path()
        );
        assert_eq!(
            context.editor().validator().project_root(),
            context.project_root()
        );
    }

    #[test]
    fn for_root_rejects_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(ToolContext::for_root(dir.path().join("missing")).is_err());
    }

    #[test]
    fn from_config_uses_shell_settings() {
        let dir = TempDir::new().unwrap();
        let config = HostGuardConfig::new()
            .with_project_root(dir.path())
            .with_shell(ShellConfig::default().with_pipes(false));

        let context = ToolContext::from_config(&config).unwrap();
        assert!(!context.shell_config().allow_pipes);
    }

    #[tokio::test]
    async fn shell_starts_in_project_root() {
        let dir = TempDir::new().unwrap();
        let context = ToolContext::for_root(dir.path()).unwrap();

        let session = context.shell().lock().await;
        assert_eq!(session.working_dir(), Some(context.project_root()));
        assert!(!session.is_started());
    }

    #[tokio::test]
    async fn shutdown_closes_shell() {
        let dir = TempDir::new().unwrap();
        let context = ToolContext::for_root(dir.path()).unwrap();

        context.shutdown().await;
        assert!(context.shell().lock().await.is_closed());
    }
}
