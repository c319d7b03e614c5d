//! Command validation for the keep-alive shell.
//!
//! `CommandValidator` screens raw command strings for lexical patterns that
//! enable chaining, background execution, substitution, or writes to
//! sensitive device and configuration paths.
//!
//! Matching is lexical. Shell quoting is not parsed, so a `;` inside a quoted
//! argument is rejected just like a bare one. Redirection targets are the
//! exception: each target token is unquoted and its absolute path collapsed
//! (`//`, `/./`, `..`) before the `/etc` and `/dev` rules look at it.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Number of characters of the offending command kept in error messages.
const PREVIEW_CHARS: usize = 50;

/// A named class of rejected shell syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    /// Empty or whitespace-only command.
    Empty,
    /// `;`
    Semicolon,
    /// `&&`
    AndChain,
    /// `||`
    OrChain,
    /// A trailing `&`.
    Background,
    /// `$(...)`
    DollarSubstitution,
    /// `` `...` ``
    BacktickSubstitution,
    /// `>`/`>>` into `/etc/`.
    EtcRedirect,
    /// `>`/`>>` into `/dev/` other than `/dev/null`.
    DevRedirect,
    /// A line break, which the line-oriented session would run as a second command.
    Newline,
    /// `|` while pipes are disabled.
    PipeDisabled,
    /// `>`, `>>` or `<` while redirection is disabled.
    RedirectDisabled,
}

impl CommandCategory {
    /// Human-readable label for this category.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Empty => "empty command",
            Self::Semicolon => "command chaining with semicolon",
            Self::AndChain => "command chaining with &&",
            Self::OrChain => "command chaining with ||",
            Self::Background => "background execution",
            Self::DollarSubstitution => "command substitution with $()",
            Self::BacktickSubstitution => "command substitution with backticks",
            Self::EtcRedirect => "suspicious redirection to /etc",
            Self::DevRedirect => "suspicious redirection to /dev (except /dev/null)",
            Self::Newline => "command chaining with newline",
            Self::PipeDisabled => "pipes not allowed",
            Self::RedirectDisabled => "redirection not allowed",
        }
    }

    /// Returns true for the unconditionally forbidden classes.
    #[must_use]
    pub fn is_forbidden_pattern(self) -> bool {
        !matches!(
            self,
            Self::Empty | Self::PipeDisabled | Self::RedirectDisabled
        )
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a command fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandValidationError {
    /// Which rule rejected the command.
    pub category: CommandCategory,
    /// Leading part of the rejected command.
    pub preview: String,
}

impl CommandValidationError {
    /// Creates a new error for the given category and command.
    #[must_use]
    pub fn new(category: CommandCategory, command: &str) -> Self {
        Self {
            category,
            preview: preview(command),
        }
    }
}

impl fmt::Display for CommandValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            CommandCategory::Empty => write!(f, "empty command"),
            CommandCategory::PipeDisabled | CommandCategory::RedirectDisabled => {
                write!(f, "{}; command: {}", self.category, self.preview)
            }
            category => write!(
                f,
                "forbidden pattern detected: {category}; command: {}",
                self.preview
            ),
        }
    }
}

impl std::error::Error for CommandValidationError {}

fn preview(command: &str) -> String {
    let trimmed = command.trim();
    let mut preview: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    if trimmed.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Redirection operator followed by its target word. Longer operators come
/// first so `>>`, `>|` and `>&` are not read as `>`.
static REDIRECT_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:&>>?|>>|>\||>&|>)\s*((?:"[^"]*"?|'[^']*'?|[^\s|&;<>"'])+)"#)
        .unwrap_or_else(|e| panic!("invalid redirect pattern: {e}"))
});

/// How a rule inspects a command.
enum Matcher {
    /// Raw regex over the whole command.
    Pattern(Regex),
    /// Predicate over each normalized absolute redirection target.
    RedirectTarget(fn(&str) -> bool),
}

/// A forbidden pattern.
struct Rule {
    category: CommandCategory,
    matcher: Matcher,
}

impl Rule {
    fn new(category: CommandCategory, pattern: &str) -> Self {
        Self {
            category,
            matcher: Matcher::Pattern(
                Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule {pattern}: {e}")),
            ),
        }
    }

    fn redirect(category: CommandCategory, forbidden: fn(&str) -> bool) -> Self {
        Self {
            category,
            matcher: Matcher::RedirectTarget(forbidden),
        }
    }

    fn matches(&self, command: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(pattern) => pattern.is_match(command),
            Matcher::RedirectTarget(forbidden) => {
                redirect_targets(command).any(|target| forbidden(&target))
            }
        }
    }
}

/// Absolute redirection targets in `command`, unquoted and normalized.
/// Relative targets are skipped.
fn redirect_targets(command: &str) -> impl Iterator<Item = String> + '_ {
    REDIRECT_TARGET
        .captures_iter(command)
        .filter_map(|captures| captures.get(1))
        .filter_map(|word| normalize_absolute(&unquote(word.as_str())))
}

/// Removes quote characters and backslash escapes the way the shell would
/// when building the word.
fn unquote(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut quote: Option<char> = None;
    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), c) if c == open => quote = None,
            (None, '\\') => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}

/// Lexically collapses empty, `.` and `..` components of an absolute path.
fn normalize_absolute(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    Some(format!("/{}", parts.join("/")))
}

fn is_under(path: &str, dir: &str) -> bool {
    path == dir || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

fn targets_etc(path: &str) -> bool {
    is_under(path, "/etc")
}

fn targets_device(path: &str) -> bool {
    is_under(path, "/dev") && path != "/dev/null"
}

/// Forbidden patterns, checked in order; the first match is reported.
static FORBIDDEN_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(CommandCategory::Semicolon, r";"),
        Rule::new(CommandCategory::AndChain, r"&&"),
        Rule::new(CommandCategory::OrChain, r"\|\|"),
        Rule::new(CommandCategory::Background, r"&\s*$"),
        Rule::new(CommandCategory::DollarSubstitution, r"\$\("),
        Rule::new(CommandCategory::BacktickSubstitution, r"`"),
        Rule::redirect(CommandCategory::EtcRedirect, targets_etc),
        Rule::redirect(CommandCategory::DevRedirect, targets_device),
        Rule::new(CommandCategory::Newline, r"[\r\n]"),
    ]
});

/// Validates shell commands before they reach the shell.
///
/// Pipes and redirection are allowed by default; either can be disabled.
///
/// # Example
///
/// ```rust
/// use hostguard::security::{CommandCategory, CommandValidator};
///
/// let validator = CommandValidator::new();
/// assert!(validator.validate("cargo test | tail -n 20").is_ok());
///
/// let err = validator.validate("make && rm -rf build").unwrap_err();
/// assert_eq!(err.category, CommandCategory::AndChain);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandValidator {
    allow_pipes: bool,
    allow_redirects: bool,
}

impl CommandValidator {
    /// Creates a validator that allows pipes and redirection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_pipes: true,
            allow_redirects: true,
        }
    }

    /// Sets whether `|` is permitted.
    #[must_use]
    pub fn with_pipes(mut self, allow: bool) -> Self {
        self.allow_pipes = allow;
        self
    }

    /// Sets whether `>`, `>>` and `<` are permitted.
    #[must_use]
    pub fn with_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = allow;
        self
    }

    /// Returns whether pipes are permitted.
    #[must_use]
    pub fn allows_pipes(&self) -> bool {
        self.allow_pipes
    }

    /// Returns whether redirection is permitted.
    #[must_use]
    pub fn allows_redirects(&self) -> bool {
        self.allow_redirects
    }

    /// Validates a command.
    ///
    /// # Errors
    ///
    /// Returns `CommandValidationError` naming the first rule that matched.
    pub fn validate(&self, command: &str) -> Result<(), CommandValidationError> {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(CommandValidationError::new(CommandCategory::Empty, command));
        }

        if let Some(rule) = FORBIDDEN_RULES.iter().find(|rule| rule.matches(trimmed)) {
            return Err(CommandValidationError::new(rule.category, trimmed));
        }

        if !self.allow_pipes && trimmed.contains('|') {
            return Err(CommandValidationError::new(
                CommandCategory::PipeDisabled,
                trimmed,
            ));
        }

        if !self.allow_redirects && trimmed.contains(['>', '<']) {
            return Err(CommandValidationError::new(
                CommandCategory::RedirectDisabled,
                trimmed,
            ));
        }

        Ok(())
    }

    /// Non-failing variant of [`validate`](Self::validate).
    #[must_use]
    pub fn is_safe(&self, command: &str) -> (bool, Option<String>) {
        match self.validate(command) {
            Ok(()) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        }
    }
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new()
    }
}
