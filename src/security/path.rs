//! Path validation for filesystem security.
//!
//! Provides `PathValidator`, which confines filesystem access to a single
//! canonical project root. Containment is always checked on the fully
//! resolved form of a path, never on the raw string.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Maximum number of symbolic links followed while resolving a path that
/// does not fully exist yet. Mirrors the kernel's `ELOOP` limit.
const MAX_SYMLINK_HOPS: usize = 40;

/// Error returned when path validation fails.
///
/// Each variant carries the offending path so callers can report exactly
/// what was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathValidationError {
    /// Path is relative.
    NotAbsolute {
        /// The path that was rejected.
        path: PathBuf,
    },
    /// Path does not exist (or could not be resolved).
    NotFound {
        /// The path that could not be resolved.
        path: PathBuf,
        /// The underlying error reason.
        reason: String,
    },
    /// No ancestor of the path exists on the filesystem.
    NoExistingAncestor {
        /// The path whose ancestry was walked.
        path: PathBuf,
    },
    /// Resolved path is outside the project root.
    OutsideRoot {
        /// The resolved path that was rejected.
        path: PathBuf,
        /// The project root the path had to stay within.
        project_root: PathBuf,
    },
    /// Raw input cannot denote a path at all.
    NotAPath {
        /// The raw input.
        input: String,
        /// Why the input was rejected.
        reason: String,
    },
    /// The project root itself is unusable.
    InvalidRoot {
        /// The root that was supplied.
        root: PathBuf,
        /// Why it was rejected.
        reason: String,
    },
}

impl PathValidationError {
    /// Returns true if the path escaped the project root.
    #[must_use]
    pub fn is_outside_root(&self) -> bool {
        matches!(self, Self::OutsideRoot { .. })
    }

    /// Returns true if the path (or its target) does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAbsolute { path } => {
                write!(
                    f,
                    "path must be absolute (start with /), got '{}'",
                    path.display()
                )
            }
            Self::NotFound { path, reason } => {
                write!(
                    f,
                    "path does not exist: '{}' ({}); verify the path exists and is accessible",
                    path.display(),
                    reason
                )
            }
            Self::NoExistingAncestor { path } => {
                write!(
                    f,
                    "cannot find an existing ancestor directory for '{}'",
                    path.display()
                )
            }
            Self::OutsideRoot { path, project_root } => {
                write!(
                    f,
                    "path is outside project root. Path: {}, Project root: {}; \
                     operations are restricted to the project root",
                    path.display(),
                    project_root.display()
                )
            }
            Self::NotAPath { input, reason } => {
                write!(f, "invalid path {input:?}: {reason}")
            }
            Self::InvalidRoot { root, reason } => {
                write!(
                    f,
                    "invalid project root '{}': {}",
                    root.display(),
                    reason
                )
            }
        }
    }
}

impl std::error::Error for PathValidationError {}

/// Confines filesystem paths to a canonical project root.
///
/// `PathValidator` defends against:
/// - Relative paths (always rejected)
/// - `..` traversal, at any depth
/// - Symlinks whose target lies outside the root, including dangling ones
///   that would be created through by a write
///
/// The root is canonicalized once at construction and never changes.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use hostguard::security::PathValidator;
///
/// let validator = PathValidator::new("/home/user/project").unwrap();
///
/// // Existing file inside the root
/// let canonical = validator.validate(Path::new("/home/user/project/src/main.rs"), false);
///
/// // Traversal out of the root is rejected
/// let escaped = validator.validate(Path::new("/home/user/project/../../etc/passwd"), false);
/// assert!(escaped.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathValidator {
    /// Canonical, symlink-free project root.
    project_root: PathBuf,
}

impl PathValidator {
    /// Creates a validator rooted at `project_root`.
    ///
    /// # Errors
    ///
    /// Returns `PathValidationError::InvalidRoot` if the root is relative,
    /// does not exist, or is not a directory.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, PathValidationError> {
        let root = project_root.as_ref();

        if !root.is_absolute() {
            return Err(PathValidationError::InvalidRoot {
                root: root.to_path_buf(),
                reason: "project root must be an absolute path".to_string(),
            });
        }

        let canonical = root
            .canonicalize()
            .map_err(|e| PathValidationError::InvalidRoot {
                root: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !canonical.is_dir() {
            return Err(PathValidationError::InvalidRoot {
                root: root.to_path_buf(),
                reason: "project root is not a directory".to_string(),
            });
        }

        Ok(Self {
            project_root: canonical,
        })
    }

    /// Creates a validator rooted at the process working directory.
    ///
    /// # Errors
    ///
    /// Returns `PathValidationError::InvalidRoot` if the working directory
    /// cannot be determined or resolved.
    pub fn from_current_dir() -> Result<Self, PathValidationError> {
        let cwd = std::env::current_dir().map_err(|e| PathValidationError::InvalidRoot {
            root: PathBuf::from("."),
            reason: format!("cannot determine working directory: {e}"),
        })?;
        Self::new(cwd)
    }

    /// Returns the canonical project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Validates a path and returns its canonical form.
    ///
    /// With `allow_nonexistent` set, paths that do not exist yet are accepted
    /// as long as their resolved location would lie inside the project root.
    /// The deepest existing ancestor is canonicalized first, then the missing
    /// components are replayed on top of it.
    ///
    /// # Errors
    ///
    /// - `NotAbsolute` for relative paths
    /// - `NotFound` if the path does not exist and `allow_nonexistent` is false
    /// - `NoExistingAncestor` if nothing along the path exists
    /// - `OutsideRoot` if the resolved path escapes the project root
    pub fn validate(
        &self,
        path: &Path,
        allow_nonexistent: bool,
    ) -> Result<PathBuf, PathValidationError> {
        if !path.is_absolute() {
            return Err(PathValidationError::NotAbsolute {
                path: path.to_path_buf(),
            });
        }

        let resolved = match path.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) if !allow_nonexistent => {
                return Err(PathValidationError::NotFound {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(_) => resolve_nonexistent(path)?,
        };

        self.ensure_contained(resolved)
    }

    /// Validates a raw string from a tool boundary.
    ///
    /// # Errors
    ///
    /// Returns `NotAPath` for empty input or input containing NUL bytes,
    /// otherwise the same errors as [`validate`](Self::validate).
    pub fn validate_str(
        &self,
        raw: &str,
        allow_nonexistent: bool,
    ) -> Result<PathBuf, PathValidationError> {
        if raw.trim().is_empty() {
            return Err(PathValidationError::NotAPath {
                input: raw.to_string(),
                reason: "path is empty".to_string(),
            });
        }
        if raw.contains('\0') {
            return Err(PathValidationError::NotAPath {
                input: raw.to_string(),
                reason: "path contains a NUL byte".to_string(),
            });
        }
        self.validate(Path::new(raw), allow_nonexistent)
    }

    /// Non-failing variant of [`validate`](Self::validate).
    ///
    /// Returns `(true, None)` when the path is safe, otherwise `(false,
    /// Some(reason))`.
    #[must_use]
    pub fn is_safe(&self, path: &Path, allow_nonexistent: bool) -> (bool, Option<String>) {
        match self.validate(path, allow_nonexistent) {
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    fn ensure_contained(&self, resolved: PathBuf) -> Result<PathBuf, PathValidationError> {
        // Component-wise prefix test; a root of "/" contains everything.
        if resolved.starts_with(&self.project_root) {
            Ok(resolved)
        } else {
            Err(PathValidationError::OutsideRoot {
                path: resolved,
                project_root: self.project_root.clone(),
            })
        }
    }
}

/// Resolves a path whose tail does not exist yet.
fn resolve_nonexistent(path: &Path) -> Result<PathBuf, PathValidationError> {
    // Walk up lexically until something resolvable is found.
    let mut ancestor = path;
    loop {
        if ancestor.exists() {
            break;
        }
        ancestor = ancestor
            .parent()
            .ok_or_else(|| PathValidationError::NoExistingAncestor {
                path: path.to_path_buf(),
            })?;
    }

    let base = ancestor
        .canonicalize()
        .map_err(|e| PathValidationError::NotFound {
            path: ancestor.to_path_buf(),
            reason: format!("cannot resolve ancestor directory: {e}"),
        })?;

    let suffix = path
        .strip_prefix(ancestor)
        .map_err(|_| PathValidationError::NoExistingAncestor {
            path: path.to_path_buf(),
        })?;

    replay_components(path, base, suffix)
}

/// Appends `suffix` to the canonical `base` one component at a time.
///
/// Missing components are appended verbatim, but every candidate is checked
/// with `symlink_metadata` first: a `..` may lead back into existing
/// directories, and a dangling symlink has no canonical form of its own.
fn replay_components(
    original: &Path,
    base: PathBuf,
    suffix: &Path,
) -> Result<PathBuf, PathValidationError> {
    let mut resolved = base;
    let mut pending: VecDeque<OsString> = VecDeque::new();
    push_components(&mut pending, suffix, false);
    let mut hops = 0usize;

    while let Some(part) = pending.pop_front() {
        if part == ".." {
            resolved.pop();
            continue;
        }

        let candidate = resolved.join(&part);
        let is_symlink = std::fs::symlink_metadata(&candidate)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);

        if !is_symlink {
            resolved = candidate;
            continue;
        }

        hops += 1;
        if hops > MAX_SYMLINK_HOPS {
            return Err(PathValidationError::NotFound {
                path: original.to_path_buf(),
                reason: "too many levels of symbolic links".to_string(),
            });
        }

        let target = std::fs::read_link(&candidate).map_err(|e| PathValidationError::NotFound {
            path: candidate.clone(),
            reason: format!("cannot read symbolic link: {e}"),
        })?;

        if target.is_absolute() {
            resolved = PathBuf::from("/");
        }
        push_components(&mut pending, &target, true);
    }

    Ok(resolved)
}

/// Queues the normal and parent components of `path`, either behind or in
/// front of what is already pending.
fn push_components(pending: &mut VecDeque<OsString>, path: &Path, front: bool) {
    let parts: Vec<OsString> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_os_string()),
            Component::ParentDir => Some(OsString::from("..")),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect();

    if front {
        for part in parts.into_iter().rev() {
            pending.push_front(part);
        }
    } else {
        pending.extend(parts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn validator_for(dir: &TempDir) -> PathValidator {
        PathValidator::new(dir.path()).unwrap()
    }

    #[test]
    fn new_canonicalizes_root() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);
        assert_eq!(
            validator.project_root(),
            dir.path().canonicalize().unwrap().as_path()
        );
    }

    #[test]
    fn new_rejects_relative_root() {
        let result = PathValidator::new("relative/root");
        assert!(matches!(
            result,
            Err(PathValidationError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn new_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = PathValidator::new(dir.path().join("missing"));
        assert!(matches!(
            result,
            Err(PathValidationError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn from_current_dir_uses_cwd() {
        let validator = PathValidator::from_current_dir().unwrap();
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(validator.project_root(), cwd.as_path());
    }

    #[test]
    fn validate_succeeds_within_root() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("test.txt");
        fs::write(&file_path, "content").unwrap();

        let validator = validator_for(&dir);
        let result = validator.validate(&file_path, false).unwrap();
        assert_eq!(result, file_path.canonicalize().unwrap());
    }

    #[test]
    fn validate_accepts_root_itself() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);
        let result = validator.validate(dir.path(), false).unwrap();
        assert_eq!(result, validator.project_root());
    }

    #[test]
    fn validate_rejects_relative_path() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);

        for allow in [false, true] {
            let result = validator.validate(Path::new("src/main.rs"), allow);
            assert!(matches!(
                result,
                Err(PathValidationError::NotAbsolute { .. })
            ));
        }
    }

    #[test]
    fn validate_fails_outside_root() {
        let allowed_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let file_path = outside_dir.path().join("test.txt");
        fs::write(&file_path, "content").unwrap();

        let validator = validator_for(&allowed_dir);
        let result = validator.validate(&file_path, false);
        assert!(matches!(
            result,
            Err(PathValidationError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn validate_rejects_traversal_at_any_depth() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let validator = validator_for(&dir);

        for depth in 1..8 {
            let mut candidate = nested.clone();
            for _ in 0..depth + 2 {
                candidate.push("..");
            }
            candidate.push("etc");
            candidate.push("passwd");

            let existing = validator.validate(&candidate, false);
            assert!(existing.is_err(), "depth {depth} accepted");

            let created = validator.validate(&candidate, true);
            assert!(
                matches!(created, Err(PathValidationError::OutsideRoot { .. })),
                "depth {depth} accepted for creation: {created:?}"
            );
        }
    }

    #[test]
    fn validate_rejects_traversal_through_missing_directory() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);
        let candidate = dir
            .path()
            .join("newdir")
            .join("..")
            .join("..")
            .join("escaped.txt");

        let result = validator.validate(&candidate, true);
        assert!(matches!(
            result,
            Err(PathValidationError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn validate_resolves_dot_dot_inside_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("README"), "x").unwrap();
        let validator = validator_for(&dir);

        let result = validator
            .validate(&dir.path().join("src").join("..").join("README"), false)
            .unwrap();
        assert_eq!(result, validator.project_root().join("README"));
    }

    #[test]
    fn validate_fails_for_nonexistent_path() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);

        let result = validator.validate(&dir.path().join("nonexistent.txt"), false);
        assert!(matches!(result, Err(PathValidationError::NotFound { .. })));
    }

    #[test]
    fn validate_reconstructs_nonexistent_nested_path() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);
        let candidate = dir.path().join("newdir").join("newfile.txt");

        let result = validator.validate(&candidate, true).unwrap();
        assert_eq!(
            result,
            dir.path()
                .canonicalize()
                .unwrap()
                .join("newdir")
                .join("newfile.txt")
        );
    }

    #[test]
    fn validate_nonexistent_outside_root_rejected() {
        let allowed_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let validator = validator_for(&allowed_dir);

        let result = validator.validate(&outside_dir.path().join("new_file.txt"), true);
        assert!(matches!(
            result,
            Err(PathValidationError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn validate_str_rejects_empty_and_nul() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);

        assert!(matches!(
            validator.validate_str("", true),
            Err(PathValidationError::NotAPath { .. })
        ));
        assert!(matches!(
            validator.validate_str("/tmp/a\0b", true),
            Err(PathValidationError::NotAPath { .. })
        ));
    }

    #[test]
    fn is_safe_reports_reason() {
        let dir = TempDir::new().unwrap();
        let validator = validator_for(&dir);

        let (ok, reason) = validator.is_safe(Path::new("/"), false);
        if validator.project_root() == Path::new("/") {
            assert!(ok);
        } else {
            assert!(!ok);
            assert!(reason.unwrap().contains("outside project root"));
        }

        let (ok, reason) = validator.is_safe(dir.path(), false);
        assert!(ok);
        assert!(reason.is_none());
    }

    #[test]
    fn filesystem_root_contains_everything() {
        let validator = PathValidator::new("/").unwrap();
        let dir = TempDir::new().unwrap();
        assert!(validator.validate(dir.path(), false).is_ok());
        assert!(validator.validate(&dir.path().join("x/y/z"), true).is_ok());
    }

    #[test]
    fn error_display_outside_root() {
        let err = PathValidationError::OutsideRoot {
            path: PathBuf::from("/outside/path"),
            project_root: PathBuf::from("/allowed/root"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/outside/path"));
        assert!(msg.contains("/allowed/root"));
        assert!(msg.contains("outside project root"));
    }

    #[test]
    fn error_display_not_absolute() {
        let err = PathValidationError::NotAbsolute {
            path: PathBuf::from("src/lib.rs"),
        };
        assert!(err.to_string().contains("must be absolute"));
    }

    #[cfg(unix)]
    #[test]
    fn validate_resolves_symlinks_within_root() {
        let dir = TempDir::new().unwrap();
        let real_file = dir.path().join("real.txt");
        let link = dir.path().join("link.txt");
        fs::write(&real_file, "content").unwrap();
        std::os::unix::fs::symlink(&real_file, &link).unwrap();

        let validator = validator_for(&dir);
        let result = validator.validate(&link, false).unwrap();
        assert_eq!(result, real_file.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn validate_blocks_symlink_escaping_root() {
        let allowed_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let outside_file = outside_dir.path().join("secret.txt");
        fs::write(&outside_file, "secret").unwrap();

        let escape_link = allowed_dir.path().join("escape.txt");
        std::os::unix::fs::symlink(&outside_file, &escape_link).unwrap();

        let validator = validator_for(&allowed_dir);
        for allow in [false, true] {
            let result = validator.validate(&escape_link, allow);
            assert!(matches!(
                result,
                Err(PathValidationError::OutsideRoot { .. })
            ));
        }
    }

    #[cfg(unix)]
    #[test]
    fn validate_blocks_new_file_under_symlinked_directory() {
        let allowed_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let link_dir = allowed_dir.path().join("linked");
        std::os::unix::fs::symlink(outside_dir.path(), &link_dir).unwrap();

        let validator = validator_for(&allowed_dir);
        let result = validator.validate(&link_dir.join("sub").join("new.txt"), true);
        assert!(matches!(
            result,
            Err(PathValidationError::OutsideRoot { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn validate_blocks_dangling_symlink_pointing_outside() {
        let allowed_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let dangling = allowed_dir.path().join("dangling");
        std::os::unix::fs::symlink(outside_dir.path().join("not-yet.txt"), &dangling).unwrap();

        let validator = validator_for(&allowed_dir);
        let result = validator.validate(&dangling, true);
        assert!(matches!(
            result,
            Err(PathValidationError::OutsideRoot { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn validate_follows_dangling_symlink_inside_root() {
        let dir = TempDir::new().unwrap();
        let dangling = dir.path().join("pending");
        std::os::unix::fs::symlink("later.txt", &dangling).unwrap();

        let validator = validator_for(&dir);
        let result = validator.validate(&dangling, true).unwrap();
        assert_eq!(result, validator.project_root().join("later.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn validate_detects_symlink_loops() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::os::unix::fs::symlink(&b, &a).unwrap();
        std::os::unix::fs::symlink(&a, &b).unwrap();

        let validator = validator_for(&dir);
        let result = validator.validate(&a.join("file.txt"), true);
        assert!(matches!(result, Err(PathValidationError::NotFound { .. })));
    }
}
