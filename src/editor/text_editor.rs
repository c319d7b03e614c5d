//! Path-confined file viewing and editing.

use crate::editor::FileOperationError;
use crate::security::PathValidator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A 1-indexed, inclusive line range for [`TextEditor::view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRange {
    /// First line to show.
    pub start: usize,
    /// Last line to show; `None` reads to the end of the file.
    pub end: Option<usize>,
}

impl ViewRange {
    /// Creates a range from `start` to `end` inclusive.
    #[must_use]
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Parses the `[start, end]` form used at the tool boundary, where an end
    /// of `-1` means "to end of file".
    ///
    /// # Errors
    ///
    /// Returns an error unless the slice holds exactly two integers with a
    /// positive start and an end that is `-1` or positive.
    pub fn from_slice(values: &[i64]) -> Result<Self, FileOperationError> {
        let [start, end] = values else {
            return Err(FileOperationError::invalid_view_range(
                "it should be a list of two integers",
            ));
        };

        let start = usize::try_from(*start)
            .ok()
            .filter(|s| *s >= 1)
            .ok_or_else(|| {
                FileOperationError::invalid_view_range(format!(
                    "{values:?}; the start line `{start}` must be 1 or greater"
                ))
            })?;

        let end = match *end {
            -1 => None,
            e if e >= 1 => Some(e as usize),
            e => {
                return Err(FileOperationError::invalid_view_range(format!(
                    "{values:?}; the end line `{e}` should be -1 or a line number"
                )))
            }
        };

        Ok(Self { start, end })
    }
}

/// File operations confined to a project root.
///
/// Every operation rejects relative paths with a suggested absolute path,
/// runs the path through the [`PathValidator`], and then works on the
/// validated path only. Mutating operations are serialized.
#[derive(Debug)]
pub struct TextEditor {
    validator: Arc<PathValidator>,
    write_lock: Mutex<()>,
}

impl TextEditor {
    /// Creates an editor confined by the given validator.
    #[must_use]
    pub fn new(validator: Arc<PathValidator>) -> Self {
        Self {
            validator,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the validator confining this editor.
    #[must_use]
    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    /// Checks that `path` is absolute and inside the project root.
    ///
    /// # Errors
    ///
    /// Returns `NotAbsolute` for relative paths and `InvalidPath` when the
    /// validator rejects the path.
    pub fn validate_path(
        &self,
        path: &Path,
        allow_nonexistent: bool,
    ) -> Result<PathBuf, FileOperationError> {
        if !path.is_absolute() {
            let suggestion = self.validator.project_root().join(path);
            return Err(FileOperationError::not_absolute(path, suggestion));
        }

        self.validator
            .validate(path, allow_nonexistent)
            .map_err(|e| {
                warn!(path = %path.display(), error = %e, "path rejected");
                FileOperationError::from(e)
            })
    }

    /// Returns file content with each line prefixed by its line number.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid, not a regular file, cannot be
    /// read, or the range starts past the end of the file.
    pub async fn view(
        &self,
        path: &Path,
        range: Option<ViewRange>,
    ) -> Result<String, FileOperationError> {
        let resolved = self.existing_file(path)?;
        let content = read(&resolved).await?;

        let Some(range) = range else {
            return Ok(number_lines(&content.lines().collect::<Vec<_>>(), 1));
        };

        // Ranges count the empty line after a final newline.
        let lines: Vec<&str> = content.split('\n').collect();
        let count = lines.len();
        if range.start > count {
            return Err(FileOperationError::invalid_view_range(format!(
                "the start line `{}` should be within the range of lines in the file: [1, {count}]",
                range.start
            )));
        }

        let end = match range.end {
            None => count,
            Some(end) if end < range.start => {
                return Err(FileOperationError::invalid_view_range(format!(
                    "the end line `{end}` should be -1 or within the range of lines in the file: [{}, {count}]",
                    range.start
                )));
            }
            Some(end) => end.min(count),
        };

        let mut shown = &lines[range.start - 1..end];
        if let [rest @ .., ""] = shown {
            shown = rest;
        }
        Ok(number_lines(shown, range.start))
    }

    /// Creates or overwrites a file, creating parent directories as needed.
    ///
    /// Returns the validated path that was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid, names a directory, or the
    /// write fails.
    pub async fn create(&self, path: &Path, content: &str) -> Result<PathBuf, FileOperationError> {
        let resolved = self.validate_path(path, true)?;
        if resolved.is_dir() {
            return Err(FileOperationError::is_a_directory(resolved));
        }

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FileOperationError::io(parent, "create directory", e.to_string()))?;
        }
        write(&resolved, content).await?;

        debug!(path = %resolved.display(), bytes = content.len(), "file created");
        Ok(resolved)
    }

    /// Replaces every occurrence of `old` with `new` (or removes them when
    /// `new` is `None`) and returns the number of occurrences.
    ///
    /// # Errors
    ///
    /// Returns an error if `old` is empty or absent from the file, or if the
    /// path is invalid or the file cannot be read or written.
    pub async fn str_replace(
        &self,
        path: &Path,
        old: &str,
        new: Option<&str>,
    ) -> Result<usize, FileOperationError> {
        if old.is_empty() {
            return Err(FileOperationError::empty_search_string());
        }
        let resolved = self.existing_file(path)?;

        let _guard = self.write_lock.lock().await;
        let content = read(&resolved).await?;
        let occurrences = content.matches(old).count();
        if occurrences == 0 {
            return Err(FileOperationError::string_not_found(resolved));
        }

        let updated = content.replace(old, new.unwrap_or_default());
        write(&resolved, &updated).await?;

        debug!(path = %resolved.display(), occurrences, "replaced text");
        Ok(occurrences)
    }

    /// Inserts `text` as new line(s) after the 1-indexed `after_line`;
    /// `0` inserts at the start of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if `after_line` is past the last line, or if the path
    /// is invalid or the file cannot be read or written.
    pub async fn insert(
        &self,
        path: &Path,
        after_line: usize,
        text: &str,
    ) -> Result<(), FileOperationError> {
        let resolved = self.existing_file(path)?;

        let _guard = self.write_lock.lock().await;
        let content = read(&resolved).await?;
        let mut lines: Vec<&str> = content.lines().collect();
        if after_line > lines.len() {
            return Err(FileOperationError::invalid_insert_line(
                after_line,
                lines.len(),
            ));
        }

        lines.insert(after_line, text);
        let mut updated = lines.join("\n");
        if content.ends_with('\n') {
            updated.push('\n');
        }
        write(&resolved, &updated).await?;

        debug!(path = %resolved.display(), after_line, "inserted text");
        Ok(())
    }

    fn existing_file(&self, path: &Path) -> Result<PathBuf, FileOperationError> {
        let resolved = self.validate_path(path, false)?;
        if !resolved.is_file() {
            return Err(FileOperationError::not_a_file(resolved));
        }
        Ok(resolved)
    }
}

async fn read(path: &Path) -> Result<String, FileOperationError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FileOperationError::io(path, "read", e.to_string()))
}

async fn write(path: &Path, content: &str) -> Result<(), FileOperationError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| FileOperationError::io(path, "write", e.to_string()))
}

/// Prefixes each line with its number, right-aligned to width 3.
fn number_lines(lines: &[&str], first: usize) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>3} {line}", first + i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::FileOperationErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn editor_for(dir: &TempDir) -> TextEditor {
        TextEditor::new(Arc::new(PathValidator::new(dir.path()).unwrap()))
    }

    fn root(editor: &TextEditor) -> PathBuf {
        editor.validator().project_root().to_path_buf()
    }

    #[test]
    fn view_range_from_slice() {
        assert_eq!(
            ViewRange::from_slice(&[2, -1]).unwrap(),
            ViewRange::new(2, None)
        );
        assert_eq!(
            ViewRange::from_slice(&[1, 3]).unwrap(),
            ViewRange::new(1, Some(3))
        );
        assert!(ViewRange::from_slice(&[1]).is_err());
        assert!(ViewRange::from_slice(&[1, 2, 3]).is_err());
        assert!(ViewRange::from_slice(&[0, 2]).is_err());
        assert!(ViewRange::from_slice(&[1, 0]).is_err());
    }

    #[tokio::test]
    async fn view_numbers_lines() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "alpha\nbeta\ngamma\n").unwrap();

        let output = editor.view(&file, None).await.unwrap();
        assert_eq!(output, "  1 alpha\n  2 beta\n  3 gamma");
    }

    #[tokio::test]
    async fn view_range_slices_and_clamps() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "one\ntwo\nthree\nfour\n").unwrap();

        let middle = editor
            .view(&file, Some(ViewRange::new(2, Some(3))))
            .await
            .unwrap();
        assert_eq!(middle, "  2 two\n  3 three");

        let tail = editor.view(&file, Some(ViewRange::new(3, None))).await.unwrap();
        assert_eq!(tail, "  3 three\n  4 four");

        let clamped = editor
            .view(&file, Some(ViewRange::new(4, Some(99))))
            .await
            .unwrap();
        assert_eq!(clamped, "  4 four");
    }

    #[tokio::test]
    async fn view_range_rejects_bad_bounds() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "one\ntwo\n").unwrap();

        let past_end = editor
            .view(&file, Some(ViewRange::new(5, None)))
            .await
            .unwrap_err();
        assert!(matches!(
            past_end.kind,
            FileOperationErrorKind::InvalidViewRange { .. }
        ));

        let inverted = editor
            .view(&file, Some(ViewRange::new(2, Some(1))))
            .await
            .unwrap_err();
        assert!(inverted.to_string().contains("end line `1`"));
    }

    #[tokio::test]
    async fn view_range_counts_line_after_final_newline() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let base = root(&editor);

        let empty = base.join("empty.txt");
        fs::write(&empty, "").unwrap();
        let whole = editor
            .view(&empty, Some(ViewRange::new(1, None)))
            .await
            .unwrap();
        assert_eq!(whole, "");

        let file = base.join("ab.txt");
        fs::write(&file, "a\nb\n").unwrap();
        let after_last = editor
            .view(&file, Some(ViewRange::new(3, None)))
            .await
            .unwrap();
        assert_eq!(after_last, "");

        let both = editor
            .view(&file, Some(ViewRange::new(1, Some(3))))
            .await
            .unwrap();
        assert_eq!(both, "  1 a\n  2 b");

        let past_end = editor
            .view(&file, Some(ViewRange::new(4, None)))
            .await
            .unwrap_err();
        assert!(past_end.to_string().contains("[1, 3]"));
    }

    #[tokio::test]
    async fn view_rejects_directory_and_missing_file() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let base = root(&editor);
        fs::create_dir(base.join("sub")).unwrap();

        let not_file = editor.view(&base.join("sub"), None).await.unwrap_err();
        assert!(matches!(not_file.kind, FileOperationErrorKind::NotAFile { .. }));

        let missing = editor.view(&base.join("nope.txt"), None).await.unwrap_err();
        assert!(matches!(
            &missing.kind,
            FileOperationErrorKind::InvalidPath(e) if e.is_not_found()
        ));
    }

    #[tokio::test]
    async fn relative_path_gets_suggestion() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);

        let error = editor.view(Path::new("src/main.rs"), None).await.unwrap_err();
        match error.kind {
            FileOperationErrorKind::NotAbsolute { suggestion, .. } => {
                assert_eq!(suggestion, root(&editor).join("src/main.rs"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn operations_reject_paths_outside_root() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("secret.txt");
        fs::write(&target, "secret").unwrap();
        let editor = editor_for(&dir);

        assert!(editor.view(&target, None).await.unwrap_err().is_outside_root());
        assert!(editor
            .create(&outside.path().join("new.txt"), "x")
            .await
            .unwrap_err()
            .is_outside_root());
        assert!(editor
            .str_replace(&target, "secret", Some("leaked"))
            .await
            .unwrap_err()
            .is_outside_root());
        assert_eq!(fs::read_to_string(&target).unwrap(), "secret");
    }

    #[tokio::test]
    async fn create_makes_parent_directories() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("newdir/deeper/file.txt");

        let written = editor.create(&file, "content").await.unwrap();
        assert_eq!(written, file);
        assert_eq!(fs::read_to_string(&file).unwrap(), "content");

        editor.create(&file, "replaced").await.unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "replaced");
    }

    #[tokio::test]
    async fn create_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let sub = root(&editor).join("sub");
        fs::create_dir(&sub).unwrap();

        let error = editor.create(&sub, "x").await.unwrap_err();
        assert!(matches!(error.kind, FileOperationErrorKind::IsADirectory { .. }));
    }

    #[tokio::test]
    async fn create_rejects_traversal_through_new_directory() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let sneaky = root(&editor).join("newdir/../../escaped.txt");

        let error = editor.create(&sneaky, "x").await.unwrap_err();
        assert!(error.is_outside_root());
    }

    #[tokio::test]
    async fn str_replace_counts_all_occurrences() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "foo bar foo baz foo").unwrap();

        let count = editor.str_replace(&file, "foo", Some("qux")).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(fs::read_to_string(&file).unwrap(), "qux bar qux baz qux");
    }

    #[tokio::test]
    async fn str_replace_without_new_deletes() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "keep drop keep drop").unwrap();

        let count = editor.str_replace(&file, " drop", None).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(&file).unwrap(), "keep keep");
    }

    #[tokio::test]
    async fn str_replace_missing_and_empty_strings() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "hello").unwrap();

        let missing = editor.str_replace(&file, "absent", Some("x")).await.unwrap_err();
        assert!(matches!(missing.kind, FileOperationErrorKind::StringNotFound { .. }));

        let empty = editor.str_replace(&file, "", Some("x")).await.unwrap_err();
        assert_eq!(empty, FileOperationError::empty_search_string());
        assert_eq!(fs::read_to_string(&file).unwrap(), "hello");
    }

    #[tokio::test]
    async fn insert_boundaries() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "a\nb\n").unwrap();

        editor.insert(&file, 0, "X").await.unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "X\na\nb\n");

        editor.insert(&file, 3, "Y").await.unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "X\na\nb\nY\n");

        editor.insert(&file, 2, "Z").await.unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "X\na\nZ\nb\nY\n");

        let error = editor.insert(&file, 6, "W").await.unwrap_err();
        assert_eq!(error, FileOperationError::invalid_insert_line(6, 5));
    }

    #[tokio::test]
    async fn insert_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let file = root(&editor).join("a.txt");
        fs::write(&file, "a\nb").unwrap();

        editor.insert(&file, 2, "c").await.unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "a\nb\nc");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn edits_follow_symlink_inside_root() {
        let dir = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let base = root(&editor);
        let real = base.join("real.txt");
        let link = base.join("link.txt");
        fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        editor.str_replace(&link, "old", Some("new")).await.unwrap();
        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn create_through_escaping_symlink_is_rejected() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let editor = editor_for(&dir);
        let link = root(&editor).join("escape");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let error = editor.create(&link.join("planted.txt"), "x").await.unwrap_err();
        assert!(error.is_outside_root());
        assert!(!outside.path().join("planted.txt").exists());
    }
}
