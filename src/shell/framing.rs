//! Sentinel framing for the keep-alive shell's output stream.
//!
//! The shell's stdout is one continuous byte stream shared by every command
//! the session runs. After each command the session asks the shell to print
//! a marker line:
//!
//! ```text
//! <sentinel> <sequence> <exit status>
//! ```
//!
//! [`SentinelFramer`] accumulates bytes until it sees the sentinel followed
//! by a line break and then cuts one [`Frame`] off the front of its buffer.
//! Everything before the sentinel is the command's output.

use mti::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

/// TypeID prefix used for sentinel identifiers.
const SENTINEL_PREFIX: &str = "hgshell";

/// ANSI CSI sequences, OSC sequences and the common two-byte escapes.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[()][A-Za-z0-9]|\x1b[=>78cDEHM]",
    )
    .unwrap_or_else(|e| panic!("invalid ANSI escape pattern: {e}"))
});

/// A unique delimiter marking the end of a command's output.
///
/// The marker command prints the sentinel from two separate halves, so a
/// shell trace of the marker command itself (`set -x`) never contains the
/// full sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    head: String,
    tail: String,
}

impl Sentinel {
    /// Generates a fresh sentinel from a time-sortable unique identifier.
    #[must_use]
    pub fn generate() -> Self {
        let id = SENTINEL_PREFIX.create_type_id::<V7>();
        Self::from_text(&format!("__{id}__"))
    }

    /// Builds a sentinel from explicit text.
    ///
    /// The text must be ASCII with no quotes or whitespace; it is split in
    /// two halves for the marker command.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let middle = text.len() / 2;
        Self {
            head: text[..middle].to_string(),
            tail: text[middle..].to_string(),
        }
    }

    /// Returns the full sentinel text.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{}{}", self.head, self.tail)
    }

    /// Returns the shell line that prints this sentinel with the given
    /// sequence number and the previous command's exit status.
    #[must_use]
    pub fn marker_command(&self, sequence: u64) -> String {
        format!(
            "printf '%s%s %s %s\\n' '{}' '{}' {} \"$?\"",
            self.head, self.tail, sequence
        )
    }
}

/// Output of one command, cut from the stream at its sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw output preceding the sentinel (lossily decoded).
    pub body: String,
    /// Sequence number printed with the sentinel.
    pub sequence: Option<u64>,
    /// Exit status printed with the sentinel.
    pub status: Option<i32>,
    /// Bytes dropped from the middle of the body to respect the size limit.
    pub omitted: usize,
}

/// Accumulate-until-delimiter reader state.
#[derive(Debug)]
pub struct SentinelFramer {
    sentinel: Vec<u8>,
    buffer: Vec<u8>,
    /// Offset where the next sentinel search starts.
    scan_from: usize,
    /// Maximum body bytes kept per frame.
    limit: Option<usize>,
    /// Bytes dropped from the current frame so far.
    omitted: usize,
}

impl SentinelFramer {
    /// Creates a framer for the given sentinel text.
    #[must_use]
    pub fn new(sentinel: impl Into<Vec<u8>>) -> Self {
        Self {
            sentinel: sentinel.into(),
            buffer: Vec::new(),
            scan_from: 0,
            limit: None,
            omitted: 0,
        }
    }

    /// Caps the number of body bytes buffered for a single frame.
    ///
    /// Output beyond the cap is dropped as it arrives and reported through
    /// [`Frame::omitted`].
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Appends bytes read from the stream.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet framed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drops everything buffered so far.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scan_from = 0;
        self.omitted = 0;
    }

    /// Cuts the next complete frame off the buffer, if one has arrived.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let mut start = self.find_sentinel()?;
        if let Some(limit) = self.limit.filter(|&limit| start > limit) {
            self.buffer.drain(limit..start);
            self.omitted += start - limit;
            start = limit;
        }
        let after = start + self.sentinel.len();

        let Some(offset) = self.buffer[after..].iter().position(|&b| b == b'\n') else {
            // Trailer still in flight; resume at the same sentinel.
            self.scan_from = start;
            return None;
        };
        let newline = after + offset;

        let body = String::from_utf8_lossy(&self.buffer[..start]).into_owned();
        let trailer = String::from_utf8_lossy(&self.buffer[after..newline]).into_owned();
        self.buffer.drain(..=newline);
        self.scan_from = 0;

        let mut fields = trailer.split_whitespace();
        let sequence = fields.next().and_then(|s| s.parse().ok());
        let status = fields.next().and_then(|s| s.parse().ok());

        Some(Frame {
            body,
            sequence,
            status,
            omitted: std::mem::take(&mut self.omitted),
        })
    }

    fn find_sentinel(&mut self) -> Option<usize> {
        let width = self.sentinel.len();
        if width == 0 || self.buffer.len() < width {
            return None;
        }

        let from = self.scan_from.min(self.buffer.len());
        let found = self.buffer[from..]
            .windows(width)
            .position(|window| window == self.sentinel.as_slice())
            .map(|pos| from + pos);

        if found.is_none() {
            // A sentinel may straddle the next chunk boundary.
            self.scan_from = self.buffer.len() + 1 - width;
            self.enforce_limit();
        }
        found
    }

    /// Drops scanned bytes past the limit. Bytes before `scan_from` are known
    /// not to start a sentinel, so they can go without losing a delimiter.
    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.scan_from > limit {
            self.buffer.drain(limit..self.scan_from);
            self.omitted += self.scan_from - limit;
            self.scan_from = limit;
        }
    }
}

/// Removes ANSI escape sequences from text.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Turns a raw frame body into the text handed back to callers.
///
/// Strips escape sequences and carriage returns, drops a leading echo of the
/// command line, trims trailing whitespace per line, and trims surrounding
/// blank lines.
#[must_use]
pub fn clean_output(raw: &str, command: &str) -> String {
    let stripped = strip_ansi(raw).replace('\r', "");
    let mut lines: Vec<&str> = stripped.lines().map(str::trim_end).collect();

    if lines
        .first()
        .is_some_and(|first| first.trim() == command.trim())
    {
        lines.remove(0);
    }

    lines.join("\n").trim_matches('\n').to_string()
}
