//! Line-level correspondence between a reference text and the current buffer text.
//!
//! Historical metadata (blame, diff status) is computed against a *reference* snapshot of a file.
//! Once the buffer is edited, every current line has to be attributed back to a reference line
//! (or classified as new). This module produces that mapping:
//!
//! - [`LineStatus::Unchanged`] lines carry the 1-based reference line they came from
//! - [`LineStatus::Modified`] lines replace reference lines positionally inside a replace block
//! - [`LineStatus::Added`] lines have no reference counterpart
//!
//! Deleted reference lines produce no entry: the mapping is indexed by *current* lines only.
//!
//! # Example
//!
//! ```rust
//! use editor_overlay::{LineStatus, compute_line_diff};
//!
//! let result = compute_line_diff("a\nb\nc\n", "a\nX\nc\nd\n");
//! assert!(result.has_changes);
//! assert_eq!(result.status(2), LineStatus::Modified);
//! assert_eq!(result.status(4), LineStatus::Added);
//! assert_eq!(result.original_line(3), Some(3));
//! ```

use similar::{Algorithm, DiffOp, capture_diff_slices};

/// Classification of a single current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStatus {
    /// The line exists verbatim in the reference text.
    Unchanged,
    /// The line replaced a reference line (positional pairing inside a replace block).
    Modified,
    /// The line has no reference counterpart.
    Added,
}

/// Mapping for one line of the current text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMapping {
    /// 1-based line number in the current text.
    pub current_line: usize,
    /// 1-based line number in the reference text; `Some` iff `status == Unchanged`.
    pub original_line: Option<usize>,
    /// Line classification.
    pub status: LineStatus,
}

/// Result of [`compute_line_diff`].
///
/// `mappings[i].current_line == i + 1` for every entry, and the three counts always sum to
/// `mappings.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineDiffResult {
    /// One entry per current line, ordered by `current_line`.
    pub mappings: Vec<LineMapping>,
    /// `true` if any line is `Added` or `Modified`.
    pub has_changes: bool,
    /// Number of `Added` lines.
    pub added_count: usize,
    /// Number of `Modified` lines.
    pub modified_count: usize,
    /// Number of `Unchanged` lines.
    pub unchanged_count: usize,
}

impl LineDiffResult {
    /// Reference line for a 1-based current line (see [`original_line_number`]).
    pub fn original_line(&self, current_line: usize) -> Option<usize> {
        original_line_number(&self.mappings, current_line)
    }

    /// Status of a 1-based current line (see [`line_status`]).
    pub fn status(&self, current_line: usize) -> LineStatus {
        line_status(&self.mappings, current_line)
    }

    /// Iterate over every `Added`/`Modified` mapping.
    pub fn changed_lines(&self) -> impl Iterator<Item = &LineMapping> + '_ {
        self.mappings
            .iter()
            .filter(|m| m.status != LineStatus::Unchanged)
    }

    fn push(&mut self, status: LineStatus, original_line: Option<usize>) {
        let current_line = self.mappings.len() + 1;
        match status {
            LineStatus::Unchanged => self.unchanged_count += 1,
            LineStatus::Modified => self.modified_count += 1,
            LineStatus::Added => self.added_count += 1,
        }
        self.mappings.push(LineMapping {
            current_line,
            original_line,
            status,
        });
    }

    fn push_replacement(&mut self, deleted: usize, inserted: usize) {
        let modified = deleted.min(inserted);
        for _ in 0..modified {
            self.push(LineStatus::Modified, None);
        }
        for _ in modified..inserted {
            self.push(LineStatus::Added, None);
        }
    }
}

/// Line diff algorithm used to align reference and current lines.
///
/// Every strategy honors the same replace-block classification; they only differ in how
/// ambiguous alignments are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineDiffStrategy {
    /// Myers' O(ND) diff.
    #[default]
    Myers,
    /// Patience diff (anchors on unique lines; tends to produce more readable blocks).
    Patience,
    /// Classic longest-common-subsequence diff.
    Lcs,
}

impl LineDiffStrategy {
    fn algorithm(self) -> Algorithm {
        match self {
            Self::Myers => Algorithm::Myers,
            Self::Patience => Algorithm::Patience,
            Self::Lcs => Algorithm::Lcs,
        }
    }

    /// Compute the line mapping from `reference` to `current` with this strategy.
    pub fn compute(self, reference: &str, current: &str) -> LineDiffResult {
        let current_lines = split_lines(current);

        if reference == current {
            let mut result = LineDiffResult {
                mappings: Vec::with_capacity(current_lines.len()),
                ..LineDiffResult::default()
            };
            for line in 1..=current_lines.len() {
                result.push(LineStatus::Unchanged, Some(line));
            }
            return result;
        }

        let reference_lines = split_lines(reference);
        let ops = capture_diff_slices(self.algorithm(), &reference_lines, &current_lines);

        let mut result = LineDiffResult {
            mappings: Vec::with_capacity(current_lines.len()),
            ..LineDiffResult::default()
        };
        // Length of a deletion block that directly precedes the next op.
        let mut pending_deleted = 0usize;

        for op in ops {
            match op {
                DiffOp::Equal { old_index, len, .. } => {
                    pending_deleted = 0;
                    for i in 0..len {
                        result.push(LineStatus::Unchanged, Some(old_index + i + 1));
                    }
                }
                DiffOp::Delete { old_len, .. } => {
                    pending_deleted += old_len;
                }
                DiffOp::Insert { new_len, .. } => {
                    result.push_replacement(pending_deleted, new_len);
                    pending_deleted = 0;
                }
                DiffOp::Replace {
                    old_len, new_len, ..
                } => {
                    result.push_replacement(pending_deleted + old_len, new_len);
                    pending_deleted = 0;
                }
            }
        }

        result.has_changes = result.added_count > 0 || result.modified_count > 0;
        result
    }
}

/// Split text into lines using `'\n'` as the only separator.
///
/// A trailing newline terminates the last line instead of starting an empty one, so
/// `"a\nb\n"` has two lines, `"\n"` has one empty line and `""` has none.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.strip_suffix('\n').unwrap_or(text).split('\n').collect()
}

/// Number of lines in `text`, consistent with [`split_lines`].
pub fn line_count(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let newlines = text.bytes().filter(|&b| b == b'\n').count();
    if text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Compute the line mapping from `reference` to `current` using the default (Myers) strategy.
///
/// This is total over all string pairs.
pub fn compute_line_diff(reference: &str, current: &str) -> LineDiffResult {
    LineDiffStrategy::default().compute(reference, current)
}

/// Reference line for a 1-based current line, or `None` if the line is not `Unchanged` or lies
/// outside the mapping.
pub fn original_line_number(mappings: &[LineMapping], current_line: usize) -> Option<usize> {
    current_line
        .checked_sub(1)
        .and_then(|idx| mappings.get(idx))
        .and_then(|m| m.original_line)
}

/// Status of a 1-based current line.
///
/// Lines outside the mapping are reported as [`LineStatus::Added`]: a line beyond the last known
/// mapping is assumed to be newly typed.
pub fn line_status(mappings: &[LineMapping], current_line: usize) -> LineStatus {
    current_line
        .checked_sub(1)
        .and_then(|idx| mappings.get(idx))
        .map_or(LineStatus::Added, |m| m.status)
}
