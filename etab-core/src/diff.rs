//! Line-level diff between two texts.
//!
//! [`compute_diff`] walks both texts position by position. It is not an LCS
//! diff: a line inserted near the top shows every following line as a
//! remove+add pair. That is the accepted trade-off for an interactive preview,
//! and callers (and tests) depend on the exact output shape.

use std::sync::Arc;

/// The type of change for a diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffLineKind {
    /// Present only in the new text.
    Added,
    /// Present only in the old text.
    Removed,
    /// Identical at the same walk position in both texts.
    Unchanged,
}

/// A single row of a line-oriented comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    /// Line text without its line terminator.
    pub content: String,
    /// 1-based line number in the old text (removed / unchanged only).
    pub old_lineno: Option<u32>,
    /// 1-based line number in the new text (added / unchanged only).
    pub new_lineno: Option<u32>,
}

impl DiffLine {
    fn added(content: &str, index: usize) -> Self {
        Self {
            kind: DiffLineKind::Added,
            content: content.to_owned(),
            old_lineno: None,
            new_lineno: Some(lineno(index)),
        }
    }

    fn removed(content: &str, index: usize) -> Self {
        Self {
            kind: DiffLineKind::Removed,
            content: content.to_owned(),
            old_lineno: Some(lineno(index)),
            new_lineno: None,
        }
    }

    fn unchanged(content: &str, old_index: usize, new_index: usize) -> Self {
        Self {
            kind: DiffLineKind::Unchanged,
            content: content.to_owned(),
            old_lineno: Some(lineno(old_index)),
            new_lineno: Some(lineno(new_index)),
        }
    }

    /// Gutter marker: `'+'` added, `'-'` removed, `' '` unchanged.
    pub fn prefix(&self) -> char {
        match self.kind {
            DiffLineKind::Added => '+',
            DiffLineKind::Removed => '-',
            DiffLineKind::Unchanged => ' ',
        }
    }

    /// Line number shown in a single-column gutter: old number first, new
    /// number when the line has no old position.
    pub fn gutter_lineno(&self) -> Option<u32> {
        self.old_lineno.or(self.new_lineno)
    }
}

fn lineno(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Splits `text` into lines the way the diff sees them.
///
/// The empty string has no lines. Otherwise the text is split on `\n` and a
/// single trailing `\r` is dropped from each line, so `"a\n"` is the two lines
/// `"a"` and `""`.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Computes the positional line diff of `old_text` against `new_text`.
///
/// Never fails. The result has at least `max(m, n)` entries where `m` and `n`
/// are the line counts of the two texts.
pub fn compute_diff(old_text: &str, new_text: &str) -> Vec<DiffLine> {
    let old = split_lines(old_text);
    let new = split_lines(new_text);
    let mut out = Vec::with_capacity(old.len().max(new.len()));

    let (mut i, mut j) = (0, 0);
    while i < old.len() || j < new.len() {
        if i >= old.len() {
            out.push(DiffLine::added(new[j], j));
            j += 1;
        } else if j >= new.len() {
            out.push(DiffLine::removed(old[i], i));
            i += 1;
        } else if old[i] == new[j] {
            out.push(DiffLine::unchanged(old[i], i, j));
            i += 1;
            j += 1;
        } else {
            out.push(DiffLine::removed(old[i], i));
            out.push(DiffLine::added(new[j], j));
            i += 1;
            j += 1;
        }
    }
    out
}

/// Per-kind tallies over a diff, used for the `+N -M` badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn tally(lines: &[DiffLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.kind {
                DiffLineKind::Added => stats.added += 1,
                DiffLineKind::Removed => stats.removed += 1,
                DiffLineKind::Unchanged => stats.unchanged += 1,
            }
            stats
        })
    }
}

pub fn added_count(lines: &[DiffLine]) -> usize {
    DiffStats::tally(lines).added
}

pub fn removed_count(lines: &[DiffLine]) -> usize {
    DiffStats::tally(lines).removed
}

/// Text handed to the clipboard collaborator: every line's content, in order,
/// joined with `\n`.
pub fn clipboard_text(lines: &[DiffLine]) -> String {
    lines
        .iter()
        .map(|line| line.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display row over a diff slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffRow<'a> {
    Line(&'a DiffLine),
    /// A removed line directly followed by an added line (a replace pair).
    Modified { old: &'a DiffLine, new: &'a DiffLine },
}

/// Groups replace pairs into [`DiffRow::Modified`] rows for rendering.
///
/// The underlying lines are untouched: counts and clipboard text still see
/// the pair as one removal and one addition.
pub fn pair_replacements(lines: &[DiffLine]) -> Vec<DiffRow<'_>> {
    let mut rows = Vec::with_capacity(lines.len());
    let mut iter = lines.iter().peekable();
    while let Some(line) = iter.next() {
        if line.kind == DiffLineKind::Removed {
            if let Some(next) = iter.next_if(|n| n.kind == DiffLineKind::Added) {
                rows.push(DiffRow::Modified { old: line, new: next });
                continue;
            }
        }
        rows.push(DiffRow::Line(line));
    }
    rows
}

/// A titled diff ready for display and copying.
///
/// Lines are stored behind an `Arc` so the renderer and the copy action can
/// hold the same immutable sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeDiff {
    pub title: String,
    pub filename: Option<String>,
    pub language: String,
    pub lines: Arc<[DiffLine]>,
}

impl CodeDiff {
    /// Diffs `old_code` against `new_code`.
    pub fn from_texts(title: impl Into<String>, old_code: &str, new_code: &str) -> Self {
        Self::from_lines(title, compute_diff(old_code, new_code))
    }

    /// Wraps a precomputed diff as-is.
    pub fn from_lines(title: impl Into<String>, lines: Vec<DiffLine>) -> Self {
        Self {
            title: title.into(),
            filename: None,
            language: "typescript".to_owned(),
            lines: lines.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn stats(&self) -> DiffStats {
        DiffStats::tally(&self.lines)
    }

    pub fn clipboard_text(&self) -> String {
        clipboard_text(&self.lines)
    }

    pub fn rows(&self) -> Vec<DiffRow<'_>> {
        pair_replacements(&self.lines)
    }
}
