//! Unified diff generation.
//!
//! Uses the `similar` crate (Myers diff algorithm) to render the standard
//! `---`/`+++`/`@@` text format with three lines of context. Lines end at
//! `\n` only, so `\r` stays part of a line's content and CRLF or CR-only
//! text round-trips through [`Patch`].

use std::fmt;
use std::ops::Range;

use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffTag};

use crate::error::PatchRejected;
use crate::patch::Patch;

/// Number of unchanged lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

/// Unified diff text. Treated as an opaque blob by callers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnifiedDiff(String);

impl UnifiedDiff {
    /// The "no diff" value. Applying it never changes anything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap diff text produced elsewhere (e.g. read from a patch file).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Summarize the diff: hunk count and added/removed lines.
    pub fn stat(&self) -> Result<DiffStat, PatchRejected> {
        if self.is_empty() {
            return Ok(DiffStat::default());
        }
        let patch = Patch::parse(&self.0)?;
        let stat = DiffStat {
            hunks: patch.hunks.len(),
            additions: patch.hunks.iter().map(|h| h.additions()).sum(),
            deletions: patch.hunks.iter().map(|h| h.deletions()).sum(),
        };
        Ok(stat)
    }
}

impl fmt::Display for UnifiedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Line counts of a unified diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub hunks: usize,
    pub additions: usize,
    pub deletions: usize,
}

/// Result of comparing two revisions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Both revisions are byte-identical.
    Identical,
    /// The revisions differ; the diff turns the first into the second.
    Differs(UnifiedDiff),
}

impl DiffOutcome {
    pub fn is_identical(&self) -> bool {
        matches!(self, Self::Identical)
    }

    /// The diff text, empty for identical revisions.
    pub fn into_diff(self) -> UnifiedDiff {
        match self {
            Self::Identical => UnifiedDiff::empty(),
            Self::Differs(diff) => diff,
        }
    }
}

/// Compute the unified diff that turns `old` into `new`.
///
/// The labels end up in the `---` and `+++` header lines.
pub fn diff_texts(old: &str, new: &str, old_label: &str, new_label: &str) -> DiffOutcome {
    if old == new {
        return DiffOutcome::Identical;
    }

    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();
    let ops = capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines);

    let mut text = format!("--- {old_label}\n+++ {new_label}\n");
    for group in group_diff_ops(ops, CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;
        text.push_str(&format!(
            "@@ -{} +{} @@\n",
            hunk_range(&old_range),
            hunk_range(&new_range)
        ));

        for op in &group {
            let (tag, old_span, new_span) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => push_lines(&mut text, ' ', &old_lines[old_span]),
                DiffTag::Delete => push_lines(&mut text, '-', &old_lines[old_span]),
                DiffTag::Insert => push_lines(&mut text, '+', &new_lines[new_span]),
                DiffTag::Replace => {
                    push_lines(&mut text, '-', &old_lines[old_span]);
                    push_lines(&mut text, '+', &new_lines[new_span]);
                }
            }
        }
    }

    DiffOutcome::Differs(UnifiedDiff(text))
}

/// `start,len` with a 1-based start; a one-line range omits the length and
/// an empty range points at the line before it.
fn hunk_range(range: &Range<usize>) -> String {
    match range.len() {
        0 => format!("{},0", range.start),
        1 => format!("{}", range.start + 1),
        len => format!("{},{}", range.start + 1, len),
    }
}

fn push_lines(text: &mut String, tag: char, lines: &[&str]) {
    for line in lines {
        text.push(tag);
        text.push_str(line);
        if !line.ends_with('\n') {
            text.push_str("\n\\ No newline at end of file\n");
        }
    }
}
