//! Structured form of a single-file unified diff.
//!
//! Parsing is delegated to `diffy`; hunks are then copied into owned lines
//! that keep their terminator, so a line without a trailing newline (marked
//! `\ No newline at end of file`) applies byte-exactly. Lines are split on
//! `\n` only; a `\r` is part of the line's content.

use crate::error::PatchRejected;
use crate::unified::CONTEXT_LINES;

/// A parsed unified diff for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    pub hunks: Vec<DiffHunk>,
}

/// A contiguous region of changes in a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old content where this hunk starts (1-based,
    /// 0 when the hunk has no old lines and inserts at the top).
    pub old_start: usize,
    /// Line number in the new content where this hunk starts.
    pub new_start: usize,
    /// The individual diff lines in this hunk.
    pub lines: Vec<DiffLine>,
}

/// A single line in a diff hunk, terminator included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A line present in both old and new (context).
    Context(String),
    /// A line added in the new content.
    Added(String),
    /// A line removed from the old content.
    Removed(String),
}

impl From<&diffy::Line<'_, str>> for DiffLine {
    fn from(line: &diffy::Line<'_, str>) -> Self {
        match line {
            diffy::Line::Context(s) => Self::Context(s.to_string()),
            diffy::Line::Delete(s) => Self::Removed(s.to_string()),
            diffy::Line::Insert(s) => Self::Added(s.to_string()),
        }
    }
}

impl From<&diffy::Hunk<'_, str>> for DiffHunk {
    fn from(hunk: &diffy::Hunk<'_, str>) -> Self {
        Self {
            old_start: hunk.old_range().start(),
            new_start: hunk.new_range().start(),
            lines: hunk.lines().iter().map(DiffLine::from).collect(),
        }
    }
}

impl DiffHunk {
    /// Lines the hunk expects to find.
    pub fn old_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            DiffLine::Context(s) | DiffLine::Removed(s) => Some(s.as_str()),
            DiffLine::Added(_) => None,
        })
    }

    /// Lines the hunk leaves behind.
    pub fn new_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            DiffLine::Context(s) | DiffLine::Added(s) => Some(s.as_str()),
            DiffLine::Removed(_) => None,
        })
    }

    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Added(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, DiffLine::Removed(_)))
            .count()
    }

    fn leading_context(&self) -> usize {
        self.lines
            .iter()
            .take_while(|l| matches!(l, DiffLine::Context(_)))
            .count()
    }

    fn trailing_context(&self) -> usize {
        self.lines
            .iter()
            .rev()
            .take_while(|l| matches!(l, DiffLine::Context(_)))
            .count()
    }

    /// Index into the old content where the hunk was generated.
    fn expected_index(&self) -> usize {
        if self.old_lines().next().is_none() {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }

    fn reversed(&self) -> DiffHunk {
        DiffHunk {
            old_start: self.new_start,
            new_start: self.old_start,
            lines: self
                .lines
                .iter()
                .map(|l| match l {
                    DiffLine::Context(s) => DiffLine::Context(s.clone()),
                    DiffLine::Added(s) => DiffLine::Removed(s.clone()),
                    DiffLine::Removed(s) => DiffLine::Added(s.clone()),
                })
                .collect(),
        }
    }
}

/// Where a hunk may match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    /// Only at the line recorded in the hunk header.
    Recorded,
    /// At the recorded line or the nearest offset after the previous hunk.
    Nearest,
}

impl Patch {
    /// Parse unified diff text for a single file.
    pub fn parse(text: &str) -> Result<Self, PatchRejected> {
        let parsed =
            diffy::Patch::from_str(text).map_err(|e| PatchRejected::Malformed(e.to_string()))?;
        if parsed.hunks().is_empty() {
            return Err(PatchRejected::Malformed("no hunks found".into()));
        }
        Ok(Self {
            hunks: parsed.hunks().iter().map(DiffHunk::from).collect(),
        })
    }

    /// The patch that undoes this one.
    pub fn reverse(&self) -> Patch {
        Patch {
            hunks: self.hunks.iter().map(DiffHunk::reversed).collect(),
        }
    }

    /// Apply the patch to `base`.
    ///
    /// Each hunk must match exactly, at its recorded line or the nearest
    /// offset after the previous hunk. A hunk with less context on one side
    /// than the other was cut short by the start or end of the file and only
    /// matches there.
    pub fn apply(&self, base: &str) -> Result<String, PatchRejected> {
        self.apply_with(base, Placement::Nearest)
    }

    /// Whether every hunk's old side sits in `base` exactly at the line its
    /// header records, touching the file's edges wherever its context was
    /// cut short.
    pub fn matches_in_place(&self, base: &str) -> bool {
        self.apply_with(base, Placement::Recorded).is_ok()
    }

    fn apply_with(&self, base: &str, placement: Placement) -> Result<String, PatchRejected> {
        let image: Vec<&str> = base.split_inclusive('\n').collect();
        let mut out = String::with_capacity(base.len());
        let mut cursor = 0usize;

        for (n, hunk) in self.hunks.iter().enumerate() {
            let pos = find_position(&image, cursor, hunk, placement).ok_or_else(|| {
                PatchRejected::ContextMismatch(format!(
                    "hunk #{} does not match at line {}",
                    n + 1,
                    hunk.old_start
                ))
            })?;

            image[cursor..pos].iter().for_each(|l| out.push_str(l));
            hunk.new_lines().for_each(|l| out.push_str(l));
            cursor = pos + hunk.old_lines().count();
        }
        image[cursor..].iter().for_each(|l| out.push_str(l));

        Ok(out)
    }
}

fn find_position(
    image: &[&str],
    cursor: usize,
    hunk: &DiffHunk,
    placement: Placement,
) -> Option<usize> {
    let old: Vec<&str> = hunk.old_lines().collect();
    if image.len() < old.len() {
        return None;
    }
    let last = image.len() - old.len();
    if cursor > last {
        return None;
    }
    let matches_at = |pos: usize| image[pos..pos + old.len()] == old[..];

    let leading = hunk.leading_context();
    let trailing = hunk.trailing_context();
    let expected = hunk.expected_index();

    if placement == Placement::Recorded {
        // Context shorter than the generated radius means the hunk touches
        // the corresponding edge of the file.
        let at_start = leading >= CONTEXT_LINES || expected == 0;
        let at_end = trailing >= CONTEXT_LINES || expected == last;
        let in_range = expected >= cursor && expected <= last;
        return (in_range && at_start && at_end && matches_at(expected)).then_some(expected);
    }

    if leading < trailing {
        return (cursor == 0 && matches_at(0)).then_some(0);
    }
    if trailing < leading {
        return matches_at(last).then_some(last);
    }

    let expected = expected.clamp(cursor, last);
    let span = (expected - cursor).max(last - expected);
    (0..=span).find_map(|offset| {
        [expected.checked_sub(offset), expected.checked_add(offset)]
            .into_iter()
            .flatten()
            .find(|&pos| pos >= cursor && pos <= last && matches_at(pos))
    })
}
