//! Two-way patch application.
//!
//! When the diff's target side sits in the text exactly where the diff
//! recorded it, the text already carries the change and is returned
//! untouched. Otherwise the diff is applied forward, searching for its source
//! side near the recorded lines. A text that matches the target side only
//! after searching is also left alone. Anything else is a context mismatch.

use std::borrow::Cow;

use tracing::debug;

use crate::error::PatchRejected;
use crate::patch::Patch;
use crate::unified::UnifiedDiff;

/// What applying a diff did to the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The diff was empty.
    NoChanges,
    /// The destination already matched the diff's target side.
    AlreadyApplied,
    /// The destination was rewritten.
    Applied { hunks: usize },
}

impl ApplyOutcome {
    /// Whether the destination content changed.
    pub fn modified(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Apply `diff` to `base`, returning the resulting text.
///
/// The returned text borrows `base` whenever nothing had to change.
pub fn apply_to_text<'a>(
    base: &'a str,
    diff: &UnifiedDiff,
) -> Result<(ApplyOutcome, Cow<'a, str>), PatchRejected> {
    if diff.is_empty() {
        return Ok((ApplyOutcome::NoChanges, Cow::Borrowed(base)));
    }

    let patch = Patch::parse(diff.as_str())?;
    let reverse = patch.reverse();

    if reverse.matches_in_place(base) {
        debug!("target side already in place, skipping");
        return Ok((ApplyOutcome::AlreadyApplied, Cow::Borrowed(base)));
    }

    match patch.apply(base) {
        Ok(patched) => {
            let hunks = patch.hunks.len();
            debug!(hunks, "diff applied");
            Ok((ApplyOutcome::Applied { hunks }, Cow::Owned(patched)))
        }
        Err(forward) => {
            if reverse.apply(base).is_ok() {
                debug!("target side already present, skipping");
                Ok((ApplyOutcome::AlreadyApplied, Cow::Borrowed(base)))
            } else {
                Err(forward)
            }
        }
    }
}
