//! File-level diff, apply and merge.
//!
//! These operations are synchronous and do no locking: callers merging into
//! the same destination concurrently must serialize on their own.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::apply::{apply_to_text, ApplyOutcome};
use crate::error::{TextDiffError, TextDiffResult};
use crate::unified::{diff_texts, DiffOutcome, UnifiedDiff};

/// Compute the unified diff that turns `source` into `dest`.
///
/// Returns [`DiffOutcome::Identical`] when the files are byte-identical.
/// Missing, unreadable or non-UTF-8 files are a
/// [`TextDiffError::DiffComputation`].
pub fn compute_diff(source: &Path, dest: &Path) -> TextDiffResult<DiffOutcome> {
    debug!(source = %source.display(), dest = %dest.display(), "diffing files");

    let old = read_for_diff(source)?;
    let new = read_for_diff(dest)?;

    if old == new {
        debug!("no diff found");
        return Ok(DiffOutcome::Identical);
    }

    let old = as_text(source, &old)?;
    let new = as_text(dest, &new)?;

    let outcome = diff_texts(
        old,
        new,
        &source.display().to_string(),
        &dest.display().to_string(),
    );
    debug!(identical = outcome.is_identical(), "diff computed");
    Ok(outcome)
}

/// Apply `diff` to `dest` in place.
///
/// An empty diff never touches the file. When the diff applies, the new
/// content is written to a temporary file next to `dest` and renamed over it,
/// so a failure never leaves `dest` half-written.
pub fn apply_diff(dest: &Path, diff: &UnifiedDiff) -> TextDiffResult<ApplyOutcome> {
    if diff.is_empty() {
        debug!(dest = %dest.display(), "no changes to apply");
        return Ok(ApplyOutcome::NoChanges);
    }
    debug!(dest = %dest.display(), "applying diff");

    let bytes = fs::read(dest).map_err(|e| TextDiffError::PatchApply {
        path: dest.to_path_buf(),
        reason: e.to_string(),
    })?;
    let base = std::str::from_utf8(&bytes).map_err(|_| TextDiffError::PatchApply {
        path: dest.to_path_buf(),
        reason: "destination is not valid UTF-8 text".into(),
    })?;

    let (outcome, patched) =
        apply_to_text(base, diff).map_err(|rejected| TextDiffError::PatchApply {
            path: dest.to_path_buf(),
            reason: rejected.to_string(),
        })?;

    if outcome.modified() {
        write_atomically(dest, patched.as_bytes())?;
    }
    debug!(?outcome, "diff applied");
    Ok(outcome)
}

/// Merge the differences between `source` and `dest` into `dest`.
///
/// Equivalent to `apply_diff(dest, compute_diff(source, dest))`; the apply
/// step is skipped if computing the diff fails.
pub fn merge_diff(source: &Path, dest: &Path) -> TextDiffResult<ApplyOutcome> {
    info!(source = %source.display(), dest = %dest.display(), "merging");

    let diff = compute_diff(source, dest)?.into_diff();
    let outcome = apply_diff(dest, &diff)?;

    info!(?outcome, "merge completed");
    Ok(outcome)
}

fn read_for_diff(path: &Path) -> TextDiffResult<Vec<u8>> {
    fs::read(path).map_err(|e| TextDiffError::DiffComputation {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn as_text<'a>(path: &Path, bytes: &'a [u8]) -> TextDiffResult<&'a str> {
    std::str::from_utf8(bytes).map_err(|_| TextDiffError::DiffComputation {
        path: path.to_path_buf(),
        reason: "not valid UTF-8 text".into(),
    })
}

fn write_atomically(path: &Path, contents: &[u8]) -> TextDiffResult<()> {
    let io_err = |source: std::io::Error| TextDiffError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map_err(io_err)?.permissions();

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.as_file().set_permissions(permissions).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
