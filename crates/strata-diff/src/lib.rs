//! Text diff and merge engine for Strata.
//!
//! Reconciles configuration files across filesystem transactions by
//! computing a unified diff between two revisions and applying it back.
//! Everything runs in-process: `similar` produces the diff and [`Patch`]
//! parses and applies it.
//!
//! # Key Types
//!
//! - [`UnifiedDiff`] / [`DiffOutcome`] -- diff text and the identical/differs result
//! - [`Patch`] / [`DiffHunk`] / [`DiffLine`] -- parsed form of a diff
//! - [`ApplyOutcome`] -- what applying a diff did to the destination
//! - [`TextDiffError`] -- computation and patch failures

pub mod apply;
pub mod error;
pub mod files;
pub mod patch;
pub mod unified;

pub use apply::{apply_to_text, ApplyOutcome};
pub use error::{PatchRejected, TextDiffError, TextDiffResult};
pub use files::{apply_diff, compute_diff, merge_diff};
pub use patch::{DiffHunk, DiffLine, Patch};
pub use unified::{diff_texts, DiffOutcome, DiffStat, UnifiedDiff, CONTEXT_LINES};
