//! Error types for the text diff engine.

use std::path::PathBuf;

/// Errors that can occur while diffing or patching files.
#[derive(Debug, thiserror::Error)]
pub enum TextDiffError {
    /// One of the inputs could not be read or is not text.
    #[error("cannot compute diff for {}: {reason}", .path.display())]
    DiffComputation { path: PathBuf, reason: String },

    /// The diff does not apply cleanly to the destination.
    #[error("patch does not apply to {}: {reason}", .path.display())]
    PatchApply { path: PathBuf, reason: String },

    /// Writing the patched destination failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a diff was rejected by [`apply_to_text`](crate::apply_to_text).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchRejected {
    /// The diff text is not valid unified-diff syntax.
    #[error("malformed diff: {0}")]
    Malformed(String),

    /// Neither the source nor the target side of the diff matches the text.
    #[error("context mismatch: {0}")]
    ContextMismatch(String),
}

/// Convenience alias for text diff results.
pub type TextDiffResult<T> = Result<T, TextDiffError>;
