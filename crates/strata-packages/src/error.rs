//! Error types for the package diff engine.

use std::path::PathBuf;

/// Errors raised while gathering the version mappings to diff.
///
/// The classification step itself never fails; every variant comes from a
/// collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PackageDiffError {
    /// Local installed versions could not be resolved.
    #[error("cannot resolve local package versions: {0}")]
    Resolution(String),

    /// The package repository was unreachable or answered with bad metadata.
    #[error("repository lookup failed for {package}: {reason}")]
    RepositoryLookup { package: String, reason: String },

    /// The remote image-diff service failed or returned bad data.
    #[error("image diff service error: {0}")]
    RemoteService(String),

    /// The overlay package list exists but could not be read.
    #[error("cannot read overlay package list {}: {source}", .path.display())]
    OverlayList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is unreadable or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias for package diff results.
pub type PackageDiffResult<T> = Result<T, PackageDiffError>;
