//! Package set diff engine for Strata.
//!
//! Tracks how packages change between two manifests: the base image before
//! and after an update, or the user's overlay packages against the latest
//! repository versions.
//!
//! # Key Types
//!
//! - [`PackageDiff`] / [`PackageDiffEntry`] -- the four classification sets
//! - [`Version`] / [`compare_versions`] -- Debian version ordering
//! - [`VersionResolver`] / [`RepositoryLookup`] / [`OverlayPackageSource`] -- collaborator seams
//! - [`DifferClient`] / [`RepositoryClient`] / [`DpkgResolver`] / [`PackageListFile`] -- concrete collaborators
//! - [`StrataConfig`] -- configuration file

pub mod config;
pub mod diff;
pub mod dpkg;
pub mod error;
pub mod overlay;
pub mod remote;
pub mod traits;
pub mod types;
pub mod version;

pub use config::StrataConfig;
pub use diff::diff_packages;
pub use dpkg::DpkgResolver;
pub use error::{PackageDiffError, PackageDiffResult};
pub use overlay::{overlay_package_diff, parse_package_list, PackageListFile};
pub use remote::{
    DifferClient, RemoteServiceConfig, RepoPackageInfo, RepositoryClient, RepositoryConfig,
};
pub use traits::{OverlayPackageSource, RepositoryLookup, VersionResolver};
pub use types::{ChangeKind, PackageDiff, PackageDiffEntry, VersionMap};
pub use version::{compare_versions, Version};
