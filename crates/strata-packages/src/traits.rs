use crate::error::PackageDiffResult;
use crate::remote::RepoPackageInfo;
use crate::types::VersionMap;

/// Resolves the locally installed version of packages.
///
/// Implementations must return an entry for every requested name, using an
/// empty version for packages that are not installed or unknown.
pub trait VersionResolver: Send + Sync {
    fn resolve_versions(&self, names: &[String]) -> PackageDiffResult<VersionMap>;
}

/// Looks up package metadata in a remote repository.
///
/// Returns `Err` if the repository is unreachable or the response lacks a
/// usable `version` field.
pub trait RepositoryLookup: Send + Sync {
    fn lookup(&self, name: &str) -> PackageDiffResult<RepoPackageInfo>;
}

/// Lists the packages the user added on top of the base image.
pub trait OverlayPackageSource: Send + Sync {
    fn overlay_packages(&self) -> PackageDiffResult<Vec<String>>;
}
