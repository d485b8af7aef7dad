//! Overlay package diff: user-added packages against the repository.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::diff::diff_packages;
use crate::error::{PackageDiffError, PackageDiffResult};
use crate::traits::{OverlayPackageSource, RepositoryLookup, VersionResolver};
use crate::types::{PackageDiff, VersionMap};

/// A `packages.add` style list: one package name per line.
///
/// Blank lines and `#` comments are skipped and duplicates collapse to their
/// first occurrence. A missing file is an empty list.
#[derive(Clone, Debug)]
pub struct PackageListFile {
    path: PathBuf,
}

impl PackageListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OverlayPackageSource for PackageListFile {
    fn overlay_packages(&self) -> PackageDiffResult<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(parse_package_list(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no overlay package list");
                Ok(Vec::new())
            }
            Err(source) => Err(PackageDiffError::OverlayList {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Parse the contents of a package list file.
pub fn parse_package_list(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Diff the installed overlay packages against their latest repository
/// versions.
///
/// Packages with no resolvable local version are left out entirely. The first
/// failed repository lookup aborts the whole diff.
pub fn overlay_package_diff(
    source: &dyn OverlayPackageSource,
    resolver: &dyn VersionResolver,
    lookup: &dyn RepositoryLookup,
) -> PackageDiffResult<PackageDiff> {
    let names = source.overlay_packages()?;
    debug!(count = names.len(), "overlay packages listed");

    let local: VersionMap = resolver
        .resolve_versions(&names)?
        .into_iter()
        .filter(|(name, version)| {
            if version.is_empty() {
                debug!(package = %name, "not installed, skipping");
            }
            !version.is_empty()
        })
        .collect();

    let mut remote = VersionMap::new();
    for name in local.keys() {
        let info = lookup.lookup(name)?;
        remote.insert(name.clone(), info.version);
    }

    let diff = diff_packages(&local, &remote);
    info!(
        upgraded = diff.upgraded.len(),
        downgraded = diff.downgraded.len(),
        "overlay package diff computed"
    );
    Ok(diff)
}
