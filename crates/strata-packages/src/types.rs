//! Package diff data model.
//!
//! The JSON shape matches what the image-diff service returns:
//! `{"Added": [...], "Upgraded": [...], "Downgraded": [...], "Removed": [...]}`
//! with entries `{"name", "oldVersion", "newVersion"}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Package name to version. An empty version means "unknown".
pub type VersionMap = BTreeMap<String, String>;

/// One package's classification outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDiffEntry {
    #[serde(alias = "Name")]
    pub name: String,
    /// Empty for added packages.
    #[serde(default, alias = "OldVersion", alias = "PreviousVersion")]
    pub old_version: String,
    /// Empty for removed packages.
    #[serde(default, alias = "NewVersion")]
    pub new_version: String,
}

impl PackageDiffEntry {
    pub fn new(
        name: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
        }
    }
}

/// How a package changed between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Upgraded,
    Downgraded,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Added => "added",
            Self::Upgraded => "upgraded",
            Self::Downgraded => "downgraded",
            Self::Removed => "removed",
        };
        f.write_str(label)
    }
}

/// The four disjoint result sets of a package diff.
///
/// Unchanged packages appear in none of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDiff {
    #[serde(rename = "Added", alias = "added", default, deserialize_with = "null_as_empty")]
    pub added: Vec<PackageDiffEntry>,
    #[serde(rename = "Upgraded", alias = "upgraded", default, deserialize_with = "null_as_empty")]
    pub upgraded: Vec<PackageDiffEntry>,
    #[serde(rename = "Downgraded", alias = "downgraded", default, deserialize_with = "null_as_empty")]
    pub downgraded: Vec<PackageDiffEntry>,
    #[serde(rename = "Removed", alias = "removed", default, deserialize_with = "null_as_empty")]
    pub removed: Vec<PackageDiffEntry>,
}

impl PackageDiff {
    /// Create an empty package diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no package changed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of changed packages.
    pub fn len(&self) -> usize {
        self.added.len() + self.upgraded.len() + self.downgraded.len() + self.removed.len()
    }

    /// The result set for one kind of change.
    pub fn entries(&self, kind: ChangeKind) -> &[PackageDiffEntry] {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Upgraded => &self.upgraded,
            ChangeKind::Downgraded => &self.downgraded,
            ChangeKind::Removed => &self.removed,
        }
    }

    /// Every entry tagged with its kind, in added/upgraded/downgraded/removed order.
    pub fn iter(&self) -> impl Iterator<Item = (ChangeKind, &PackageDiffEntry)> {
        [
            ChangeKind::Added,
            ChangeKind::Upgraded,
            ChangeKind::Downgraded,
            ChangeKind::Removed,
        ]
        .into_iter()
        .flat_map(move |kind| self.entries(kind).iter().map(move |e| (kind, e)))
    }

    /// Where `name` ended up, if it changed at all.
    pub fn kind_of(&self, name: &str) -> Option<ChangeKind> {
        self.iter().find(|(_, e)| e.name == name).map(|(kind, _)| kind)
    }
}

// Go services marshal empty slices as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
