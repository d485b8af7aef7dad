//! Package set classification.

use std::cmp::Ordering;

use crate::types::{PackageDiff, PackageDiffEntry, VersionMap};
use crate::version::compare_versions;

/// Classify every package named in either mapping.
///
/// Names only in `new` are added, names only in `old` are removed, and names
/// in both with different versions are upgraded when the new version orders
/// after the old one and downgraded otherwise. Each result set is sorted by
/// package name. Pure: no I/O, never fails.
pub fn diff_packages(old: &VersionMap, new: &VersionMap) -> PackageDiff {
    let mut diff = PackageDiff::new();

    for (name, old_version) in old {
        match new.get(name) {
            Some(new_version) if new_version == old_version => {}
            Some(new_version) => {
                let entry = PackageDiffEntry::new(name, old_version, new_version);
                match compare_versions(new_version, old_version) {
                    Ordering::Greater => diff.upgraded.push(entry),
                    Ordering::Less | Ordering::Equal => diff.downgraded.push(entry),
                }
            }
            None => diff
                .removed
                .push(PackageDiffEntry::new(name, old_version, "")),
        }
    }

    for (name, new_version) in new {
        if !old.contains_key(name) {
            diff.added.push(PackageDiffEntry::new(name, "", new_version));
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::types::ChangeKind;
    use proptest::prelude::*;

    fn map(pairs: &[(&str, &str)]) -> VersionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn identical_mappings_no_diff() {
        let m = map(&[("foo", "1.0"), ("bar", "2:3.4-1")]);
        assert!(diff_packages(&m, &m).is_empty());
    }

    #[test]
    fn upgrade_detected() {
        let diff = diff_packages(&map(&[("foo", "1.0")]), &map(&[("foo", "2.0")]));
        assert_eq!(diff.upgraded, vec![PackageDiffEntry::new("foo", "1.0", "2.0")]);
        assert!(diff.added.is_empty());
        assert!(diff.downgraded.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn downgrade_detected() {
        let diff = diff_packages(&map(&[("foo", "2.0")]), &map(&[("foo", "1.0")]));
        assert_eq!(diff.downgraded, vec![PackageDiffEntry::new("foo", "2.0", "1.0")]);
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn numeric_segments_not_lexicographic() {
        let diff = diff_packages(&map(&[("foo", "1.2.0")]), &map(&[("foo", "1.10.0")]));
        assert_eq!(diff.kind_of("foo"), Some(ChangeKind::Upgraded));
    }

    #[test]
    fn empty_to_populated() {
        let diff = diff_packages(&VersionMap::new(), &map(&[("a", "1"), ("b", "2")]));
        assert_eq!(
            diff.added,
            vec![PackageDiffEntry::new("a", "", "1"), PackageDiffEntry::new("b", "", "2")]
        );
    }

    #[test]
    fn populated_to_empty() {
        let diff = diff_packages(&map(&[("a", "1")]), &VersionMap::new());
        assert_eq!(diff.removed, vec![PackageDiffEntry::new("a", "1", "")]);
    }

    #[test]
    fn mixed_changes_sorted_by_name() {
        let old = map(&[
            ("keep", "1.0"),
            ("zsh", "5.8"),
            ("bash", "5.2"),
            ("gone", "0.1"),
            ("curl", "8.0"),
        ]);
        let new = map(&[
            ("keep", "1.0"),
            ("zsh", "5.9"),
            ("bash", "5.3"),
            ("curl", "7.88"),
            ("fresh", "3.0"),
        ]);

        let diff = diff_packages(&old, &new);
        let upgraded: Vec<&str> = diff.upgraded.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(upgraded, vec!["bash", "zsh"]);
        assert_eq!(diff.kind_of("curl"), Some(ChangeKind::Downgraded));
        assert_eq!(diff.kind_of("gone"), Some(ChangeKind::Removed));
        assert_eq!(diff.kind_of("fresh"), Some(ChangeKind::Added));
        assert_eq!(diff.kind_of("keep"), None);
    }

    #[test]
    fn unknown_version_is_compared_like_any_other() {
        // Present with an empty version is not the same as absent.
        let diff = diff_packages(&map(&[("foo", "")]), &map(&[("foo", "1.0")]));
        assert_eq!(diff.kind_of("foo"), Some(ChangeKind::Upgraded));
    }

    fn version_maps() -> impl Strategy<Value = VersionMap> {
        prop::collection::btree_map("[a-e]{1,2}", "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}", 0..10)
    }

    proptest! {
        #[test]
        fn result_sets_are_disjoint_and_bounded(old in version_maps(), new in version_maps()) {
            let diff = diff_packages(&old, &new);

            let mut seen = BTreeSet::new();
            for (_, entry) in diff.iter() {
                prop_assert!(seen.insert(entry.name.clone()), "{} reported twice", entry.name);
                prop_assert!(old.contains_key(&entry.name) || new.contains_key(&entry.name));
            }
        }

        #[test]
        fn same_mapping_is_empty(m in version_maps()) {
            prop_assert!(diff_packages(&m, &m).is_empty());
        }

        #[test]
        fn one_sided_names_are_added_or_removed(old in version_maps(), new in version_maps()) {
            let diff = diff_packages(&old, &new);
            for (name, version) in &new {
                if !old.contains_key(name) {
                    prop_assert!(diff.added.contains(&PackageDiffEntry::new(name, "", version)));
                }
            }
            for (name, version) in &old {
                if !new.contains_key(name) {
                    prop_assert!(diff.removed.contains(&PackageDiffEntry::new(name, version, "")));
                }
            }
        }

        #[test]
        fn swapping_inputs_mirrors_the_result(old in version_maps(), new in version_maps()) {
            let forward = diff_packages(&old, &new);
            let backward = diff_packages(&new, &old);
            prop_assert_eq!(forward.added.len(), backward.removed.len());
            prop_assert_eq!(forward.upgraded.len(), backward.downgraded.len());
        }
    }
}
