use crate::registry::PackageRecord;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Decides whether `candidate` takes the slot currently held by `existing`.
///
/// The existing record survives only when both carry a timestamp and the
/// existing one is strictly later. Equal timestamps go to the candidate, and a
/// record without a timestamp always loses to one that has it.
pub fn should_replace(existing: &PackageRecord, candidate: &PackageRecord) -> bool {
    match (existing.last_updated, candidate.last_updated) {
        (Some(existing_at), Some(candidate_at)) => existing_at <= candidate_at,
        _ => true,
    }
}

/// Folds both installer generations into one record per install path.
///
/// Legacy records seed the map (their keys are unique within that file), then
/// current-generation records are folded in listing order through
/// [`should_replace`].
pub fn reconcile_packages(
    legacy: Vec<PackageRecord>,
    current: Vec<PackageRecord>,
) -> BTreeMap<PathBuf, PackageRecord> {
    let mut merged: BTreeMap<PathBuf, PackageRecord> = BTreeMap::new();

    for candidate in legacy.into_iter().chain(current) {
        let replace = merged
            .get(&candidate.install_path)
            .map_or(true, |existing| should_replace(existing, &candidate));
        if replace {
            merged.insert(candidate.install_path.clone(), candidate);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(path: &str, version: &str, at: Option<i64>) -> PackageRecord {
        PackageRecord {
            install_path: PathBuf::from(path),
            title: Some("Lorerim".to_string()),
            version: Some(version.to_string()),
            last_updated: at.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    #[test]
    fn test_newer_record_wins_in_either_order() {
        let older = record("D:\\Lorerim", "3.0", Some(1_000));
        let newer = record("D:\\Lorerim", "3.1", Some(2_000));

        let forward = reconcile_packages(vec![], vec![older.clone(), newer.clone()]);
        let backward = reconcile_packages(vec![], vec![newer.clone(), older]);

        assert_eq!(forward.len(), 1);
        assert_eq!(forward[&PathBuf::from("D:\\Lorerim")], newer);
        assert_eq!(backward[&PathBuf::from("D:\\Lorerim")], newer);
    }

    #[test]
    fn test_timestamped_record_overrides_legacy() {
        let legacy = record("D:\\Lorerim", "legacy", None);
        let ancient = record("D:\\Lorerim", "ancient", Some(0));

        let merged = reconcile_packages(vec![legacy], vec![ancient.clone()]);
        assert_eq!(merged[&PathBuf::from("D:\\Lorerim")], ancient);
    }

    #[test]
    fn test_equal_timestamps_prefer_incoming() {
        let first = record("D:\\Lorerim", "first", Some(5_000));
        let second = record("D:\\Lorerim", "second", Some(5_000));

        let merged = reconcile_packages(vec![], vec![first, second.clone()]);
        assert_eq!(merged[&PathBuf::from("D:\\Lorerim")], second);
    }

    #[test]
    fn test_distinct_paths_are_kept() {
        let merged = reconcile_packages(
            vec![record("C:\\A", "1", None)],
            vec![record("C:\\B", "2", Some(10))],
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let legacy = vec![record("C:\\A", "1", None), record("C:\\B", "1", None)];
        let current = vec![
            record("C:\\B", "2", Some(30)),
            record("C:\\B", "3", Some(20)),
            record("C:\\C", "1", Some(10)),
        ];

        let once = reconcile_packages(legacy.clone(), current.clone());
        let twice = reconcile_packages(legacy, current);
        assert_eq!(once, twice);
        assert_eq!(once[&PathBuf::from("C:\\B")].version.as_deref(), Some("2"));
    }
}
