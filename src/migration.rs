//! Upgrade of legacy history maps keyed by day index to date-keyed maps.

use crate::models::HistoryMap;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Day zero for index-keyed history.
pub fn legacy_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

fn legacy_index(key: &str) -> Option<i64> {
    key.trim().parse::<i64>().ok()
}

pub fn needs_migration(raw: &BTreeMap<String, f64>) -> bool {
    raw.keys().any(|key| legacy_index(key).is_some())
}

/// Converts a stored history map into a date-keyed one. The flag reports
/// whether any legacy key was rewritten, meaning the result must be persisted.
pub fn migrate_history(raw: BTreeMap<String, f64>, epoch: NaiveDate) -> (HistoryMap, bool) {
    let migrating = needs_migration(&raw);
    let mut history = HistoryMap::new();
    let mut legacy = Vec::new();

    for (key, percent) in raw {
        if let Some(index) = legacy_index(&key) {
            legacy.push((index, percent));
            continue;
        }
        match NaiveDate::parse_from_str(&key, "%Y-%m-%d") {
            Ok(date) => {
                history.insert(date, percent);
            }
            Err(_) => warn!("dropping history entry with unreadable key '{key}'"),
        }
    }

    for (index, percent) in legacy {
        match epoch.checked_add_signed(Duration::days(index)) {
            Some(date) => {
                history.entry(date).or_insert(percent);
            }
            None => warn!("dropping history entry with out-of-range day index {index}"),
        }
    }

    if migrating {
        info!(entries = history.len(), "migrated index-keyed history");
    }
    (history, migrating)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn integer_keys_become_dates() {
        let legacy = raw(&[("0", 50.0), ("1", 100.0), ("31", 25.0)]);
        let (history, migrated) = migrate_history(legacy.clone(), legacy_epoch());
        assert!(migrated);

        let dates: Vec<String> = history.keys().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["2025-01-01", "2025-01-02", "2025-02-01"]);

        let mut before: Vec<f64> = legacy.values().copied().collect();
        let mut after: Vec<f64> = history.values().copied().collect();
        before.sort_by(f64::total_cmp);
        after.sort_by(f64::total_cmp);
        assert_eq!(before, after);
    }

    #[test]
    fn migrated_history_is_left_alone() {
        let current = raw(&[("2025-03-01", 40.0), ("2025-03-02", 60.0)]);
        assert!(!needs_migration(&current));
        let (history, migrated) = migrate_history(current, legacy_epoch());
        assert!(!migrated);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn running_twice_is_a_no_op() {
        let (first, _) = migrate_history(raw(&[("3", 10.0)]), legacy_epoch());
        let reencoded: BTreeMap<String, f64> =
            first.iter().map(|(d, v)| (d.to_string(), *v)).collect();
        let (second, migrated) = migrate_history(reencoded, legacy_epoch());
        assert!(!migrated);
        assert_eq!(first, second);
    }

    #[test]
    fn existing_date_wins_over_migrated_index() {
        let mixed = raw(&[("2025-01-02", 80.0), ("1", 20.0), ("junk", 5.0)]);
        let (history, migrated) = migrate_history(mixed, legacy_epoch());
        assert!(migrated);
        assert_eq!(history.len(), 1);
        assert_eq!(history[&NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()], 80.0);
    }
}
