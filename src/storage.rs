use crate::errors::AppError;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{collections::BTreeMap, path::Path};
use tokio::fs;
use tracing::error;

pub mod keys {
    pub const HABITS: &str = "habits";
    pub const TASKS: &str = "tasks";
    pub const HABIT_HISTORY: &str = "habitHistory";
    pub const TASK_HISTORY: &str = "taskHistory";
    pub const CIRCLE_PROGRESS: &str = "circleProgress";
    pub const PREVIOUS_CIRCLE_PROGRESS: &str = "previousCircleProgress";
    pub const HAS_INCREMENTED_TODAY: &str = "hasIncrementedToday";
    pub const CURRENT_DATE: &str = "currentDate";
    pub const USER_TIMEZONE: &str = "userTimezone";
    pub const CHART_OFFSET: &str = "chartOffset";
}

/// String-keyed JSON document. Every key is written whole; nothing spans keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    entries: BTreeMap<String, Value>,
    dirty: bool,
}

impl Store {
    pub fn from_entries(entries: BTreeMap<String, Value>) -> Self {
        Self {
            entries,
            dirty: false,
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Reads a key, treating an undecodable value as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                error!("failed to decode stored {key}: {err}");
                None
            }
        }
    }

    /// Reads an array key item by item. Items that fail to decode are logged
    /// and skipped; `None` means the key is absent or not an array.
    pub fn get_list<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        let value = self.entries.get(key)?;
        let Some(items) = value.as_array() else {
            error!("stored {key} is not a list; leaving it untouched");
            return None;
        };
        let decoded = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item.clone()) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    error!("skipping stored {key}[{index}]: {err}");
                    None
                }
            })
            .collect();
        Some(decoded)
    }

    pub fn put<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(encoded) => {
                if self.entries.get(key) != Some(&encoded) {
                    self.entries.insert(key.to_string(), encoded);
                    self.dirty = true;
                }
            }
            Err(err) => error!("failed to encode {key}: {err}"),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

pub async fn load_store(path: &Path) -> Store {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => Store::from_entries(entries),
            Err(err) => {
                error!("failed to parse data file: {err}");
                Store::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Store::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            Store::default()
        }
    }
}

pub async fn persist_store(path: &Path, store: &mut Store) -> Result<(), AppError> {
    if !store.is_dirty() {
        return Ok(());
    }
    let payload = serde_json::to_vec_pretty(store.entries()).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    store.mark_clean();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Habit, Task};
    use chrono::NaiveDate;

    #[test]
    fn put_only_dirties_on_change() {
        let mut store = Store::default();
        store.put(keys::CIRCLE_PROGRESS, &3);
        assert!(store.is_dirty());
        store.mark_clean();
        store.put(keys::CIRCLE_PROGRESS, &3);
        assert!(!store.is_dirty());
        store.put(keys::CIRCLE_PROGRESS, &4);
        assert!(store.is_dirty());
    }

    #[test]
    fn undecodable_key_reads_as_absent() {
        let mut entries = BTreeMap::new();
        entries.insert(keys::CIRCLE_PROGRESS.to_string(), Value::String("lots".into()));
        let store = Store::from_entries(entries);
        assert_eq!(store.get::<i32>(keys::CIRCLE_PROGRESS), None);
        assert!(store.contains(keys::CIRCLE_PROGRESS));
    }

    #[test]
    fn bad_list_items_are_skipped_individually() {
        let mut entries = BTreeMap::new();
        entries.insert(
            keys::HABITS.to_string(),
            serde_json::json!([
                { "name": "run", "completed": false, "reminder": "07:00" },
                { "name": "read", "completed": true, "reminder": "" },
                { "name": "rest", "completed": false, "reminder": null }
            ]),
        );
        entries.insert(keys::TASKS.to_string(), serde_json::json!({ "name": "odd" }));
        let store = Store::from_entries(entries);

        let habits: Vec<Habit> = store.get_list(keys::HABITS).unwrap();
        let names: Vec<&str> = habits.iter().map(|habit| habit.name.as_str()).collect();
        assert_eq!(names, ["run", "rest"]);
        assert!(store.get_list::<Task>(keys::TASKS).is_none());
        assert!(store.get_list::<Task>(keys::HABIT_HISTORY).is_none());
    }

    #[tokio::test]
    async fn collections_survive_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let habits = vec![
            Habit::new("Stretch", Some("06:45".parse().unwrap())),
            Habit::new("Journal", None),
        ];
        let tasks = vec![Task::new("Pay rent", date, None)];

        let mut store = Store::default();
        store.put(keys::HABITS, &habits);
        store.put(keys::TASKS, &tasks);
        persist_store(&path, &mut store).await.unwrap();
        assert!(!store.is_dirty());

        let loaded = load_store(&path).await;
        assert_eq!(loaded.get::<Vec<Habit>>(keys::HABITS).unwrap(), habits);
        assert_eq!(loaded.get::<Vec<Task>>(keys::TASKS).unwrap(), tasks);
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_store(&dir.path().join("absent.json")).await;
        assert!(missing.entries().is_empty());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, b"{not json").unwrap();
        assert!(load_store(&corrupt).await.entries().is_empty());
    }
}
