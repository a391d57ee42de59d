use crate::clock::{self, Clock, TimezoneSource};
use crate::config::Policy;
use crate::errors::TrackerError;
use crate::migration::{legacy_epoch, migrate_history};
use crate::models::{DayState, Habit, HistoryMap, Task, TrackerSnapshot};
use crate::progress::{self, CompletionEvent};
use crate::reminders::{ReminderEntry, build_reminders};
use crate::rollover::Rollover;
use crate::storage::{Store, keys};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Furthest the chart may move from the current week, in days.
pub const MAX_CHART_OFFSET: i32 = 7 * 52 * 100;

pub struct Tracker {
    pub(crate) store: Store,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) policy: Policy,
    pub(crate) zone: Tz,
    pub(crate) habits: Vec<Habit>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) day: DayState,
    pub(crate) habit_history: HistoryMap,
    pub(crate) task_history: HistoryMap,
    pub(crate) chart_offset: i32,
}

impl Tracker {
    pub fn load(
        mut store: Store,
        clock: Arc<dyn Clock>,
        policy: Policy,
        environment_zone: Option<&str>,
    ) -> Self {
        let stored_zone = store.get::<String>(keys::USER_TIMEZONE);
        let (zone, source) = clock::resolve_timezone(stored_zone.as_deref(), environment_zone);
        if source != TimezoneSource::Stored {
            store.put(keys::USER_TIMEZONE, zone.name());
        }
        let today = clock::today(clock.as_ref(), zone);

        let habits: Vec<Habit> = load_list(&mut store, keys::HABITS);
        let tasks: Vec<Task> = load_list(&mut store, keys::TASKS);

        let habit_history = load_history(&mut store, keys::HABIT_HISTORY);
        let task_history = load_history(&mut store, keys::TASK_HISTORY);

        let current_date = match store.raw(keys::CURRENT_DATE) {
            None => today,
            Some(value) => parse_stored_date(value).unwrap_or_else(|| {
                warn!("stored currentDate {value} is unreadable; resetting to {today}");
                today
            }),
        };

        let circle_progress = policy.clamp(store.get(keys::CIRCLE_PROGRESS).unwrap_or(0));
        let previous_circle_progress =
            policy.clamp(store.get(keys::PREVIOUS_CIRCLE_PROGRESS).unwrap_or(0));
        let has_incremented_today = store.get(keys::HAS_INCREMENTED_TODAY).unwrap_or(false);

        let chart_offset = whole_weeks(store.get::<i64>(keys::CHART_OFFSET).unwrap_or(0));

        let mut tracker = Self {
            store,
            clock,
            policy,
            zone,
            habits,
            tasks,
            day: DayState {
                current_date,
                circle_progress,
                previous_circle_progress,
                has_incremented_today,
            },
            habit_history,
            task_history,
            chart_offset,
        };
        tracker.save_day();
        tracker.store.put(keys::CHART_OFFSET, &tracker.chart_offset);

        info!(
            zone = %tracker.zone,
            date = %tracker.day.current_date,
            habits = tracker.habits.len(),
            tasks = tracker.tasks.len(),
            "tracker loaded"
        );

        tracker.check_for_new_day();
        tracker.publish(CompletionEvent::Loaded);
        tracker
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn day(&self) -> &DayState {
        &self.day
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn habit_history(&self) -> &HistoryMap {
        &self.habit_history
    }

    pub fn task_history(&self) -> &HistoryMap {
        &self.task_history
    }

    pub fn chart_offset(&self) -> i32 {
        self.chart_offset
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn today(&self) -> NaiveDate {
        clock::today(self.clock.as_ref(), self.zone)
    }

    pub fn publish(&mut self, event: CompletionEvent) {
        progress::refresh(self, event);
    }

    pub fn set_timezone(&mut self, raw: &str) -> Result<Option<Rollover>, TrackerError> {
        let zone: Tz = raw
            .trim()
            .parse()
            .map_err(|_| TrackerError::UnknownTimezone(raw.to_string()))?;
        if zone != self.zone {
            info!(from = %self.zone, to = %zone, "timezone changed");
            self.zone = zone;
        }
        self.store.put(keys::USER_TIMEZONE, zone.name());
        Ok(self.check_for_new_day())
    }

    pub fn shift_chart(&mut self, weeks: i32) {
        let target = i64::from(self.chart_offset) + i64::from(weeks) * 7;
        self.chart_offset = whole_weeks(target);
        if i64::from(self.chart_offset) != target {
            warn!(weeks, offset = self.chart_offset, "chart shift clamped");
        }
        self.store.put(keys::CHART_OFFSET, &self.chart_offset);
    }

    pub fn reset_chart(&mut self) {
        self.chart_offset = 0;
        self.store.put(keys::CHART_OFFSET, &self.chart_offset);
    }

    pub fn reminders(&self) -> Vec<ReminderEntry> {
        build_reminders(&self.habits, &self.tasks)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let completion = progress::completion(
            &self.habits,
            &self.tasks,
            self.policy.task_scope,
            self.day.current_date,
        );
        TrackerSnapshot {
            date: self.day.current_date.to_string(),
            timezone: self.zone.name().to_string(),
            circle_progress: self.day.circle_progress,
            previous_circle_progress: self.day.previous_circle_progress,
            has_incremented_today: self.day.has_incremented_today,
            habit_progress: completion.habit_percent,
            task_progress: completion.task_percent,
            chart_offset: self.chart_offset,
            habits: self.habits.clone(),
            tasks: self.tasks.clone(),
            visible_tasks: self.visible_tasks().iter().map(|task| task.id).collect(),
        }
    }

    pub(crate) fn save_habits(&mut self) {
        self.store.put(keys::HABITS, &self.habits);
    }

    pub(crate) fn save_tasks(&mut self) {
        self.store.put(keys::TASKS, &self.tasks);
    }

    pub(crate) fn save_day(&mut self) {
        self.store.put(keys::CURRENT_DATE, &self.day.current_date);
        self.save_streak();
    }

    pub(crate) fn save_streak(&mut self) {
        self.store.put(keys::CIRCLE_PROGRESS, &self.day.circle_progress);
        self.store
            .put(keys::PREVIOUS_CIRCLE_PROGRESS, &self.day.previous_circle_progress);
        self.store
            .put(keys::HAS_INCREMENTED_TODAY, &self.day.has_incremented_today);
    }

    pub(crate) fn save_history(&mut self) {
        self.store.put(keys::HABIT_HISTORY, &self.habit_history);
        self.store.put(keys::TASK_HISTORY, &self.task_history);
    }
}

fn parse_stored_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn whole_weeks(days: i64) -> i32 {
    let bound = i64::from(MAX_CHART_OFFSET);
    let clamped = days.clamp(-bound, bound);
    // Both bounds are whole weeks, so the result fits and stays a multiple of 7.
    i32::try_from(clamped - clamped % 7).unwrap_or(0)
}

// Rewriting gives legacy records stable ids. A non-list value is left as stored.
fn load_list<T: serde::Serialize + serde::de::DeserializeOwned>(store: &mut Store, key: &str) -> Vec<T> {
    match store.get_list::<T>(key) {
        Some(items) => {
            store.put(key, &items);
            items
        }
        None => Vec::new(),
    }
}

fn load_history(store: &mut Store, key: &str) -> HistoryMap {
    let raw: BTreeMap<String, f64> = store.get(key).unwrap_or_default();
    let (history, migrated) = migrate_history(raw, legacy_epoch());
    if migrated {
        store.put(key, &history);
    }
    history
}
