use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::errors::TrackerError;

pub type ItemId = Uuid;

/// Completion percentage per calendar day.
pub type HistoryMap = BTreeMap<NaiveDate, f64>;

pub const MAX_CIRCLE_PROGRESS: i32 = 100;

/// Time of day a reminder fires, stored as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reminder(NaiveTime);

impl Reminder {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Parses an optional form value; blank input clears the reminder.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, TrackerError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

impl std::str::FromStr for Reminder {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(Reminder)
            .map_err(|_| TrackerError::InvalidReminder(s.to_string()))
    }
}

impl TryFrom<String> for Reminder {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Reminder> for String {
    fn from(value: Reminder) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

fn new_id() -> ItemId {
    Uuid::new_v4()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    #[serde(default = "new_id")]
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub reminder: Option<Reminder>,
}

impl Habit {
    pub fn new(name: impl Into<String>, reminder: Option<Reminder>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            completed: false,
            reminder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "new_id")]
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub reminder: Option<Reminder>,
    pub date: NaiveDate,
}

impl Task {
    pub fn new(name: impl Into<String>, date: NaiveDate, reminder: Option<Reminder>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            completed: false,
            reminder,
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayState {
    pub current_date: NaiveDate,
    pub circle_progress: i32,
    pub previous_circle_progress: i32,
    pub has_incremented_today: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskView {
    /// Today's and overdue tasks.
    #[default]
    Today,
    /// Every task, in stored order.
    Calendar,
}

#[derive(Debug, Deserialize)]
pub struct NewHabitRequest {
    pub name: String,
    #[serde(default)]
    pub reminder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTaskRequest {
    pub name: String,
    #[serde(default)]
    pub reminder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleTaskRequest {
    pub name: String,
    /// Local `YYYY-MM-DDTHH:MM` in the user's zone.
    pub datetime: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReminderRequest {
    #[serde(default)]
    pub reminder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
    #[serde(default)]
    pub view: TaskView,
}

#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    pub first: ItemId,
    pub second: ItemId,
}

#[derive(Debug, Deserialize)]
pub struct TimezoneRequest {
    pub zone: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartShiftRequest {
    pub weeks: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub date: String,
    pub timezone: String,
    pub circle_progress: i32,
    pub previous_circle_progress: i32,
    pub has_incremented_today: bool,
    pub habit_progress: f64,
    pub task_progress: f64,
    pub chart_offset: i32,
    pub habits: Vec<Habit>,
    pub tasks: Vec<Task>,
    pub visible_tasks: Vec<ItemId>,
}

#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub weekday: String,
    pub percent: f64,
}

#[derive(Debug, Serialize)]
pub struct TaskDonut {
    pub date: String,
    pub weekday: String,
    pub completed: f64,
    pub remaining: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub chart_offset: i32,
    pub week_start: String,
    pub habit_week: Vec<ChartPoint>,
    pub task_today: TaskDonut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_accepts_minutes_and_seconds() {
        let short: Reminder = "07:30".parse().unwrap();
        let long: Reminder = "07:30:00".parse().unwrap();
        assert_eq!(short, long);
        assert_eq!(short.to_string(), "07:30");
        assert!("7 o'clock".parse::<Reminder>().is_err());
    }

    #[test]
    fn blank_reminder_clears() {
        assert_eq!(Reminder::parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(Reminder::parse_optional(None).unwrap(), None);
    }

    #[test]
    fn legacy_habit_without_id_gets_one() {
        let habit: Habit =
            serde_json::from_str(r#"{"name":"Read","completed":true,"reminder":"21:00"}"#).unwrap();
        assert_eq!(habit.name, "Read");
        assert!(habit.completed);
        assert_eq!(habit.reminder.unwrap().to_string(), "21:00");
        assert!(!habit.id.is_nil());
    }

    #[test]
    fn task_serializes_date_and_reminder_as_strings() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let task = Task::new("Dentist", date, Some("09:15".parse().unwrap()));
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["date"], "2025-03-04");
        assert_eq!(value["reminder"], "09:15");
    }
}
