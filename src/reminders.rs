use crate::models::{Habit, ItemId, Task};
use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Habit,
    Task,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderEntry {
    pub kind: ReminderKind,
    pub id: ItemId,
    pub position: usize,
    pub time: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ReminderPayload<'a> {
    reminders: &'a [ReminderEntry],
    timezone: &'a str,
}

/// Every habit and task that has a reminder, habits first, in list order.
pub fn build_reminders(habits: &[Habit], tasks: &[Task]) -> Vec<ReminderEntry> {
    let habit_entries = habits.iter().enumerate().filter_map(|(position, habit)| {
        habit.reminder.map(|time| ReminderEntry {
            kind: ReminderKind::Habit,
            id: habit.id,
            position,
            time: time.to_string(),
            name: habit.name.clone(),
            date: None,
        })
    });
    let task_entries = tasks.iter().enumerate().filter_map(|(position, task)| {
        task.reminder.map(|time| ReminderEntry {
            kind: ReminderKind::Task,
            id: task.id,
            position,
            time: time.to_string(),
            name: task.name.clone(),
            date: Some(task.date),
        })
    });
    habit_entries.chain(task_entries).collect()
}

/// Best-effort delivery of the reminder list to an external scheduler.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    endpoint: Option<String>,
}

impl Notifier {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Sends in the background; failures are logged and never reach the caller.
    pub fn dispatch(&self, reminders: Vec<ReminderEntry>, zone: Tz) {
        let Some(endpoint) = self.endpoint.clone() else {
            debug!(count = reminders.len(), "reminder delivery disabled");
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            let payload = ReminderPayload {
                reminders: &reminders,
                timezone: zone.name(),
            };
            match client.post(endpoint.as_str()).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(count = reminders.len(), "reminders delivered");
                }
                Ok(response) => {
                    error!("failed to update reminders: endpoint answered {}", response.status());
                }
                Err(err) => error!("failed to update reminders: {err}"),
            }
        });
    }
}
