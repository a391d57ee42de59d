use crate::errors::TrackerError;
use crate::models::{Direction, Habit, ItemId, Reminder, Task, TaskView};
use crate::progress::CompletionEvent;
use crate::tracker::Tracker;
use chrono::{NaiveDateTime, TimeZone, Timelike};
use tracing::{info, warn};

trait Entry {
    fn id(&self) -> ItemId;
    fn completed_mut(&mut self) -> &mut bool;
    fn name_mut(&mut self) -> &mut String;
    fn reminder_mut(&mut self) -> &mut Option<Reminder>;
}

impl Entry for Habit {
    fn id(&self) -> ItemId {
        self.id
    }
    fn completed_mut(&mut self) -> &mut bool {
        &mut self.completed
    }
    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }
    fn reminder_mut(&mut self) -> &mut Option<Reminder> {
        &mut self.reminder
    }
}

impl Entry for Task {
    fn id(&self) -> ItemId {
        self.id
    }
    fn completed_mut(&mut self) -> &mut bool {
        &mut self.completed
    }
    fn name_mut(&mut self) -> &mut String {
        &mut self.name
    }
    fn reminder_mut(&mut self) -> &mut Option<Reminder> {
        &mut self.reminder
    }
}

fn position<T: Entry>(items: &[T], id: ItemId, kind: &str, action: &str) -> Option<usize> {
    let found = items.iter().position(|item| item.id() == id);
    if found.is_none() {
        warn!("{kind} {id} not found; ignoring {action}");
    }
    found
}

fn clean_name(name: &str) -> Result<String, TrackerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn toggle<T: Entry>(items: &mut [T], id: ItemId, kind: &str) -> bool {
    match position(items, id, kind, "toggle") {
        Some(index) => {
            let completed = items[index].completed_mut();
            *completed = !*completed;
            true
        }
        None => false,
    }
}

fn remove<T: Entry>(items: &mut Vec<T>, id: ItemId, kind: &str) -> bool {
    match position(items, id, kind, "delete") {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

fn rename<T: Entry>(items: &mut [T], id: ItemId, name: &str, kind: &str) -> Result<bool, TrackerError> {
    let name = clean_name(name)?;
    Ok(match position(items, id, kind, "rename") {
        Some(index) => {
            *items[index].name_mut() = name;
            true
        }
        None => false,
    })
}

fn set_reminder<T: Entry>(items: &mut [T], id: ItemId, reminder: Option<Reminder>, kind: &str) -> bool {
    match position(items, id, kind, "reminder update") {
        Some(index) => {
            *items[index].reminder_mut() = reminder;
            true
        }
        None => false,
    }
}

fn swap<T: Entry>(items: &mut [T], first: ItemId, second: ItemId, kind: &str) -> bool {
    let (Some(a), Some(b)) = (
        position(items, first, kind, "swap"),
        position(items, second, kind, "swap"),
    ) else {
        return false;
    };
    items.swap(a, b);
    a != b
}

fn neighbour(local: usize, len: usize, direction: Direction) -> Option<usize> {
    match direction {
        Direction::Up => local.checked_sub(1),
        Direction::Down => (local + 1 < len).then_some(local + 1),
    }
}

impl Tracker {
    pub fn add_habit(&mut self, name: &str, reminder: Option<Reminder>) -> Result<ItemId, TrackerError> {
        let habit = Habit::new(clean_name(name)?, reminder);
        let id = habit.id;
        info!(%id, name = %habit.name, "habit added");
        self.habits.push(habit);
        self.save_habits();
        self.publish(CompletionEvent::Added);
        Ok(id)
    }

    pub fn add_task(&mut self, name: &str, reminder: Option<Reminder>) -> Result<ItemId, TrackerError> {
        let task = Task::new(clean_name(name)?, self.day.current_date, reminder);
        let id = task.id;
        info!(%id, name = %task.name, "task added");
        self.tasks.push(task);
        self.save_tasks();
        self.publish(CompletionEvent::Added);
        Ok(id)
    }

    /// `datetime` is a local `YYYY-MM-DDTHH:MM` in the user's zone.
    pub fn add_scheduled_task(&mut self, name: &str, datetime: &str) -> Result<ItemId, TrackerError> {
        let name = clean_name(name)?;
        let raw = datetime.trim();
        let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| TrackerError::InvalidDateTime(raw.to_string()))?;
        let at = self
            .zone
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| TrackerError::InvalidDateTime(raw.to_string()))?;

        // Compare at minute precision; the form cannot express seconds.
        let now = self.clock.now().with_timezone(&self.zone).naive_local();
        let now_minute = now
            .with_second(0)
            .and_then(|minute| minute.with_nanosecond(0))
            .unwrap_or(now);
        if local < now_minute {
            return Err(TrackerError::DateInPast(raw.to_string()));
        }

        let task = Task::new(name, at.date_naive(), Some(Reminder::new(local.time())));
        let id = task.id;
        info!(%id, name = %task.name, date = %task.date, "scheduled task added");
        self.tasks.push(task);
        self.save_tasks();
        self.publish(CompletionEvent::Added);
        Ok(id)
    }

    pub fn toggle_habit(&mut self, id: ItemId) -> bool {
        let changed = toggle(&mut self.habits, id, "habit");
        if changed {
            self.save_habits();
            self.publish(CompletionEvent::Toggled);
        }
        changed
    }

    pub fn toggle_task(&mut self, id: ItemId) -> bool {
        let changed = toggle(&mut self.tasks, id, "task");
        if changed {
            self.save_tasks();
            self.publish(CompletionEvent::Toggled);
        }
        changed
    }

    pub fn delete_habit(&mut self, id: ItemId) -> bool {
        let changed = remove(&mut self.habits, id, "habit");
        if changed {
            info!(%id, "habit deleted");
            self.save_habits();
            self.publish(CompletionEvent::Removed);
        }
        changed
    }

    pub fn delete_task(&mut self, id: ItemId) -> bool {
        let changed = remove(&mut self.tasks, id, "task");
        if changed {
            info!(%id, "task deleted");
            self.save_tasks();
            self.publish(CompletionEvent::Removed);
        }
        changed
    }

    pub fn rename_habit(&mut self, id: ItemId, name: &str) -> Result<bool, TrackerError> {
        let changed = rename(&mut self.habits, id, name, "habit")?;
        if changed {
            self.save_habits();
        }
        Ok(changed)
    }

    pub fn rename_task(&mut self, id: ItemId, name: &str) -> Result<bool, TrackerError> {
        let changed = rename(&mut self.tasks, id, name, "task")?;
        if changed {
            self.save_tasks();
        }
        Ok(changed)
    }

    pub fn set_habit_reminder(&mut self, id: ItemId, reminder: Option<Reminder>) -> bool {
        let changed = set_reminder(&mut self.habits, id, reminder, "habit");
        if changed {
            self.save_habits();
        }
        changed
    }

    pub fn set_task_reminder(&mut self, id: ItemId, reminder: Option<Reminder>) -> bool {
        let changed = set_reminder(&mut self.tasks, id, reminder, "task");
        if changed {
            self.save_tasks();
        }
        changed
    }

    pub fn move_habit(&mut self, id: ItemId, direction: Direction) -> bool {
        let Some(index) = position(&self.habits, id, "habit", "move") else {
            return false;
        };
        let Some(target) = neighbour(index, self.habits.len(), direction) else {
            return false;
        };
        self.habits.swap(index, target);
        self.save_habits();
        true
    }

    // In the today view the task trades places with its visible neighbour.
    pub fn move_task(&mut self, id: ItemId, direction: Direction, view: TaskView) -> bool {
        let Some(index) = position(&self.tasks, id, "task", "move") else {
            return false;
        };
        let target = match view {
            TaskView::Calendar => neighbour(index, self.tasks.len(), direction),
            TaskView::Today => {
                let visible = self.visible_positions();
                visible
                    .iter()
                    .position(|&global| global == index)
                    .and_then(|local| neighbour(local, visible.len(), direction))
                    .map(|local| visible[local])
            }
        };
        let Some(target) = target else {
            return false;
        };
        self.tasks.swap(index, target);
        self.save_tasks();
        true
    }

    pub fn swap_habits(&mut self, first: ItemId, second: ItemId) -> bool {
        let changed = swap(&mut self.habits, first, second, "habit");
        if changed {
            self.save_habits();
        }
        changed
    }

    pub fn swap_tasks(&mut self, first: ItemId, second: ItemId) -> bool {
        let changed = swap(&mut self.tasks, first, second, "task");
        if changed {
            self.save_tasks();
        }
        changed
    }

    /// Open tasks from earlier days plus everything dated today.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.visible_positions()
            .into_iter()
            .map(|index| &self.tasks[index])
            .collect()
    }

    fn visible_positions(&self) -> Vec<usize> {
        let today = self.day.current_date;
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| (!task.completed && task.date <= today) || task.date == today)
            .map(|(index, _)| index)
            .collect()
    }
}
