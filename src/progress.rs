use crate::config::{StreakReversal, TaskScope};
use crate::models::{Habit, MAX_CIRCLE_PROGRESS, Task};
use crate::tracker::Tracker;
use chrono::NaiveDate;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEvent {
    Loaded,
    Rolled,
    Added,
    Removed,
    Toggled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub habit_percent: f64,
    pub task_percent: f64,
    pub all_habits_completed: bool,
    pub all_tasks_completed: bool,
    pub has_items: bool,
}

impl Completion {
    /// The day has something to do and all of it is done.
    pub fn day_complete(&self) -> bool {
        self.has_items && self.all_habits_completed && self.all_tasks_completed
    }
}

pub fn tasks_in_scope<'a>(
    tasks: &'a [Task],
    scope: TaskScope,
    date: NaiveDate,
) -> impl Iterator<Item = &'a Task> + 'a {
    tasks.iter().filter(move |task| match scope {
        TaskScope::All => true,
        TaskScope::CurrentDay => task.date == date,
    })
}

fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

pub fn completion(habits: &[Habit], tasks: &[Task], scope: TaskScope, date: NaiveDate) -> Completion {
    let habits_done = habits.iter().filter(|habit| habit.completed).count();
    let (task_total, tasks_done) = tasks_in_scope(tasks, scope, date)
        .fold((0usize, 0usize), |(total, done), task| {
            (total + 1, done + usize::from(task.completed))
        });

    Completion {
        habit_percent: percent(habits_done, habits.len()),
        task_percent: percent(tasks_done, task_total),
        all_habits_completed: habits_done == habits.len(),
        all_tasks_completed: tasks_done == task_total,
        has_items: !habits.is_empty() || task_total > 0,
    }
}

/// The only place the streak bonus is awarded or taken back.
pub fn refresh(tracker: &mut Tracker, event: CompletionEvent) -> Completion {
    let date = tracker.day.current_date;
    let snapshot = completion(&tracker.habits, &tracker.tasks, tracker.policy.task_scope, date);

    tracker.habit_history.insert(date, snapshot.habit_percent);
    tracker.task_history.insert(date, snapshot.task_percent);
    tracker.save_history();

    let policy = tracker.policy;
    let day = &mut tracker.day;
    if snapshot.day_complete() && !day.has_incremented_today && day.circle_progress < MAX_CIRCLE_PROGRESS {
        day.previous_circle_progress = day.circle_progress;
        day.circle_progress = policy.clamp(day.circle_progress + 1);
        day.has_incremented_today = true;
        info!(?event, progress = day.circle_progress, "day complete, streak advanced");
        tracker.save_streak();
    } else if day.has_incremented_today && !snapshot.day_complete() {
        match policy.reversal {
            StreakReversal::Revert => {
                day.circle_progress = policy.clamp(day.previous_circle_progress);
            }
            StreakReversal::Penalize => {
                day.previous_circle_progress = day.circle_progress;
                day.circle_progress = policy.clamp(day.circle_progress - 1);
            }
        }
        day.has_incremented_today = false;
        info!(?event, progress = day.circle_progress, "day no longer complete, streak bonus withdrawn");
        tracker.save_streak();
    } else {
        debug!(
            ?event,
            habits = snapshot.habit_percent,
            tasks = snapshot.task_percent,
            "progress refreshed"
        );
    }

    snapshot
}
