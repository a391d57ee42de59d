use crate::config::TaskScope;
use crate::models::Task;
use crate::progress::{self, CompletionEvent};
use crate::tracker::Tracker;
use chrono::NaiveDate;
use tracing::{info, warn};

/// What a day-boundary transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollover {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub penalized: bool,
    pub pruned: usize,
}

impl Tracker {
    /// `None` when the stored day already is today.
    pub fn check_for_new_day(&mut self) -> Option<Rollover> {
        let today = self.today();
        let stale = self.day.current_date;
        if stale == today {
            return None;
        }
        if today < stale {
            warn!(%stale, %today, "clock moved backwards across a day boundary");
        }

        let scope = self.policy.task_scope;
        let closing = progress::completion(&self.habits, &self.tasks, scope, stale);

        let penalized = closing.has_items
            && !(closing.all_habits_completed && closing.all_tasks_completed);
        if penalized {
            self.day.previous_circle_progress = self.day.circle_progress;
            self.day.circle_progress = self.policy.clamp(self.day.circle_progress - 1);
            self.save_streak();
        }

        for habit in &mut self.habits {
            habit.completed = false;
        }
        self.save_habits();

        let pruned = roll_tasks(&mut self.tasks, scope, today);
        self.save_tasks();

        self.day.has_incremented_today = false;
        self.day.current_date = today;
        self.save_day();

        info!(
            from = %stale,
            to = %today,
            penalized,
            pruned,
            progress = self.day.circle_progress,
            "rolled over to a new day"
        );

        self.publish(CompletionEvent::Rolled);

        Some(Rollover {
            from: stale,
            to: today,
            penalized,
            pruned,
        })
    }
}

/// Returns how many tasks were pruned.
fn roll_tasks(tasks: &mut Vec<Task>, scope: TaskScope, today: NaiveDate) -> usize {
    match scope {
        TaskScope::All => {
            for task in tasks.iter_mut() {
                task.completed = false;
            }
            0
        }
        TaskScope::CurrentDay => {
            let before = tasks.len();
            tasks.retain(|task| !(task.completed && task.date < today));
            for task in tasks.iter_mut().filter(|task| task.date == today) {
                task.completed = false;
            }
            before - tasks.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{Policy, StreakFloor};
    use crate::models::Habit;
    use crate::storage::{Store, keys};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(policy: Policy) -> (Arc<ManualClock>, Tracker) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()));
        let tracker = Tracker::load(Store::default(), clock.clone(), policy, Some("UTC"));
        (clock, tracker)
    }

    fn task(name: &str, on: NaiveDate, completed: bool) -> Task {
        let mut task = Task::new(name, on, None);
        task.completed = completed;
        task
    }

    #[test]
    fn same_day_is_a_no_op() {
        let (_clock, mut t) = setup(Policy::default());
        t.habits = vec![Habit::new("a", None)];
        assert_eq!(t.check_for_new_day(), None);
        assert_eq!(t.day.circle_progress, 0);
    }

    #[test]
    fn incomplete_day_is_penalized_once() {
        let (clock, mut t) = setup(Policy::default());
        t.habits = vec![Habit::new("a", None), Habit::new("b", None)];
        t.day.circle_progress = 5;

        clock.advance(Duration::days(1));
        let rollover = t.check_for_new_day().unwrap();
        assert!(rollover.penalized);
        assert_eq!(rollover.from, date(2025, 1, 1));
        assert_eq!(rollover.to, date(2025, 1, 2));
        assert_eq!(t.day.circle_progress, 4);
        assert_eq!(t.day.previous_circle_progress, 5);

        let after_first = t.day.clone();
        assert_eq!(t.check_for_new_day(), None);
        assert_eq!(t.day, after_first);
    }

    #[test]
    fn completed_day_is_not_penalized_and_resets() {
        let (clock, mut t) = setup(Policy::default());
        let mut habit = Habit::new("a", None);
        habit.completed = true;
        t.habits = vec![habit];
        t.day.has_incremented_today = true;
        t.day.circle_progress = 3;

        clock.advance(Duration::days(1));
        let rollover = t.check_for_new_day().unwrap();
        assert!(!rollover.penalized);
        assert_eq!(t.day.circle_progress, 3);
        assert!(!t.day.has_incremented_today);
        assert!(!t.habits[0].completed);
        assert_eq!(t.store.get::<String>(keys::CURRENT_DATE).as_deref(), Some("2025-01-02"));
    }

    #[test]
    fn penalty_respects_zero_floor() {
        let policy = Policy {
            floor: StreakFloor::Zero,
            ..Policy::default()
        };
        let (clock, mut t) = setup(policy);
        t.habits = vec![Habit::new("a", None)];
        clock.advance(Duration::days(1));
        t.check_for_new_day();
        assert_eq!(t.day.circle_progress, 0);
    }

    #[test]
    fn current_day_scope_prunes_and_resets_selectively() {
        let (clock, mut t) = setup(Policy::default());
        t.tasks = vec![
            task("done yesterday", date(2025, 1, 1), true),
            task("open yesterday", date(2025, 1, 1), false),
            task("due on the new day", date(2025, 1, 2), true),
            task("future", date(2025, 1, 5), true),
        ];

        clock.advance(Duration::days(1));
        let rollover = t.check_for_new_day().unwrap();
        assert_eq!(rollover.pruned, 1);
        assert!(rollover.penalized);

        let names: Vec<&str> = t.tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["open yesterday", "due on the new day", "future"]);
        assert!(!t.tasks[1].completed);
        assert!(t.tasks[2].completed);
    }

    #[test]
    fn all_scope_resets_every_task() {
        let policy = Policy {
            task_scope: TaskScope::All,
            ..Policy::default()
        };
        let (clock, mut t) = setup(policy);
        t.tasks = vec![
            task("old", date(2024, 12, 30), true),
            task("future", date(2025, 1, 9), true),
        ];

        clock.advance(Duration::days(1));
        let rollover = t.check_for_new_day().unwrap();
        assert_eq!(rollover.pruned, 0);
        assert!(!rollover.penalized);
        assert!(t.tasks.iter().all(|task| !task.completed));
    }

    #[test]
    fn nothing_to_do_is_never_penalized() {
        let (clock, mut t) = setup(Policy::default());
        t.day.circle_progress = 7;
        for _ in 0..5 {
            clock.advance(Duration::days(1));
            assert!(!t.check_for_new_day().unwrap().penalized);
        }
        assert_eq!(t.day.circle_progress, 7);
    }

    #[test]
    fn other_days_tasks_do_not_count_in_current_day_scope() {
        let (clock, mut t) = setup(Policy::default());
        t.tasks = vec![task("next week", date(2025, 1, 8), false)];
        clock.advance(Duration::days(1));
        assert!(!t.check_for_new_day().unwrap().penalized);
    }
}
