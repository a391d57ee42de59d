use crate::models::{ChartPoint, HistoryMap, StatsResponse, TaskDonut};
use crate::tracker::Tracker;
use chrono::{Datelike, Duration, NaiveDate};

pub fn build_stats(tracker: &Tracker) -> StatsResponse {
    build_stats_at(
        tracker.today(),
        tracker.chart_offset(),
        tracker.habit_history(),
        tracker.task_history(),
    )
}

/// Habit completion for the Sunday-started week `offset` days away from
/// today's week, plus today's task completion split for the donut.
pub fn build_stats_at(
    today: NaiveDate,
    offset: i32,
    habit_history: &HistoryMap,
    task_history: &HistoryMap,
) -> StatsResponse {
    let current = week_start(today);
    let start = current
        .checked_add_signed(Duration::days(i64::from(offset)))
        .unwrap_or(current);

    let habit_week = (0..7)
        .map(|day| {
            let date = start + Duration::days(day);
            ChartPoint {
                date: date_key(date),
                weekday: weekday_label(date),
                percent: habit_history.get(&date).copied().unwrap_or(0.0),
            }
        })
        .collect();

    let completed = task_history.get(&today).copied().unwrap_or(0.0);

    StatsResponse {
        chart_offset: offset,
        week_start: date_key(start),
        habit_week,
        task_today: TaskDonut {
            date: date_key(today),
            weekday: weekday_label(today),
            completed,
            remaining: 100.0 - completed,
        },
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

fn weekday_label(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_window_starts_on_sunday_and_reads_history() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let mut habits = HistoryMap::new();
        habits.insert(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 75.0);

        let stats = build_stats_at(today, 0, &habits, &HistoryMap::new());
        assert_eq!(stats.week_start, "2025-01-05");
        assert_eq!(stats.habit_week.len(), 7);
        assert_eq!(stats.habit_week[0].weekday, "Sunday");
        let monday = &stats.habit_week[1];
        assert_eq!(monday.date, "2025-01-06");
        assert_eq!(monday.percent, 75.0);
        assert_eq!(stats.habit_week[6].percent, 0.0);
    }

    #[test]
    fn offset_moves_whole_weeks() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let stats = build_stats_at(today, -7, &HistoryMap::new(), &HistoryMap::new());
        assert_eq!(stats.week_start, "2024-12-29");
        assert_eq!(stats.chart_offset, -7);
    }

    #[test]
    fn unrepresentable_offset_falls_back_to_this_week() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let stats = build_stats_at(today, i32::MAX, &HistoryMap::new(), &HistoryMap::new());
        assert_eq!(stats.week_start, "2025-01-05");
        assert_eq!(stats.habit_week.len(), 7);
    }

    #[test]
    fn donut_splits_todays_task_progress() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let mut tasks = HistoryMap::new();
        tasks.insert(today, 40.0);
        let stats = build_stats_at(today, 0, &HistoryMap::new(), &tasks);
        assert_eq!(stats.task_today.completed, 40.0);
        assert_eq!(stats.task_today.remaining, 60.0);
        assert_eq!(stats.task_today.weekday, "Wednesday");
    }
}
