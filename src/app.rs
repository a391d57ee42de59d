use crate::handlers;
use crate::state::AppState;
use crate::storage::persist_store;
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tracing::error;

pub const ROLLOVER_CHECK_INTERVAL: Duration = Duration::from_secs(60);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::get_state))
        .route("/api/state", get(handlers::get_state))
        .route("/api/rollover", post(handlers::check_rollover))
        .route("/api/timezone", put(handlers::set_timezone))
        .route("/api/habits", post(handlers::add_habit))
        .route("/api/habits/swap", post(handlers::swap_habits))
        .route("/api/habits/:id", delete(handlers::delete_habit))
        .route("/api/habits/:id/toggle", post(handlers::toggle_habit))
        .route("/api/habits/:id/name", put(handlers::rename_habit))
        .route("/api/habits/:id/reminder", put(handlers::set_habit_reminder))
        .route("/api/habits/:id/move", post(handlers::move_habit))
        .route("/api/tasks", post(handlers::add_task))
        .route("/api/tasks/swap", post(handlers::swap_tasks))
        .route("/api/tasks/:id", delete(handlers::delete_task))
        .route("/api/tasks/:id/toggle", post(handlers::toggle_task))
        .route("/api/tasks/:id/name", put(handlers::rename_task))
        .route("/api/tasks/:id/reminder", put(handlers::set_task_reminder))
        .route("/api/tasks/:id/move", post(handlers::move_task))
        .route("/api/calendar", post(handlers::schedule_task))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/chart/shift", post(handlers::shift_chart))
        .route("/api/chart/reset", post(handlers::reset_chart))
        .route("/api/reminders", get(handlers::get_reminders))
        .with_state(state)
}

/// Re-checks the day boundary on a timer so a long-running process rolls
/// over at midnight without waiting for a request.
pub fn spawn_rollover_watch(state: AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut tracker = state.tracker.lock().await;
            if tracker.check_for_new_day().is_none() {
                continue;
            }
            if let Err(err) = persist_store(&state.data_path, tracker.store_mut()).await {
                error!("failed to persist rollover: {}", err.message);
            }
            state.notifier.dispatch(tracker.reminders(), tracker.zone());
        }
    })
}
