use crate::errors::{AppError, TrackerError};
use crate::models::{
    ChartShiftRequest, ItemId, MoveRequest, NewHabitRequest, NewTaskRequest, Reminder,
    ReminderRequest, RenameRequest, ScheduleTaskRequest, StatsResponse, SwapRequest,
    TimezoneRequest, TrackerSnapshot,
};
use crate::reminders::ReminderEntry;
use crate::state::AppState;
use crate::stats::build_stats;
use crate::storage::persist_store;
use crate::tracker::Tracker;
use axum::{
    Json,
    extract::{Path, State},
};

type SnapshotResult = Result<Json<TrackerSnapshot>, AppError>;

/// Runs one operation against the tracker: brings it up to today first,
/// flushes the store afterwards, and hands any reminder change to the notifier.
async fn apply<T>(
    state: &AppState,
    op: impl FnOnce(&mut Tracker) -> Result<T, TrackerError>,
) -> Result<T, AppError> {
    let mut tracker = state.tracker.lock().await;
    let before = tracker.reminders();
    tracker.check_for_new_day();
    let outcome = op(&mut tracker);

    persist_store(&state.data_path, tracker.store_mut()).await?;

    let after = tracker.reminders();
    if after != before {
        state.notifier.dispatch(after, tracker.zone());
    }

    Ok(outcome?)
}

async fn snapshot_after(
    state: &AppState,
    op: impl FnOnce(&mut Tracker) -> Result<(), TrackerError>,
) -> SnapshotResult {
    let snapshot = apply(state, |tracker| {
        op(tracker)?;
        Ok(tracker.snapshot())
    })
    .await?;
    Ok(Json(snapshot))
}

pub async fn get_state(State(state): State<AppState>) -> SnapshotResult {
    snapshot_after(&state, |_| Ok(())).await
}

pub async fn check_rollover(State(state): State<AppState>) -> SnapshotResult {
    snapshot_after(&state, |_| Ok(())).await
}

pub async fn set_timezone(
    State(state): State<AppState>,
    Json(payload): Json<TimezoneRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| tracker.set_timezone(&payload.zone).map(|_| ())).await
}

pub async fn add_habit(
    State(state): State<AppState>,
    Json(payload): Json<NewHabitRequest>,
) -> SnapshotResult {
    let reminder = Reminder::parse_optional(payload.reminder.as_deref())?;
    snapshot_after(&state, |tracker| tracker.add_habit(&payload.name, reminder).map(|_| ())).await
}

pub async fn toggle_habit(State(state): State<AppState>, Path(id): Path<ItemId>) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.toggle_habit(id);
        Ok(())
    })
    .await
}

pub async fn rename_habit(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(payload): Json<RenameRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| tracker.rename_habit(id, &payload.name).map(|_| ())).await
}

pub async fn set_habit_reminder(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(payload): Json<ReminderRequest>,
) -> SnapshotResult {
    let reminder = Reminder::parse_optional(payload.reminder.as_deref())?;
    snapshot_after(&state, |tracker| {
        tracker.set_habit_reminder(id, reminder);
        Ok(())
    })
    .await
}

pub async fn move_habit(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(payload): Json<MoveRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.move_habit(id, payload.direction);
        Ok(())
    })
    .await
}

pub async fn swap_habits(
    State(state): State<AppState>,
    Json(payload): Json<SwapRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.swap_habits(payload.first, payload.second);
        Ok(())
    })
    .await
}

pub async fn delete_habit(State(state): State<AppState>, Path(id): Path<ItemId>) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.delete_habit(id);
        Ok(())
    })
    .await
}

pub async fn add_task(
    State(state): State<AppState>,
    Json(payload): Json<NewTaskRequest>,
) -> SnapshotResult {
    let reminder = Reminder::parse_optional(payload.reminder.as_deref())?;
    snapshot_after(&state, |tracker| tracker.add_task(&payload.name, reminder).map(|_| ())).await
}

pub async fn schedule_task(
    State(state): State<AppState>,
    Json(payload): Json<ScheduleTaskRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker
            .add_scheduled_task(&payload.name, &payload.datetime)
            .map(|_| ())
    })
    .await
}

pub async fn toggle_task(State(state): State<AppState>, Path(id): Path<ItemId>) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.toggle_task(id);
        Ok(())
    })
    .await
}

pub async fn rename_task(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(payload): Json<RenameRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| tracker.rename_task(id, &payload.name).map(|_| ())).await
}

pub async fn set_task_reminder(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(payload): Json<ReminderRequest>,
) -> SnapshotResult {
    let reminder = Reminder::parse_optional(payload.reminder.as_deref())?;
    snapshot_after(&state, |tracker| {
        tracker.set_task_reminder(id, reminder);
        Ok(())
    })
    .await
}

pub async fn move_task(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(payload): Json<MoveRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.move_task(id, payload.direction, payload.view);
        Ok(())
    })
    .await
}

pub async fn swap_tasks(
    State(state): State<AppState>,
    Json(payload): Json<SwapRequest>,
) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.swap_tasks(payload.first, payload.second);
        Ok(())
    })
    .await
}

pub async fn delete_task(State(state): State<AppState>, Path(id): Path<ItemId>) -> SnapshotResult {
    snapshot_after(&state, |tracker| {
        tracker.delete_task(id);
        Ok(())
    })
    .await
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let stats = apply(&state, |tracker| Ok(build_stats(tracker))).await?;
    Ok(Json(stats))
}

pub async fn shift_chart(
    State(state): State<AppState>,
    Json(payload): Json<ChartShiftRequest>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = apply(&state, |tracker| {
        tracker.shift_chart(payload.weeks);
        Ok(build_stats(tracker))
    })
    .await?;
    Ok(Json(stats))
}

pub async fn reset_chart(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let stats = apply(&state, |tracker| {
        tracker.reset_chart();
        Ok(build_stats(tracker))
    })
    .await?;
    Ok(Json(stats))
}

pub async fn get_reminders(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReminderEntry>>, AppError> {
    let reminders = apply(&state, |tracker| Ok(tracker.reminders())).await?;
    Ok(Json(reminders))
}
