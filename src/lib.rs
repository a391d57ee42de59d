pub mod app;
pub mod clock;
pub mod collections;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod progress;
pub mod reminders;
pub mod rollover;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tracker;

pub use app::{router, spawn_rollover_watch};
pub use config::{AppConfig, Policy};
pub use state::AppState;
pub use storage::{load_store, persist_store};
pub use tracker::Tracker;
