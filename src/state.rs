use crate::reminders::Notifier;
use crate::tracker::Tracker;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub tracker: Arc<Mutex<Tracker>>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(data_path: PathBuf, tracker: Tracker, notifier: Notifier) -> Self {
        Self {
            data_path,
            tracker: Arc::new(Mutex::new(tracker)),
            notifier,
        }
    }
}
