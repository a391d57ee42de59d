use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;
use tracing::warn;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jakarta;

/// Source of the current instant. Lets tests move time across day boundaries.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimezoneSource {
    Stored,
    Environment,
    Default,
}

/// Picks the effective zone: the stored id, then the environment, then the default.
pub fn resolve_timezone(stored: Option<&str>, environment: Option<&str>) -> (Tz, TimezoneSource) {
    if let Some(raw) = stored {
        match raw.parse::<Tz>() {
            Ok(zone) => return (zone, TimezoneSource::Stored),
            Err(_) => warn!("ignoring unknown stored timezone '{raw}'"),
        }
    }

    if let Some(raw) = environment {
        match raw.parse::<Tz>() {
            Ok(zone) => return (zone, TimezoneSource::Environment),
            Err(_) => warn!("ignoring unknown environment timezone '{raw}'"),
        }
    }

    warn!("timezone unavailable, using default {DEFAULT_TIMEZONE}");
    (DEFAULT_TIMEZONE, TimezoneSource::Default)
}

pub fn today(clock: &dyn Clock, zone: Tz) -> NaiveDate {
    clock.now().with_timezone(&zone).date_naive()
}
