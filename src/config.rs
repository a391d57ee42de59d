use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

/// Which tasks count toward a day's completion, and how rollover treats them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskScope {
    /// Every task counts; rollover resets all of them.
    All,
    /// Only tasks dated the current day count; rollover prunes completed past
    /// tasks and resets the new day's tasks.
    #[default]
    CurrentDay,
}

/// What happens when a day stops being fully complete after its bonus was awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakReversal {
    #[default]
    Revert,
    Penalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakFloor {
    Zero,
    #[default]
    NegativeHundred,
}

impl StreakFloor {
    pub fn value(self) -> i32 {
        match self {
            Self::Zero => 0,
            Self::NegativeHundred => -100,
        }
    }
}

impl FromStr for TaskScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "current-day" | "current_day" | "today" => Ok(Self::CurrentDay),
            other => Err(format!("unknown task scope '{other}'")),
        }
    }
}

impl FromStr for StreakReversal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revert" => Ok(Self::Revert),
            "penalize" | "penalise" => Ok(Self::Penalize),
            other => Err(format!("unknown streak reversal '{other}'")),
        }
    }
}

impl FromStr for StreakFloor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::Zero),
            "-100" => Ok(Self::NegativeHundred),
            other => Err(format!("unknown streak floor '{other}', expected 0 or -100")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Policy {
    pub task_scope: TaskScope,
    pub reversal: StreakReversal,
    pub floor: StreakFloor,
}

impl Policy {
    pub fn clamp(&self, progress: i32) -> i32 {
        progress.clamp(self.floor.value(), crate::models::MAX_CIRCLE_PROGRESS)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub timezone: Option<String>,
    pub reminder_endpoint: Option<String>,
    pub policy: Policy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let timezone = non_empty_var("APP_TIMEZONE").or_else(|| non_empty_var("TZ"));

        Self {
            port,
            data_path: resolve_data_path(),
            timezone,
            reminder_endpoint: non_empty_var("REMINDER_ENDPOINT"),
            policy: Policy {
                task_scope: parse_var("TASK_SCOPE"),
                reversal: parse_var("STREAK_REVERSAL"),
                floor: parse_var("STREAK_FLOOR"),
            },
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(name: &str) -> T
where
    T: FromStr<Err = String> + Default,
{
    match non_empty_var(name) {
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            warn!("{name}: {err}; using default");
            T::default()
        }),
        None => T::default(),
    }
}
