use axum::http::StatusCode;
use std::fmt;

/// Validation failures raised by tracker operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    EmptyName,
    InvalidReminder(String),
    InvalidDateTime(String),
    DateInPast(String),
    UnknownTimezone(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::InvalidReminder(value) => write!(f, "invalid reminder time '{value}', expected HH:MM"),
            Self::InvalidDateTime(value) => {
                write!(f, "invalid date and time '{value}', expected YYYY-MM-DDTHH:MM")
            }
            Self::DateInPast(value) => write!(f, "{value} is in the past; pick a current or future time"),
            Self::UnknownTimezone(value) => write!(f, "unknown timezone '{value}'"),
        }
    }
}

impl std::error::Error for TrackerError {}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
