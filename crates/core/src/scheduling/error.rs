//! Scheduling error types.

use thiserror::Error;

/// Errors raised by time range and conflict checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// End is not strictly after start.
    #[error("End must be after start")]
    InvalidTimeRange,

    /// Unknown IANA timezone name.
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}

impl SchedulingError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTimeRange | Self::InvalidTimezone(_) => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTimeRange => "INVALID_TIME_RANGE",
            Self::InvalidTimezone(_) => "INVALID_TIMEZONE",
        }
    }
}
