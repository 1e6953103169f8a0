//! Scheduling domain types.

use chrono::{DateTime, Duration, Utc};
use classplan_shared::types::{AvailabilityId, SessionId, TrainerId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scheduling::error::SchedulingError;
use crate::session::SessionStatus;

/// A half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = SchedulingError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Creates a range, rejecting `end <= start`.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidTimeRange` for empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SchedulingError> {
        if end <= start {
            return Err(SchedulingError::InvalidTimeRange);
        }
        Ok(Self { start, end })
    }

    /// Start of the range.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the range (exclusive).
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the range.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in hours, to the minute.
    #[must_use]
    pub fn hours(&self) -> Decimal {
        Decimal::from(self.duration().num_minutes()) / Decimal::from(60)
    }

    /// `self.start < other.end && self.end > other.start`.
    ///
    /// Touching ranges do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Returns true if `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Anything that occupies a time range.
pub trait Scheduled {
    /// The occupied range.
    fn range(&self) -> TimeRange;
}

impl Scheduled for TimeRange {
    fn range(&self) -> TimeRange {
        *self
    }
}

impl<T: Scheduled + ?Sized> Scheduled for &T {
    fn range(&self) -> TimeRange {
        (**self).range()
    }
}

/// Kind of a trainer availability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityType {
    /// Trainer declared being free.
    Available,
    /// Trainer declared being away.
    Unavailable,
    /// Trainer is booked elsewhere.
    Booked,
}

impl AvailabilityType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Booked => "booked",
        }
    }

    /// Parses from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(Self::Available),
            "unavailable" => Some(Self::Unavailable),
            "booked" => Some(Self::Booked),
            _ => None,
        }
    }

    /// Returns true if the window makes the trainer unassignable.
    #[must_use]
    pub const fn blocks(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Booked)
    }
}

impl fmt::Display for AvailabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Window id.
    pub id: AvailabilityId,
    /// Owning trainer.
    pub trainer_id: TrainerId,
    /// Covered range.
    pub range: TimeRange,
    /// Kind of window.
    pub kind: AvailabilityType,
}

impl Scheduled for AvailabilityWindow {
    fn range(&self) -> TimeRange {
        self.range
    }
}

/// A session as seen by conflict detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSession {
    /// Session id.
    pub session_id: SessionId,
    /// Assigned trainer, if any.
    pub trainer_id: Option<TrainerId>,
    /// Scheduled range.
    pub range: TimeRange,
    /// Current status.
    pub status: SessionStatus,
}

impl Scheduled for BookedSession {
    fn range(&self) -> TimeRange {
        self.range
    }
}

/// What a slot collides with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Conflict {
    /// Another session of the same trainer.
    Session {
        /// Colliding session.
        session_id: SessionId,
        /// Its range.
        range: TimeRange,
    },
    /// A blocking availability window.
    Availability {
        /// Colliding window.
        availability_id: AvailabilityId,
        /// Window kind.
        kind: AvailabilityType,
        /// Its range.
        range: TimeRange,
    },
}

/// A session of a trainer that clashes with something else on their
/// schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    /// Trainer concerned.
    pub trainer_id: TrainerId,
    /// Session at fault.
    pub session_id: SessionId,
    /// Its range.
    pub range: TimeRange,
    /// What it collides with.
    pub conflicts_with: Conflict,
}

/// Everything known about one trainer's time.
#[derive(Debug, Clone, Default)]
pub struct TrainerSchedule {
    /// Trainer id.
    pub trainer_id: TrainerId,
    /// Sessions assigned to the trainer.
    pub sessions: Vec<BookedSession>,
    /// Declared windows.
    pub windows: Vec<AvailabilityWindow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_and_empty() {
        assert_eq!(
            TimeRange::new(at(10), at(9)),
            Err(SchedulingError::InvalidTimeRange)
        );
        assert_eq!(
            TimeRange::new(at(9), at(9)),
            Err(SchedulingError::InvalidTimeRange)
        );
        assert!(TimeRange::new(at(9), at(10)).is_ok());
    }

    #[test]
    fn test_overlap_rules() {
        let a = TimeRange::new(at(9), at(12)).unwrap();
        let b = TimeRange::new(at(11), at(13)).unwrap();
        let touching = TimeRange::new(at(12), at(14)).unwrap();
        let inner = TimeRange::new(at(10), at(11)).unwrap();

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inner));
        assert!(a.contains(&inner));
        assert!(!inner.contains(&a));
    }

    #[test]
    fn test_hours() {
        let range = TimeRange::new(at(9), at(9) + Duration::minutes(150)).unwrap();
        assert_eq!(range.hours(), dec!(2.5));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<TimeRange, _> = serde_json::from_str(
            r#"{"start":"2026-03-02T09:00:00Z","end":"2026-03-02T10:00:00Z"}"#,
        );
        assert!(ok.is_ok());
        let inverted: Result<TimeRange, _> = serde_json::from_str(
            r#"{"start":"2026-03-02T10:00:00Z","end":"2026-03-02T09:00:00Z"}"#,
        );
        assert!(inverted.is_err());
    }

    #[test]
    fn test_availability_type() {
        assert!(AvailabilityType::Booked.blocks());
        assert!(AvailabilityType::Unavailable.blocks());
        assert!(!AvailabilityType::Available.blocks());
        assert_eq!(
            AvailabilityType::parse("BOOKED"),
            Some(AvailabilityType::Booked)
        );
        assert_eq!(AvailabilityType::parse("busy"), None);
    }
}
