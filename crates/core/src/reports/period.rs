//! Report windows.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reports::error::ReportError;

/// Cadence of a report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// Monday to Sunday.
    Weekly,
    /// Calendar month.
    Monthly,
    /// Arbitrary dates.
    Custom,
}

impl PeriodKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of days covered by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// Cadence.
    pub kind: PeriodKind,
    /// First day.
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

impl ReportPeriod {
    /// Custom period.
    ///
    /// # Errors
    /// `InvalidDateRange` when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self {
            kind: PeriodKind::Custom,
            start,
            end,
        })
    }

    /// The Monday-to-Sunday week containing `date`.
    ///
    /// # Errors
    /// `DateOutOfRange` at the edges of the calendar.
    pub fn week_containing(date: NaiveDate) -> Result<Self, ReportError> {
        let back = u64::from(date.weekday().num_days_from_monday());
        let start = date
            .checked_sub_days(Days::new(back))
            .ok_or(ReportError::DateOutOfRange)?;
        let end = start
            .checked_add_days(Days::new(6))
            .ok_or(ReportError::DateOutOfRange)?;
        Ok(Self {
            kind: PeriodKind::Weekly,
            start,
            end,
        })
    }

    /// The calendar month containing `date`.
    ///
    /// # Errors
    /// `DateOutOfRange` at the edges of the calendar.
    pub fn month_containing(date: NaiveDate) -> Result<Self, ReportError> {
        let start = date.with_day(1).ok_or(ReportError::DateOutOfRange)?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or(ReportError::DateOutOfRange)?;
        Ok(Self {
            kind: PeriodKind::Monthly,
            start,
            end,
        })
    }

    /// The full week before the one containing `today`.
    ///
    /// # Errors
    /// `DateOutOfRange` at the edges of the calendar.
    pub fn previous_week(today: NaiveDate) -> Result<Self, ReportError> {
        let last_week = today
            .checked_sub_days(Days::new(7))
            .ok_or(ReportError::DateOutOfRange)?;
        Self::week_containing(last_week)
    }

    /// The full month before the one containing `today`.
    ///
    /// # Errors
    /// `DateOutOfRange` at the edges of the calendar.
    pub fn previous_month(today: NaiveDate) -> Result<Self, ReportError> {
        let last_month = today
            .with_day(1)
            .and_then(|first| first.pred_opt())
            .ok_or(ReportError::DateOutOfRange)?;
        Self::month_containing(last_month)
    }

    /// Number of days covered.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Half-open UTC bounds `[start 00:00, end + 1 day 00:00)` for queries.
    #[must_use]
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self
            .end
            .succ_opt()
            .unwrap_or(self.end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        (start, end)
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert_eq!(
            ReportPeriod::new(d(2026, 3, 2), d(2026, 3, 1)),
            Err(ReportError::InvalidDateRange {
                start: d(2026, 3, 2),
                end: d(2026, 3, 1)
            })
        );
        assert_eq!(ReportPeriod::new(d(2026, 3, 1), d(2026, 3, 1)).unwrap().days(), 1);
    }

    #[rstest]
    #[case(d(2026, 3, 2), d(2026, 3, 2), d(2026, 3, 8))] // Monday
    #[case(d(2026, 3, 8), d(2026, 3, 2), d(2026, 3, 8))] // Sunday
    #[case(d(2026, 1, 1), d(2025, 12, 29), d(2026, 1, 4))] // across years
    fn test_week_containing(
        #[case] date: NaiveDate,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let week = ReportPeriod::week_containing(date).unwrap();
        assert_eq!((week.start, week.end), (start, end));
        assert_eq!(week.kind, PeriodKind::Weekly);
        assert_eq!(week.days(), 7);
    }

    #[rstest]
    #[case(d(2026, 2, 14), d(2026, 2, 1), d(2026, 2, 28))]
    #[case(d(2028, 2, 29), d(2028, 2, 1), d(2028, 2, 29))]
    #[case(d(2026, 12, 31), d(2026, 12, 1), d(2026, 12, 31))]
    fn test_month_containing(
        #[case] date: NaiveDate,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let month = ReportPeriod::month_containing(date).unwrap();
        assert_eq!((month.start, month.end), (start, end));
    }

    #[test]
    fn test_previous_windows() {
        let week = ReportPeriod::previous_week(d(2026, 3, 4)).unwrap();
        assert_eq!((week.start, week.end), (d(2026, 2, 23), d(2026, 3, 1)));

        let month = ReportPeriod::previous_month(d(2026, 1, 15)).unwrap();
        assert_eq!((month.start, month.end), (d(2025, 12, 1), d(2025, 12, 31)));
    }

    #[test]
    fn test_utc_bounds() {
        let period = ReportPeriod::new(d(2026, 3, 1), d(2026, 3, 31)).unwrap();
        let (start, end) = period.utc_bounds();
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-04-01T00:00:00+00:00");
    }
}
