//! School calendar constraints.
//!
//! A proposed slot is checked against the school's working days, working
//! hours, vacations, exam periods and blocked dates, all in the school's
//! local timezone.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduling::{TimeRange, parse_timezone};
use crate::school::types::DateRange;

/// Invalid constraint configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    /// Unknown IANA timezone.
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    /// `day_start` is not before `day_end`, or only one is set.
    #[error("Working hours must have a start before their end")]
    InvalidWorkingHours,
    /// Weekday outside 1..=7.
    #[error("Invalid ISO weekday: {0}")]
    InvalidWeekday(u8),
    /// A period ends before it starts.
    #[error("Period ends before it starts: {0} > {1}")]
    InvalidPeriod(NaiveDate, NaiveDate),
}

/// One reason a slot does not fit the school calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintViolation {
    /// Falls on a day the school is closed.
    OutsideWorkingDays {
        /// Offending local day.
        date: NaiveDate,
    },
    /// Starts before opening or ends after closing.
    OutsideWorkingHours {
        /// Opening time.
        day_start: NaiveTime,
        /// Closing time.
        day_end: NaiveTime,
    },
    /// Overlaps a vacation period.
    Vacation {
        /// Offending local day.
        date: NaiveDate,
        /// Period label.
        label: Option<String>,
    },
    /// Overlaps an exam period.
    ExamPeriod {
        /// Offending local day.
        date: NaiveDate,
        /// Period label.
        label: Option<String>,
    },
    /// Falls on a blocked date.
    BlockedDate {
        /// The blocked day.
        date: NaiveDate,
    },
}

impl ConstraintViolation {
    /// Human-readable warning.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::OutsideWorkingDays { date } => {
                format!("{date} ({}) is not a working day", date.weekday())
            }
            Self::OutsideWorkingHours { day_start, day_end } => format!(
                "Slot is outside working hours {}-{}",
                day_start.format("%H:%M"),
                day_end.format("%H:%M")
            ),
            Self::Vacation { date, label } => match label {
                Some(label) => format!("{date} falls in vacation period \"{label}\""),
                None => format!("{date} falls in a vacation period"),
            },
            Self::ExamPeriod { date, label } => match label {
                Some(label) => format!("{date} falls in exam period \"{label}\""),
                None => format!("{date} falls in an exam period"),
            },
            Self::BlockedDate { date } => format!("{date} is a blocked date"),
        }
    }
}

/// Calendar constraints of a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolConstraints {
    /// IANA timezone name.
    pub timezone: String,
    /// Opening time, local.
    #[serde(default)]
    pub day_start: Option<NaiveTime>,
    /// Closing time, local.
    #[serde(default)]
    pub day_end: Option<NaiveTime>,
    /// ISO weekdays the school is open (1 = Monday). Empty means every day.
    #[serde(default)]
    pub working_days: Vec<u8>,
    /// Vacation periods.
    #[serde(default)]
    pub vacations: Vec<DateRange>,
    /// Exam periods.
    #[serde(default)]
    pub exam_periods: Vec<DateRange>,
    /// Single closed days.
    #[serde(default)]
    pub blocked_dates: Vec<NaiveDate>,
}

impl Default for SchoolConstraints {
    fn default() -> Self {
        Self {
            timezone: "Europe/Paris".to_string(),
            day_start: None,
            day_end: None,
            working_days: vec![1, 2, 3, 4, 5],
            vacations: Vec::new(),
            exam_periods: Vec::new(),
            blocked_dates: Vec::new(),
        }
    }
}

impl SchoolConstraints {
    /// Validates the configuration itself.
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConstraintError> {
        self.tz()?;

        match (self.day_start, self.day_end) {
            (Some(start), Some(end)) if start < end => {}
            (None, None) => {}
            _ => return Err(ConstraintError::InvalidWorkingHours),
        }

        if let Some(day) = self.working_days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(ConstraintError::InvalidWeekday(*day));
        }

        for period in self.vacations.iter().chain(&self.exam_periods) {
            if period.start > period.end {
                return Err(ConstraintError::InvalidPeriod(period.start, period.end));
            }
        }

        Ok(())
    }

    /// Parsed timezone.
    ///
    /// # Errors
    /// `InvalidTimezone` when the name is unknown.
    pub fn tz(&self) -> Result<Tz, ConstraintError> {
        parse_timezone(&self.timezone)
            .map_err(|_| ConstraintError::InvalidTimezone(self.timezone.clone()))
    }

    /// Lists every constraint `slot` violates. Empty means the slot fits.
    ///
    /// # Errors
    /// `InvalidTimezone` when the stored timezone is unknown.
    pub fn check(&self, slot: &TimeRange) -> Result<Vec<ConstraintViolation>, ConstraintError> {
        let tz = self.tz()?;
        let local_start = slot.start().with_timezone(&tz);
        let local_end = slot.end().with_timezone(&tz);

        // The end is exclusive: a slot ending at midnight does not touch the next day.
        let first_day = local_start.date_naive();
        let last_day = (local_end - Duration::nanoseconds(1)).date_naive();
        let days: Vec<NaiveDate> = first_day
            .iter_days()
            .take_while(|d| *d <= last_day)
            .collect();

        let mut violations = Vec::new();

        if !self.working_days.is_empty() {
            for day in &days {
                let iso = u8::try_from(day.weekday().number_from_monday()).unwrap_or(0);
                if !self.working_days.contains(&iso) {
                    violations.push(ConstraintViolation::OutsideWorkingDays { date: *day });
                }
            }
        }

        if let (Some(day_start), Some(day_end)) = (self.day_start, self.day_end) {
            let spans_days = first_day != last_day;
            let ends_late = local_end.date_naive() != first_day || local_end.time() > day_end;
            if spans_days || local_start.time() < day_start || ends_late {
                violations.push(ConstraintViolation::OutsideWorkingHours { day_start, day_end });
            }
        }

        for day in &days {
            if let Some(period) = self.vacations.iter().find(|p| p.contains(*day)) {
                violations.push(ConstraintViolation::Vacation {
                    date: *day,
                    label: period.label.clone(),
                });
            }
            if let Some(period) = self.exam_periods.iter().find(|p| p.contains(*day)) {
                violations.push(ConstraintViolation::ExamPeriod {
                    date: *day,
                    label: period.label.clone(),
                });
            }
            if self.blocked_dates.contains(day) {
                violations.push(ConstraintViolation::BlockedDate { date: *day });
            }
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Slot given in Paris local time (UTC+1 in winter).
    fn paris_slot(m: u32, d: u32, from: u32, to: u32) -> TimeRange {
        let tz: Tz = "Europe/Paris".parse().unwrap();
        let start = tz.with_ymd_and_hms(2026, m, d, from, 0, 0).unwrap();
        let end = tz.with_ymd_and_hms(2026, m, d, to, 0, 0).unwrap();
        TimeRange::new(start.with_timezone(&Utc), end.with_timezone(&Utc)).unwrap()
    }

    fn school() -> SchoolConstraints {
        SchoolConstraints {
            day_start: Some(time(8, 0)),
            day_end: Some(time(17, 30)),
            vacations: vec![DateRange {
                start: date(2, 14),
                end: date(3, 1),
                label: Some("winter".into()),
            }],
            exam_periods: vec![DateRange {
                start: date(6, 8),
                end: date(6, 19),
                label: None,
            }],
            blocked_dates: vec![date(3, 10)],
            ..SchoolConstraints::default()
        }
    }

    #[test]
    fn test_slot_that_fits() {
        // Monday 2026-03-02, 09:00-12:00 Paris.
        let violations = school().check(&paris_slot(3, 2, 9, 12)).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_weekend_is_outside_working_days() {
        // Saturday 2026-03-07.
        let violations = school().check(&paris_slot(3, 7, 9, 12)).unwrap();
        assert_eq!(
            violations,
            vec![ConstraintViolation::OutsideWorkingDays { date: date(3, 7) }]
        );
    }

    #[test]
    fn test_outside_working_hours_uses_local_time() {
        // 07:00 Paris is 06:00 UTC; the check must use the local clock.
        let violations = school().check(&paris_slot(3, 3, 7, 9)).unwrap();
        assert!(matches!(
            violations.as_slice(),
            [ConstraintViolation::OutsideWorkingHours { .. }]
        ));

        let late = school().check(&paris_slot(3, 3, 16, 18)).unwrap();
        assert_eq!(late.len(), 1);
    }

    #[test]
    fn test_vacation_exam_and_blocked() {
        let vacation = school().check(&paris_slot(2, 16, 9, 12)).unwrap();
        assert!(matches!(
            vacation.as_slice(),
            [ConstraintViolation::Vacation { label: Some(l), .. }] if l == "winter"
        ));

        let exam = school().check(&paris_slot(6, 9, 9, 12)).unwrap();
        assert!(matches!(
            exam.as_slice(),
            [ConstraintViolation::ExamPeriod { .. }]
        ));

        let blocked = school().check(&paris_slot(3, 10, 9, 12)).unwrap();
        assert_eq!(
            blocked,
            vec![ConstraintViolation::BlockedDate { date: date(3, 10) }]
        );
    }

    #[test]
    fn test_no_working_days_means_every_day() {
        let open = SchoolConstraints {
            working_days: vec![],
            ..SchoolConstraints::default()
        };
        assert!(open.check(&paris_slot(3, 8, 9, 12)).unwrap().is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(school().validate().is_ok());

        let bad_tz = SchoolConstraints {
            timezone: "Nowhere/City".into(),
            ..SchoolConstraints::default()
        };
        assert!(matches!(
            bad_tz.validate(),
            Err(ConstraintError::InvalidTimezone(_))
        ));

        let half_hours = SchoolConstraints {
            day_start: Some(time(8, 0)),
            ..SchoolConstraints::default()
        };
        assert_eq!(
            half_hours.validate(),
            Err(ConstraintError::InvalidWorkingHours)
        );

        let bad_day = SchoolConstraints {
            working_days: vec![1, 8],
            ..SchoolConstraints::default()
        };
        assert_eq!(bad_day.validate(), Err(ConstraintError::InvalidWeekday(8)));

        let bad_period = SchoolConstraints {
            vacations: vec![DateRange {
                start: date(3, 2),
                end: date(3, 1),
                label: None,
            }],
            ..SchoolConstraints::default()
        };
        assert!(matches!(
            bad_period.validate(),
            Err(ConstraintError::InvalidPeriod(_, _))
        ));
    }

    #[test]
    fn test_messages() {
        let v = ConstraintViolation::BlockedDate { date: date(3, 10) };
        assert_eq!(v.message(), "2026-03-10 is a blocked date");
        let v = ConstraintViolation::OutsideWorkingDays { date: date(3, 7) };
        assert_eq!(v.message(), "2026-03-07 (Sat) is not a working day");
    }
}
