//! Calendar window queries.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use classplan_shared::types::{ModuleId, SchoolId, TrainerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scheduling::error::SchedulingError;
use crate::scheduling::types::TimeRange;
use crate::session::SessionStatus;

/// Filters for a calendar query. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFilter {
    /// Restrict to one school.
    pub school_id: Option<SchoolId>,
    /// Restrict to one trainer.
    pub trainer_id: Option<TrainerId>,
    /// Restrict to one module.
    pub module_id: Option<ModuleId>,
    /// Restrict to one status.
    pub status: Option<SessionStatus>,
}

/// Minimal view of a session for calendar filtering.
pub trait CalendarItem {
    /// Scheduled range.
    fn range(&self) -> TimeRange;
    /// School of the session.
    fn school_id(&self) -> SchoolId;
    /// Trainer, when assigned.
    fn trainer_id(&self) -> Option<TrainerId>;
    /// Module delivered.
    fn module_id(&self) -> ModuleId;
    /// Current status.
    fn status(&self) -> SessionStatus;
}

impl CalendarFilter {
    /// Returns true if `item` satisfies every set filter.
    pub fn matches<T: CalendarItem>(&self, item: &T) -> bool {
        self.school_id.is_none_or(|id| id == item.school_id())
            && self
                .trainer_id
                .is_none_or(|id| item.trainer_id() == Some(id))
            && self.module_id.is_none_or(|id| id == item.module_id())
            && self.status.is_none_or(|s| s == item.status())
    }
}

/// Parses an IANA timezone name.
///
/// # Errors
/// `InvalidTimezone` if the name is unknown.
pub fn parse_timezone(name: &str) -> Result<Tz, SchedulingError> {
    name.parse::<Tz>()
        .map_err(|_| SchedulingError::InvalidTimezone(name.to_string()))
}

/// Local calendar day a UTC instant falls on.
#[must_use]
pub fn local_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Keeps the items inside `window` that pass `filter`, sorted by start, and
/// groups them by the local day they start on.
pub fn group_by_day<T: CalendarItem>(
    items: Vec<T>,
    window: &TimeRange,
    filter: &CalendarFilter,
    tz: Tz,
) -> BTreeMap<NaiveDate, Vec<T>> {
    let mut kept: Vec<T> = items
        .into_iter()
        .filter(|item| item.range().overlaps(window) && filter.matches(item))
        .collect();
    kept.sort_by_key(|item| item.range().start());

    let mut days: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    for item in kept {
        days.entry(local_day(item.range().start(), tz))
            .or_default()
            .push(item);
    }
    days
}
