//! Conversions between stored rows and core domain types.

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;

use classplan_core::catalog::{self, ModuleContent};
use classplan_core::notification;
use classplan_core::reports::PeriodKind;
use classplan_core::scheduling::{
    self, AvailabilityWindow, BookedSession, SchedulingError, TimeRange,
};
use classplan_core::school::{self, Contact, DateRange, SchoolConstraints};
use classplan_core::session;

use crate::entities::{
    availabilities, modules, schools, sessions,
    sea_orm_active_enums::{
        AvailabilityType, EventKind, PartnerStatus, PricingType, RecipientRole, ReportPeriodKind,
        SchoolType, SessionStatus,
    },
};

/// Stored timestamps come back with the connection offset.
pub(crate) fn to_utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

macro_rules! enum_mapping {
    ($db:ty, $core:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                type Source = $db;
                match value {
                    $(Source::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                type Source = $core;
                match value {
                    $(Source::$variant => Self::$variant,)+
                }
            }
        }
    };
}

enum_mapping!(
    SessionStatus,
    session::SessionStatus,
    [Proposed, Confirmed, InProgress, Completed, Cancelled]
);
enum_mapping!(
    SchoolType,
    school::SchoolType,
    [Primary, Middle, High, Vocational, Higher, Other]
);
enum_mapping!(
    PartnerStatus,
    school::PartnerStatus,
    [Prospect, ActivePartner, InactivePartner]
);
enum_mapping!(PricingType, catalog::PricingType, [Hourly, Fixed, Negotiable]);
enum_mapping!(
    AvailabilityType,
    scheduling::AvailabilityType,
    [Available, Unavailable, Booked]
);
enum_mapping!(
    EventKind,
    notification::EventKind,
    [
        Created,
        Updated,
        Confirmed,
        Started,
        Completed,
        Cancelled,
        Accepted,
        Rejected,
        Countered,
        CounterApplied,
        TrainerAssigned,
    ]
);
enum_mapping!(
    RecipientRole,
    notification::RecipientRole,
    [Staff, School, Trainer]
);
enum_mapping!(ReportPeriodKind, PeriodKind, [Weekly, Monthly, Custom]);

impl sessions::Model {
    /// Current core status.
    pub fn core_status(&self) -> session::SessionStatus {
        self.status.into()
    }

    /// Scheduled range.
    pub fn range(&self) -> Result<TimeRange, SchedulingError> {
        TimeRange::new(to_utc(self.start_at), to_utc(self.end_at))
    }

    /// Pending counter-proposal, if the school made one.
    pub fn counter_proposal(&self) -> Option<session::CounterProposal> {
        match (self.proposed_start, self.proposed_end) {
            (Some(start), Some(end)) => Some(session::CounterProposal {
                start: to_utc(start),
                end: to_utc(end),
                comment: self.counter_comment.clone(),
            }),
            _ => None,
        }
    }

    /// View used by conflict checks.
    pub fn booked(&self) -> Result<BookedSession, SchedulingError> {
        Ok(BookedSession {
            session_id: self.id.into(),
            trainer_id: self.trainer_id.map(Into::into),
            range: self.range()?,
            status: self.core_status(),
        })
    }
}

impl availabilities::Model {
    /// View used by conflict checks.
    pub fn window(&self) -> Result<AvailabilityWindow, SchedulingError> {
        Ok(AvailabilityWindow {
            id: self.id.into(),
            trainer_id: self.trainer_id.into(),
            range: TimeRange::new(to_utc(self.start_at), to_utc(self.end_at))?,
            kind: self.availability_type.into(),
        })
    }
}

impl schools::Model {
    /// Contacts stored as JSON.
    pub fn contact_list(&self) -> Vec<Contact> {
        serde_json::from_value(self.contacts.clone()).unwrap_or_default()
    }

    /// Calendar constraints of the school.
    pub fn constraints(&self) -> Result<SchoolConstraints, serde_json::Error> {
        Ok(SchoolConstraints {
            timezone: self.timezone.clone(),
            day_start: self.day_start,
            day_end: self.day_end,
            working_days: self
                .working_days
                .iter()
                .filter_map(|d| u8::try_from(*d).ok())
                .collect(),
            vacations: serde_json::from_value::<Vec<DateRange>>(self.vacations.clone())?,
            exam_periods: serde_json::from_value::<Vec<DateRange>>(self.exam_periods.clone())?,
            blocked_dates: serde_json::from_value(self.blocked_dates.clone())?,
        })
    }
}

impl modules::Model {
    /// Copyable content of the module.
    pub fn content(&self) -> ModuleContent {
        ModuleContent {
            code: self.code.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            duration_hours: self.duration_hours,
            pricing_type: self.pricing_type.into(),
            price: self.price,
            objectives: self.objectives.clone(),
            prerequisites: self.prerequisites.clone(),
            rncp_code: self.rncp_code.clone(),
            metadata: self.metadata.clone(),
            skills: self.skills.clone(),
            categories: self.categories.clone(),
            is_active: self.is_active,
        }
    }
}
