//! Scheduling: time ranges, trainer conflicts and calendar queries.
//!
//! Planning helpers here are deterministic filters. There is no
//! suggestion or optimization engine.

pub mod calendar;
pub mod conflict;
pub mod error;
pub mod types;

#[cfg(test)]
mod conflict_props;

pub use calendar::{CalendarFilter, CalendarItem, group_by_day, local_day, parse_timezone};
pub use conflict::{
    available_trainers, covered_by_availability, find_conflicts, find_pairwise_conflicts,
    schedule_conflicts, trainer_conflicts,
};
pub use error::SchedulingError;
pub use types::{
    AvailabilityType, AvailabilityWindow, BookedSession, Conflict, ScheduleConflict, Scheduled,
    TimeRange, TrainerSchedule,
};
