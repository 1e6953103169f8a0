//! Entity aliases.

pub use super::availabilities::Entity as Availabilities;
pub use super::modules::Entity as Modules;
pub use super::report_runs::Entity as ReportRuns;
pub use super::schools::Entity as Schools;
pub use super::session_events::Entity as SessionEvents;
pub use super::sessions::Entity as Sessions;
pub use super::trainers::Entity as Trainers;
