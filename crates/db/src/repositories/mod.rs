//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod availability;
mod convert;
pub mod event;
pub mod module;
pub mod planning;
pub mod report;
pub mod school;
pub mod session;
pub mod trainer;
pub mod workflow;

pub use availability::{AvailabilityError, AvailabilityInput, AvailabilityRepository};
pub use event::{EventRepository, FeedScope};
pub use module::{ModuleError, ModuleFilter, ModuleRepository};
pub use planning::{CalendarEntry, PlanningRepository};
pub use report::{ReportRepository, RunStatus};
pub use school::{
    CreateSchoolInput, SchoolError, SchoolFilter, SchoolRepository, UpdateSchoolInput,
};
pub use session::{
    BookingError, CreateSessionInput, SessionFilter, SessionParties, SessionRepository,
    SessionScope, SessionWrite, UpdateSessionInput,
};
pub use trainer::{
    CreateTrainerInput, TrainerError, TrainerFilter, TrainerRepository, UpdateTrainerInput,
};
pub use workflow::{TransitionOutcome, WorkflowRepository};
