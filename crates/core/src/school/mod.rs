//! Partner schools: classification, contacts and calendar constraints.

pub mod constraints;
pub mod types;

pub use constraints::{ConstraintError, ConstraintViolation, SchoolConstraints};
pub use types::{Contact, DateRange, PartnerStatus, SchoolType, contact_emails};
