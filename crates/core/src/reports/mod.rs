//! Activity reporting.
//!
//! Pure aggregation over session facts loaded by the caller:
//! - report windows (weekly, monthly, custom)
//! - totals and per-school, per-module, per-trainer breakdowns
//! - a short-lived result cache

pub mod cache;
pub mod error;
pub mod period;
pub mod service;
pub mod types;


pub use cache::ReportCache;
pub use error::ReportError;
pub use period::{PeriodKind, ReportPeriod};
pub use service::{ReportService, UNASSIGNED_LABEL};
pub use types::*;
