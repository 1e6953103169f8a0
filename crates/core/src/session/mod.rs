//! Session lifecycle management.
//!
//! - `types` - status, school responses and workflow actions
//! - `error` - session-specific errors
//! - `service` - transition rules

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::SessionError;
pub use service::{MAX_SESSION_DAYS, SessionWorkflow, validate_range, validate_satisfaction};
pub use types::{CounterProposal, ProposalResponse, SessionAction, SessionStatus};
