//! Session audit events and their delivery.

pub mod notifier;
pub mod types;

pub use notifier::{Delivery, Notifier, NotifyError, deliver};
pub use types::{EventKind, NotificationEvent, RecipientRole, SessionSummary};
