//! Delivery of notification events.

use async_trait::async_trait;
use thiserror::Error;

use crate::notification::types::NotificationEvent;

/// Delivery failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Sends notification events to people.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `event` to `recipients` (email addresses).
    async fn notify(
        &self,
        event: &NotificationEvent,
        recipients: &[String],
    ) -> Result<(), NotifyError>;
}

/// Result of a best-effort delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Sent to this many recipients.
    Sent(usize),
    /// Nobody to send to.
    NoRecipients,
    /// The notifier failed; the originating request still succeeds.
    Failed(String),
}

/// Delivers an event without ever failing the caller.
///
/// Blank addresses are dropped before calling the notifier.
pub async fn deliver(
    notifier: &dyn Notifier,
    event: &NotificationEvent,
    recipients: &[String],
) -> Delivery {
    let recipients: Vec<String> = recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(ToString::to_string)
        .collect();

    if recipients.is_empty() {
        return Delivery::NoRecipients;
    }

    match notifier.notify(event, &recipients).await {
        Ok(()) => Delivery::Sent(recipients.len()),
        Err(e) => Delivery::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::types::{EventKind, RecipientRole};
    use classplan_shared::types::SessionId;
    use uuid::Uuid;

    fn event() -> NotificationEvent {
        NotificationEvent {
            session_id: SessionId::new(),
            kind: EventKind::Confirmed,
            actor: Uuid::new_v4(),
            recipient: RecipientRole::School,
            subject: "subject".into(),
            message: "message".into(),
            payload: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_deliver_sends_to_trimmed_recipients() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|_, recipients| recipients == ["a@school.fr".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = deliver(
            &notifier,
            &event(),
            &[" a@school.fr ".to_string(), "  ".to_string()],
        )
        .await;
        assert_eq!(outcome, Delivery::Sent(1));
    }

    #[tokio::test]
    async fn test_deliver_without_recipients_skips_notifier() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let outcome = deliver(&notifier, &event(), &[]).await;
        assert_eq!(outcome, Delivery::NoRecipients);
    }

    #[tokio::test]
    async fn test_deliver_swallows_failure() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_, _| Err(NotifyError("smtp down".into())));

        let outcome = deliver(&notifier, &event(), &["staff@provider.fr".to_string()]).await;
        assert_eq!(
            outcome,
            Delivery::Failed("Notification delivery failed: smtp down".into())
        );
    }
}
