//! Email delivery of session notifications.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use classplan_core::notification::{Delivery, NotificationEvent, Notifier, NotifyError, deliver};
use classplan_db::repositories::SessionParties;
use classplan_shared::EmailService;

/// Sends each event as a plain-text email.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    email: Arc<EmailService>,
}

impl EmailNotifier {
    /// Creates a notifier over the shared email service.
    #[must_use]
    pub const fn new(email: Arc<EmailService>) -> Self {
        Self { email }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(
        &self,
        event: &NotificationEvent,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        self.email
            .send_email(recipients, &event.subject, &event.message)
            .await
            .map_err(|e| NotifyError(e.to_string()))
    }
}

/// Sends `events` to the people they are addressed to, in the background.
///
/// Failures are logged and never reach the caller.
pub fn dispatch(
    notifier: &Arc<dyn Notifier>,
    parties: &SessionParties,
    staff_email: &str,
    events: Vec<NotificationEvent>,
) {
    let batch: Vec<(NotificationEvent, Vec<String>)> = events
        .into_iter()
        .map(|event| {
            let recipients = parties.recipients(event.recipient, staff_email);
            (event, recipients)
        })
        .collect();
    let notifier = Arc::clone(notifier);

    tokio::spawn(async move {
        for (event, recipients) in batch {
            log_delivery(&event, deliver(notifier.as_ref(), &event, &recipients).await);
        }
    });
}

fn log_delivery(event: &NotificationEvent, outcome: Delivery) {
    match outcome {
        Delivery::Sent(count) => debug!(
            session_id = %event.session_id,
            kind = %event.kind,
            recipients = count,
            "Notification sent"
        ),
        Delivery::NoRecipients => debug!(
            session_id = %event.session_id,
            kind = %event.kind,
            "Notification has no recipients"
        ),
        Delivery::Failed(error) => warn!(
            session_id = %event.session_id,
            kind = %event.kind,
            error = %error,
            "Notification delivery failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classplan_core::notification::{EventKind, RecipientRole};
    use classplan_shared::EmailConfig;
    use classplan_shared::types::SessionId;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_invalid_address_is_reported_not_raised() {
        let notifier = EmailNotifier::new(Arc::new(EmailService::new(EmailConfig::default())));
        let event = NotificationEvent {
            session_id: SessionId::new(),
            kind: EventKind::Created,
            actor: Uuid::new_v4(),
            recipient: RecipientRole::School,
            subject: "subject".into(),
            message: "body".into(),
            payload: serde_json::json!({}),
        };

        let outcome = deliver(&notifier, &event, &["not an address".to_string()]).await;
        assert!(matches!(outcome, Delivery::Failed(msg) if msg.contains("Invalid email address")));
    }
}
