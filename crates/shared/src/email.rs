//! Email service for session notifications and scheduled reports.
//!
//! Uses `lettre` for SMTP transport. Bodies are plain text.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    /// No recipient given.
    #[error("No recipients")]
    NoRecipients,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("smtp_host", &self.config.smtp_host)
            .field("smtp_port", &self.config.smtp_port)
            .finish_non_exhaustive()
    }
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Address of the staff mailbox.
    #[must_use]
    pub fn staff_email(&self) -> &str {
        &self.config.staff_email
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = if self.config.smtp_username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| EmailError::SendError(e.to_string()))?
                .credentials(Credentials::new(
                    self.config.smtp_username.clone(),
                    self.config.smtp_password.clone(),
                ))
        };

        Ok(builder.port(self.config.smtp_port).build())
    }

    /// Builds a plain-text message to one or more recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if an address does not parse or the list is empty.
    pub fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<Message, EmailError> {
        if recipients.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let mut builder = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for to in recipients {
            builder = builder.to(to
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{to}: {e}")))?);
        }

        builder
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }

    /// Sends a plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let email = self.build_message(recipients, subject, body)?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        EmailService::new(EmailConfig::default())
    }

    #[test]
    fn test_email_config_default() {
        let config = EmailConfig::default();
        assert_eq!(config.smtp_host, "localhost");
        assert_eq!(config.smtp_port, 1025);
    }

    #[test]
    fn test_build_message_multiple_recipients() {
        let message = service()
            .build_message(
                &["a@school.fr".to_string(), "b@school.fr".to_string()],
                "Session confirmed",
                "Hello",
            )
            .unwrap();

        assert_eq!(message.envelope().to().len(), 2);
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let result = service().build_message(&["not an address".to_string()], "s", "b");
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[test]
    fn test_build_message_requires_recipient() {
        let result = service().build_message(&[], "s", "b");
        assert!(matches!(result, Err(EmailError::NoRecipients)));
    }

    #[tokio::test]
    async fn test_create_transport() {
        assert!(service().create_transport().is_ok());
    }

    #[test]
    fn test_email_error_display() {
        assert_eq!(
            format!("{}", EmailError::SendError("msg".into())),
            "Failed to send email: msg"
        );
        assert_eq!(format!("{}", EmailError::NoRecipients), "No recipients");
    }
}
