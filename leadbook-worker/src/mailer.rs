/// Mail delivery
///
/// [`Mailer`] is the seam between the dispatcher and the transport:
///
/// - [`SmtpMailer`] delivers through an SMTP relay with `lettre`
/// - [`LogMailer`] only logs, for development without a mail server
///
/// Message construction ([`build_message`]) is separate from delivery so that
/// malformed addresses can be told apart from transport failures.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use leadbook_shared::models::notification::Notification;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Notification has no recipients")]
    NoRecipients,

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<(), MailError>;
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Builds a plain-text message for an outbox row
pub fn build_message(notification: &Notification) -> Result<Message, MailError> {
    if notification.recipients.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(mailbox(&notification.sender)?)
        .subject(notification.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    for recipient in &notification.recipients {
        builder = builder.to(mailbox(recipient)?);
    }

    builder
        .body(notification.body.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

/// SMTP relay without TLS (`builder_dangerous`); intended for a local relay
/// or a sidecar that handles TLS itself
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Self {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str()).port(config.port);

        if let Some((user, pass)) = config.credentials() {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");
        SmtpMailer {
            transport: builder.build(),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, notification: &Notification) -> Result<(), MailError> {
        let message = build_message(notification)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), MailError> {
        // Same validation as SMTP so bad rows fail the same way
        build_message(notification)?;

        tracing::info!(
            notification_id = %notification.id,
            from = %notification.sender,
            to = ?notification.recipients,
            subject = %notification.subject,
            "Mail (log only)"
        );
        Ok(())
    }
}
