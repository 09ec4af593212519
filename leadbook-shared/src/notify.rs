/// Outgoing notifications
///
/// Handlers talk to a [`Notifier`]; the production implementation,
/// [`OutboxNotifier`], writes to the `notifications` table and the worker does
/// the actual delivery. Dispatch is best-effort: [`dispatch_best_effort`] runs
/// the notifier on a detached task and only logs failures, so a broken mail
/// path can never fail the request that triggered it.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use leadbook_shared::notify::{dispatch_best_effort, lead_created, Notifier, OutboxNotifier};
/// use sqlx::PgPool;
///
/// # fn example(pool: PgPool) {
/// let notifier: Arc<dyn Notifier> = Arc::new(OutboxNotifier::new(pool));
/// let message = lead_created("test@test.com", &["test2@test.com".to_string()]);
/// dispatch_best_effort(notifier, message);
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::models::notification::{NewNotification, Notification};

/// Subject of the lead-created notification
pub const LEAD_CREATED_SUBJECT: &str = "Created";

/// Body of the lead-created notification
pub const LEAD_CREATED_BODY: &str = "Lead Added";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification has no recipients")]
    NoRecipients,

    #[error("Failed to enqueue notification: {0}")]
    Enqueue(#[from] sqlx::Error),
}

/// Accepts messages for delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: NewNotification) -> Result<(), NotifyError>;
}

/// Notifier backed by the `notifications` outbox table
#[derive(Clone)]
pub struct OutboxNotifier {
    db: PgPool,
}

impl OutboxNotifier {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn notify(&self, message: NewNotification) -> Result<(), NotifyError> {
        if message.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        Notification::enqueue(&self.db, message).await?;
        Ok(())
    }
}

/// Fires `message` at `notifier` without waiting for the result
pub fn dispatch_best_effort(notifier: Arc<dyn Notifier>, message: NewNotification) -> JoinHandle<()> {
    tokio::spawn(async move {
        let subject = message.subject.clone();
        if let Err(e) = notifier.notify(message).await {
            tracing::warn!(error = %e, subject = %subject, "Notification dispatch failed");
        }
    })
}

/// Message sent whenever an organisor creates a lead
pub fn lead_created(sender: &str, recipients: &[String]) -> NewNotification {
    NewNotification {
        subject: LEAD_CREATED_SUBJECT.to_string(),
        body: LEAD_CREATED_BODY.to_string(),
        sender: sender.to_string(),
        recipients: recipients.to_vec(),
    }
}

/// Message sent to a newly provisioned agent
pub fn agent_invitation(
    sender: &str,
    agent_email: &str,
    organisation_name: &str,
    temporary_password: &str,
) -> NewNotification {
    NewNotification {
        subject: format!("You have been added to {organisation_name}"),
        body: format!(
            "You were added as an agent to {organisation_name}.\n\n\
             Sign in with {agent_email} and the temporary password below, then change it.\n\n\
             {temporary_password}\n"
        ),
        sender: sender.to_string(),
        recipients: vec![agent_email.to_string()],
    }
}
