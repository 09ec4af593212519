/// Notification outbox
///
/// Outgoing mail is never sent from a request handler. The API appends a row
/// here and returns; `leadbook-worker` claims pending rows and delivers them.
///
/// # Lifecycle
///
/// ```text
/// pending ──claim──▶ sending ──ok──▶ sent
///    ▲                  │
///    └──retry (attempts < max)──┤
///                       └──attempts >= max──▶ failed
/// ```
///
/// A retried row is only claimable again once `next_attempt_at` has passed.
/// The body is cleared when a row reaches `sent` or `failed`, and finished
/// rows are eventually deleted by the worker.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     subject VARCHAR(255) NOT NULL,
///     body TEXT NOT NULL,
///     sender VARCHAR(254) NOT NULL,
///     recipients TEXT[] NOT NULL,
///     status VARCHAR(20) NOT NULL DEFAULT 'pending',
///     attempts INTEGER NOT NULL DEFAULT 0,
///     last_error TEXT,
///     claimed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     sent_at TIMESTAMPTZ,
///     next_attempt_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

pub const NOTIFICATION_COLUMNS: &str = "id, subject, body, sender, recipients, status, attempts, \
     last_error, claimed_at, created_at, sent_at, next_attempt_at";

/// Delivery state of an outbox row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Waiting to be claimed
    Pending,

    /// Claimed by a worker
    Sending,

    /// Delivered (terminal)
    Sent,

    /// Gave up after the maximum number of attempts (terminal)
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sending => "sending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(NotificationStatus::Pending),
            "sending" => Some(NotificationStatus::Sending),
            "sent" => Some(NotificationStatus::Sent),
            "failed" => Some(NotificationStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }
}

/// Outbox row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipients: Vec<String>,
    /// Stored as text, read through [`Notification::get_status`]
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    /// Earliest time a pending row may be claimed
    pub next_attempt_at: DateTime<Utc>,
}

impl Notification {
    pub fn get_status(&self) -> Option<NotificationStatus> {
        NotificationStatus::from_str(&self.status)
    }
}

/// Message to enqueue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipients: Vec<String>,
}

impl Notification {
    /// Appends a pending row to the outbox
    pub async fn enqueue<'e, E>(executor: E, message: NewNotification) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (subject, body, sender, recipients, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(message.subject)
        .bind(message.body)
        .bind(message.sender)
        .bind(message.recipients)
        .bind(NotificationStatus::Pending.as_str())
        .fetch_one(executor)
        .await?;

        tracing::debug!(notification_id = %notification.id, "Notification enqueued");
        Ok(notification)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Number of rows in a given state
    pub async fn count_by_status(pool: &PgPool, status: NotificationStatus) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
