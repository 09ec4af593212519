/// Notification queue
///
/// Claims pending outbox rows and records delivery outcomes.
///
/// # Claiming
///
/// Rows are claimed with `FOR UPDATE SKIP LOCKED`, so several workers can poll
/// the same table without handing out a row twice. A claim moves the row to
/// `sending`, bumps `attempts` and stamps `claimed_at`.
///
/// # Outcomes
///
/// - delivered: `sending` → `sent`
/// - failed with attempts left: `sending` → `pending`, not claimable until
///   `next_attempt_at`
/// - failed on the last attempt: `sending` → `failed`
///
/// Reaching `sent` or `failed` clears the body, which may carry a temporary
/// password. [`NotificationQueue::purge_finished`] deletes finished rows once
/// they are old enough.
///
/// A worker that dies mid-delivery leaves its rows in `sending`;
/// [`NotificationQueue::requeue_stale`] hands them back after a timeout.
///
/// # Example
///
/// ```no_run
/// use leadbook_worker::queue::NotificationQueue;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let queue = NotificationQueue::new(pool);
///
/// for notification in queue.claim(None).await? {
///     // deliver...
///     queue.mark_sent(notification.id).await?;
/// }
/// # Ok(())
/// # }
/// ```

use leadbook_shared::models::notification::{Notification, NotificationStatus, NOTIFICATION_COLUMNS};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The row is not in `sending` (already finished, or requeued as stale)
    #[error("Notification not claimed: {0}")]
    NotClaimed(Uuid),

    #[error("Unknown notification status: {0}")]
    UnknownStatus(String),
}

#[derive(Clone)]
pub struct NotificationQueue {
    db: PgPool,
    batch_size: i64,
}

impl NotificationQueue {
    pub fn new(db: PgPool) -> Self {
        NotificationQueue { db, batch_size: 10 }
    }

    pub fn with_batch_size(db: PgPool, batch_size: i64) -> Self {
        NotificationQueue { db, batch_size }
    }

    /// Claims up to `limit` (default: batch size) due pending rows, oldest first
    pub async fn claim(&self, limit: Option<i64>) -> Result<Vec<Notification>, QueueError> {
        let limit = limit.unwrap_or(self.batch_size);

        let claimed = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET status = $1,
                attempts = attempts + 1,
                claimed_at = NOW()
            WHERE id IN (
                SELECT id
                FROM notifications
                WHERE status = $2
                  AND next_attempt_at <= NOW()
                ORDER BY created_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(NotificationStatus::Sending.as_str())
        .bind(NotificationStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        if !claimed.is_empty() {
            tracing::debug!(count = claimed.len(), "Claimed notifications");
        }

        Ok(claimed)
    }

    pub async fn mark_sent(&self, id: Uuid) -> Result<(), QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $2,
                sent_at = NOW(),
                body = '',
                last_error = NULL
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(NotificationStatus::Sent.as_str())
        .bind(NotificationStatus::Sending.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotClaimed(id));
        }

        tracing::info!(notification_id = %id, "Notification sent");
        Ok(())
    }

    /// Records a failed delivery
    ///
    /// Returns the new status: `Pending` while attempts remain, `Failed` once
    /// `attempts` has reached `max_attempts`. A pending row becomes claimable
    /// again after `retry_after`.
    pub async fn mark_retry_or_failed(
        &self,
        id: Uuid,
        error: &str,
        max_attempts: i32,
        retry_after: Duration,
    ) -> Result<NotificationStatus, QueueError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE notifications
            SET status = CASE WHEN attempts >= $3 THEN $4 ELSE $5 END,
                body = CASE WHEN attempts >= $3 THEN '' ELSE body END,
                next_attempt_at = NOW() + make_interval(secs => $7),
                last_error = $2,
                claimed_at = NULL
            WHERE id = $1 AND status = $6
            RETURNING status
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(max_attempts)
        .bind(NotificationStatus::Failed.as_str())
        .bind(NotificationStatus::Pending.as_str())
        .bind(NotificationStatus::Sending.as_str())
        .bind(retry_after.as_secs_f64())
        .fetch_optional(&self.db)
        .await?;

        let (raw,) = row.ok_or(QueueError::NotClaimed(id))?;
        let status = NotificationStatus::from_str(&raw).ok_or(QueueError::UnknownStatus(raw))?;

        match status {
            NotificationStatus::Failed => {
                tracing::error!(notification_id = %id, error = %error, "Notification failed permanently")
            }
            _ => tracing::warn!(
                notification_id = %id,
                error = %error,
                retry_in_secs = retry_after.as_secs(),
                "Notification will be retried"
            ),
        }

        Ok(status)
    }

    /// Returns rows stuck in `sending` for longer than `older_than` to `pending`
    pub async fn requeue_stale(&self, older_than: Duration) -> Result<u64, QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $1,
                claimed_at = NULL
            WHERE status = $2
              AND claimed_at < NOW() - make_interval(secs => $3)
            "#,
        )
        .bind(NotificationStatus::Pending.as_str())
        .bind(NotificationStatus::Sending.as_str())
        .bind(older_than.as_secs_f64())
        .execute(&self.db)
        .await?;

        let requeued = result.rows_affected();
        if requeued > 0 {
            tracing::warn!(count = requeued, "Requeued stale notifications");
        }

        Ok(requeued)
    }

    /// Deletes `sent` and `failed` rows created more than `older_than` ago
    pub async fn purge_finished(&self, older_than: Duration) -> Result<u64, QueueError> {
        let result = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE status IN ($1, $2)
              AND created_at < NOW() - make_interval(secs => $3)
            "#,
        )
        .bind(NotificationStatus::Sent.as_str())
        .bind(NotificationStatus::Failed.as_str())
        .bind(older_than.as_secs_f64())
        .execute(&self.db)
        .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::info!(count = purged, "Purged finished notifications");
        }

        Ok(purged)
    }

    pub async fn pending_count(&self) -> Result<i64, QueueError> {
        let count = Notification::count_by_status(&self.db, NotificationStatus::Pending).await?;
        Ok(count)
    }
}

/// Delay before the next attempt after `attempts` failed deliveries
///
/// Doubles from `base` with each attempt, capped at 64 times `base`.
pub fn retry_delay(base: Duration, attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 6) as u32;
    base.saturating_mul(1 << exponent)
}
