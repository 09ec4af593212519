/// Notification dispatcher
///
/// The worker's main loop:
///
/// ```text
/// Dispatcher
///   ├─> NotificationQueue: requeue stale rows, purge old ones, claim a batch
///   ├─> Mailer: deliver each row
///   └─> NotificationQueue: mark sent / retry / failed
/// ```
///
/// Rows in a batch are delivered one after another. The loop stops on the
/// shutdown token after finishing the batch in hand.
///
/// # Example
///
/// ```no_run
/// use leadbook_worker::dispatcher::{Dispatcher, DispatcherConfig};
/// use leadbook_worker::mailer::LogMailer;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let dispatcher = Dispatcher::new(pool, Arc::new(LogMailer), DispatcherConfig::default());
/// let shutdown = dispatcher.shutdown_token();
///
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// dispatcher.run().await?;
/// # Ok(())
/// # }
/// ```

use crate::mailer::Mailer;
use crate::queue::{retry_delay, NotificationQueue, QueueError};
use leadbook_shared::models::notification::{Notification, NotificationStatus};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    pub max_attempts: i32,
    pub stale_after: Duration,
    /// Delay after the first failed attempt, doubled for each further one
    pub retry_base_delay: Duration,
    /// How long `sent` and `failed` rows are kept
    pub retain_finished: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            poll_interval: Duration::from_secs(2),
            batch_size: 10,
            max_attempts: 5,
            stale_after: Duration::from_secs(300),
            retry_base_delay: Duration::from_secs(30),
            retain_finished: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Counts from one pass over the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub claimed: usize,
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

pub struct Dispatcher {
    queue: NotificationQueue,
    mailer: Arc<dyn Mailer>,
    config: DispatcherConfig,
    shutdown_token: CancellationToken,
}

impl Dispatcher {
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>, config: DispatcherConfig) -> Self {
        Dispatcher {
            queue: NotificationQueue::with_batch_size(db, config.batch_size),
            mailer,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cancel to stop [`Dispatcher::run`]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn queue(&self) -> &NotificationQueue {
        &self.queue
    }

    /// Polls until the shutdown token is cancelled
    ///
    /// Queue errors are logged and retried after the poll interval; they never
    /// end the loop.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(mailer = self.mailer.name(), "Notification dispatcher starting");

        while !self.shutdown_token.is_cancelled() {
            let report = match self.run_once().await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(error = %e, "Dispatch pass failed");
                    BatchReport::default()
                }
            };

            // A full batch means more may be waiting, unless every row in it
            // was pushed back for a retry
            if report.claimed as i64 >= self.config.batch_size && report.retried < report.claimed {
                continue;
            }

            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("Notification dispatcher shut down");
        Ok(())
    }

    /// One pass: requeue stale rows, purge old ones, claim a batch, deliver it
    pub async fn run_once(&self) -> Result<BatchReport, QueueError> {
        self.queue.requeue_stale(self.config.stale_after).await?;
        self.queue.purge_finished(self.config.retain_finished).await?;

        let batch = self.queue.claim(None).await?;
        let mut report = BatchReport {
            claimed: batch.len(),
            ..Default::default()
        };

        for notification in batch {
            match self.deliver(&notification).await {
                Ok(NotificationStatus::Sent) => report.sent += 1,
                Ok(NotificationStatus::Failed) => report.failed += 1,
                Ok(_) => report.retried += 1,
                Err(e) => {
                    tracing::error!(
                        notification_id = %notification.id,
                        error = %e,
                        "Failed to record delivery outcome"
                    );
                }
            }
        }

        if report.claimed > 0 {
            tracing::info!(
                claimed = report.claimed,
                sent = report.sent,
                retried = report.retried,
                failed = report.failed,
                "Dispatch pass complete"
            );
        }

        Ok(report)
    }

    async fn deliver(&self, notification: &Notification) -> Result<NotificationStatus, QueueError> {
        match self.mailer.send(notification).await {
            Ok(()) => {
                self.queue.mark_sent(notification.id).await?;
                Ok(NotificationStatus::Sent)
            }
            Err(e) => {
                let retry_after = retry_delay(self.config.retry_base_delay, notification.attempts);
                self.queue
                    .mark_retry_or_failed(notification.id, &e.to_string(), self.config.max_attempts, retry_after)
                    .await
            }
        }
    }
}
