//! # Leadbook Worker
//!
//! Delivers queued notifications (lead created, agent invitations).
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/leadbook SMTP_HOST=localhost cargo run -p leadbook-worker
//! ```
//!
//! Without `SMTP_HOST` the worker only logs the mail it would send.

use leadbook_shared::db::{migrations::run_migrations, pool::create_pool};
use leadbook_worker::{
    config::WorkerConfig,
    dispatcher::Dispatcher,
    mailer::{LogMailer, Mailer, SmtpMailer},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadbook_worker=debug,leadbook_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Leadbook Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(config.database.clone()).await?;
    run_migrations(&pool).await?;

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)),
        None => {
            tracing::warn!("SMTP_HOST not set, mail will only be logged");
            Arc::new(LogMailer)
        }
    };

    let dispatcher = Dispatcher::new(pool.clone(), mailer, config.dispatcher());
    let backlog = dispatcher.queue().pending_count().await?;
    tracing::info!(pending = backlog, "Notification backlog");

    let shutdown = dispatcher.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received, finishing current batch..."),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
        shutdown.cancel();
    });

    dispatcher.run().await?;

    pool.close().await;
    Ok(())
}
