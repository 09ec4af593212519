/// Worker configuration
///
/// | Variable                      | Default               |
/// |-------------------------------|-----------------------|
/// | `DATABASE_URL`                | required              |
/// | `DATABASE_MAX_CONNECTIONS`    | `10`                  |
/// | `WORKER_POLL_INTERVAL_SECS`   | `2`                   |
/// | `WORKER_BATCH_SIZE`           | `10`                  |
/// | `WORKER_MAX_ATTEMPTS`         | `5`                   |
/// | `WORKER_STALE_AFTER_SECS`     | `300`                 |
/// | `WORKER_RETRY_DELAY_SECS`     | `30`                  |
/// | `WORKER_RETAIN_HOURS`         | `168`                 |
/// | `SMTP_HOST`                   | unset (log-only mail) |
/// | `SMTP_PORT`                   | `25`                  |
/// | `SMTP_USER` / `SMTP_PASS`     | unset                 |

use crate::dispatcher::DispatcherConfig;
use leadbook_shared::db::pool::DatabaseConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database: DatabaseConfig,

    /// Sleep between empty polls
    pub poll_interval: Duration,

    /// Rows claimed per poll
    pub batch_size: i64,

    /// Attempts before a row is marked failed
    pub max_attempts: i32,

    /// Rows left in `sending` longer than this are handed back to the queue
    pub stale_after: Duration,

    /// First retry delay; doubles with each failed attempt
    pub retry_base_delay: Duration,

    /// Finished rows older than this are deleted
    pub retain_finished: Duration,

    /// `None` selects the log-only mailer
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Username and password, only when both are set
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        None => Ok(default),
    }
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse(&get, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let poll_interval_secs = parse(&get, "WORKER_POLL_INTERVAL_SECS", 2u64)?;
        let batch_size = parse(&get, "WORKER_BATCH_SIZE", 10i64)?;
        let max_attempts = parse(&get, "WORKER_MAX_ATTEMPTS", 5i32)?;
        let stale_after_secs = parse(&get, "WORKER_STALE_AFTER_SECS", 300u64)?;
        let retry_delay_secs = parse(&get, "WORKER_RETRY_DELAY_SECS", 30u64)?;
        let retain_hours = parse(&get, "WORKER_RETAIN_HOURS", 168u64)?;

        if batch_size < 1 {
            anyhow::bail!("WORKER_BATCH_SIZE must be at least 1");
        }
        if max_attempts < 1 {
            anyhow::bail!("WORKER_MAX_ATTEMPTS must be at least 1");
        }

        let smtp = match get("SMTP_HOST").filter(|h| !h.trim().is_empty()) {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse(&get, "SMTP_PORT", 25u16)?,
                username: get("SMTP_USER"),
                password: get("SMTP_PASS"),
            }),
            None => None,
        };

        Ok(Self {
            database: DatabaseConfig::new(url, max_connections),
            poll_interval: Duration::from_secs(poll_interval_secs),
            batch_size,
            max_attempts,
            stale_after: Duration::from_secs(stale_after_secs),
            retry_base_delay: Duration::from_secs(retry_delay_secs),
            retain_finished: Duration::from_secs(retain_hours.saturating_mul(60 * 60)),
            smtp,
        })
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            poll_interval: self.poll_interval,
            batch_size: self.batch_size,
            max_attempts: self.max_attempts,
            stale_after: self.stale_after,
            retry_base_delay: self.retry_base_delay,
            retain_finished: self.retain_finished,
        }
    }
}
