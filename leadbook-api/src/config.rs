/// Configuration for the API server
///
/// Loaded from environment variables (a `.env` file is read first if present).
///
/// # Environment Variables
///
/// | Variable                    | Default          |
/// |-----------------------------|------------------|
/// | `DATABASE_URL`              | required         |
/// | `DATABASE_MAX_CONNECTIONS`  | `10`             |
/// | `API_HOST` / `API_PORT`     | `0.0.0.0` / `8080` |
/// | `CORS_ORIGINS`              | `*` (comma separated) |
/// | `PRODUCTION`                | `false`          |
/// | `JWT_SECRET`                | required, >= 32 chars |
/// | `NOTIFY_FROM`               | `test@test.com`  |
/// | `NOTIFY_RECIPIENTS`         | `test2@test.com` (comma separated) |
///
/// # Example
///
/// ```no_run
/// use leadbook_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub notify: NotifyConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Enables HSTS
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 bytes (`openssl rand -hex 32`)
    pub secret: String,
}

/// Lead-created notification envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub from: String,
    pub recipients: Vec<String>,
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = var("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is not a valid port: {e}"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is not a number: {e}"))?;

        let production = match var("PRODUCTION", "false").to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" | "" => false,
            other => anyhow::bail!("PRODUCTION must be true or false, got {other:?}"),
        };

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let recipients = split_list(&var("NOTIFY_RECIPIENTS", "test2@test.com"));
        if recipients.is_empty() {
            anyhow::bail!("NOTIFY_RECIPIENTS must name at least one address");
        }

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port,
                cors_origins: split_list(&var("CORS_ORIGINS", "*")),
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            notify: NotifyConfig {
                from: var("NOTIFY_FROM", "test@test.com"),
                recipients,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}
