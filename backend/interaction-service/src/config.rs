/// Configuration management for Interaction Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Bearer token settings
    pub auth: AuthConfig,
    /// Document store settings
    pub store: StoreConfig,
    /// Counter maintenance settings
    pub counters: CounterConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Emails that carry the admin role regardless of token claims
    pub admin_emails: Vec<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("admin_emails", &self.admin_emails)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON export loaded into the store at boot
    pub seed_path: Option<String>,
}

/// Counter maintenance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Compare-and-swap retries before a counter update is given up as drift
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff of the compare-and-swap loop, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Run the background reconciler
    pub reconcile_enabled: bool,
    /// Reconciler period, in seconds
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
}

impl CounterConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            reconcile_enabled: false,
            reconcile_interval_secs: default_reconcile_interval_secs(),
        }
    }
}

// Default values
fn default_max_retries() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    10
}

fn default_reconcile_interval_secs() -> u64 {
    300
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8010), // interaction-service default HTTP port
        };

        let auth = AuthConfig {
            jwt_secret: std::env::var("JWT_SECRET")
                .context("JWT_SECRET environment variable not set")?,
            admin_emails: std::env::var("ADMIN_EMAILS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
        };

        if auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let store = StoreConfig {
            seed_path: std::env::var("STORE_SEED_PATH")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        let counters = CounterConfig {
            max_retries: std::env::var("COUNTER_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_retries),
            initial_backoff_ms: std::env::var("COUNTER_INITIAL_BACKOFF_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_initial_backoff_ms),
            reconcile_enabled: std::env::var("RECONCILE_ENABLED")
                .ok()
                .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or_else(default_reconcile_interval_secs),
        };

        Ok(Config {
            app,
            auth,
            store,
            counters,
        })
    }
}
