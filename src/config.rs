//! Application configuration management with security considerations.
//!
//! All values come from environment variables. Sensitive fields are marked
//! and must never be logged.

use envconfig::Envconfig;
use std::sync::OnceLock;

/// Application configuration read from the environment.
///
/// # Security Requirements
/// - All `SENSITIVE` fields must be stored securely (encrypted at rest)
/// - Never log or expose sensitive values
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "21465")]
    pub server_port: u16,

    /// 🔒 SENSITIVE: secret used to derive per-session bearer tokens
    /// and to guard the administrative routes
    pub secret_key: String,

    /// Path to SSL private key file (SENSITIVE PATH)
    #[envconfig(default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file (NON-SENSITIVE)
    #[envconfig(default = "server.crt")]
    pub certificate_path: String,

    /// Base URL of the automation driver that owns the WhatsApp sessions
    /// Example: "http://127.0.0.1:3000/driver"
    #[envconfig(default = "http://127.0.0.1:3000")]
    pub driver_url: String,

    /// 🔒 SENSITIVE: bearer token sent to the automation driver
    #[envconfig(default = "")]
    pub driver_token: String,

    /// Comma separated session names registered at startup
    /// Example: "sales,support"
    #[envconfig(default = "")]
    pub sessions: String,

    /// Max accepted request body, inline attachments included
    #[envconfig(default = "52428800")]
    pub max_body_bytes: usize,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Checks if running in a development environment, where error
    /// details are returned to the caller
    pub fn is_dev(&self) -> bool {
        matches!(
            self.env.to_lowercase().as_str(),
            "local" | "dev" | "development"
        )
    }

    /// Session names listed in `SESSIONS`, blanks removed
    pub fn session_names(&self) -> Vec<String> {
        self.sessions
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Global application configuration, set once by [`init_config`]
pub static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Loads the configuration from the environment into [`APP_CONFIG`]
pub fn init_config() -> anyhow::Result<()> {
    let app_config = AppConfig::init_from_env()?;
    APP_CONFIG
        .set(app_config)
        .map_err(|_| anyhow::anyhow!("app config already initialized"))
}
