//! HTTP surface: routes, handlers and request extractors.

pub mod errors;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod sessions;

use crate::session::ImplSessionRegistry;
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct AppState {
    pub registry: ImplSessionRegistry,
    /// 🔒 SENSITIVE: key for session tokens and admin routes
    pub secret_key: String,
    /// Return operational error details to the caller (development only)
    pub expose_error_details: bool,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        registry: ImplSessionRegistry,
        secret_key: impl Into<String>,
        expose_error_details: bool,
    ) -> Self {
        Self {
            registry,
            secret_key: secret_key.into(),
            expose_error_details,
            started_at: Utc::now(),
        }
    }
}
