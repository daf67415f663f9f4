//! # Response Envelope
//!
//! Every response leaves the service as one of two JSON shapes:
//!
//! - `{ "success": true, "message": ..., "data": ... }`
//! - `{ "success": false, "error": ..., "details": ... }` (`details` optional)
//!
//! [`ResponseWriter`] holds the single envelope of a request and refuses to
//! write a second one.

use derive_more::{Display, Error};
use ntex::{http, web};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessEnvelope {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(SuccessEnvelope),
    Failure(ErrorEnvelope),
}

impl Envelope {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self::Success(SuccessEnvelope {
            success: true,
            message: message.into(),
            data,
        })
    }

    pub fn failure(error: impl Into<String>, details: Option<String>) -> Self {
        Self::Failure(ErrorEnvelope {
            success: false,
            error: error.into(),
            details,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Failures a request can end with.
///
/// `Validation` and `SessionNotFound` are client errors, `Operational` covers
/// anything raised while building arguments or by the session itself.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display("{_0}")]
    Validation(#[error(not(source))] String),
    #[display("Session not found")]
    SessionNotFound,
    #[display("Unauthorized")]
    Unauthorized,
    #[display("Session is not connected")]
    Disconnected,
    #[display("Failed to {operation}: {details}")]
    Operational {
        operation: &'static str,
        details: String,
    },
}

impl ApiError {
    pub fn operational(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Operational {
            operation,
            details: err.to_string(),
        }
    }

    pub fn status(&self) -> http::StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::SessionNotFound | ApiError::Disconnected => {
                http::StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized => http::StatusCode::UNAUTHORIZED,
            ApiError::Operational { .. } => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error envelope for this failure; `details` only reaches the caller
    /// when `expose_details` is set and the failure is operational
    pub fn envelope(&self, expose_details: bool) -> Envelope {
        match self {
            ApiError::Operational { operation, details } => Envelope::failure(
                format!("Failed to {operation}"),
                expose_details.then(|| details.clone()),
            ),
            _ => Envelope::failure(self.to_string(), None),
        }
    }
}

/// Write-once holder for the response of a single request
#[derive(Debug, Default)]
pub struct ResponseWriter {
    written: Option<(http::StatusCode, Envelope)>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finalized(&self) -> bool {
        self.written.is_some()
    }

    /// Stores the response unless one was already written.
    ///
    /// Returns `false` and logs a warning when the writer is finalized.
    pub fn finalize(&mut self, status: http::StatusCode, envelope: Envelope) -> bool {
        if self.is_finalized() {
            logfire::warn!(
                "Attempted to write a {status} response but one was already sent",
                status = status.as_u16().to_string()
            );
            return false;
        }

        self.written = Some((status, envelope));
        true
    }

    pub fn success(&mut self, message: impl Into<String>, data: Value) -> bool {
        self.finalize(http::StatusCode::OK, Envelope::success(message, data))
    }

    pub fn failure(&mut self, err: &ApiError, expose_details: bool) -> bool {
        self.finalize(err.status(), err.envelope(expose_details))
    }

    pub fn status(&self) -> Option<http::StatusCode> {
        self.written.as_ref().map(|(status, _)| *status)
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        self.written.as_ref().map(|(_, envelope)| envelope)
    }

    /// Builds the HTTP response; a writer nobody finalized becomes a 500
    pub fn into_response(self) -> web::HttpResponse {
        let (status, envelope) = self.written.unwrap_or_else(|| {
            (
                http::StatusCode::INTERNAL_SERVER_ERROR,
                Envelope::failure("No response was produced", None),
            )
        });

        web::HttpResponse::build(status).json(&envelope)
    }
}
