//! Administrative endpoints guarded by the service secret key.

use super::AppState;
use crate::{
    api::{
        envelope::{ApiError, ResponseWriter},
        token,
    },
    metric,
};
use ntex::web;
use serde::Deserialize;
use serde_json::{Map, Value, json};

#[derive(Deserialize)]
pub struct TokenPath {
    pub session: String,
    pub secretkey: String,
}

/// Secret-only admin path. The segment shares the `{session}` name with the
/// session scope so both patterns resolve in the same router.
#[derive(Deserialize)]
pub struct SecretPath {
    #[serde(rename = "session")]
    pub secretkey: String,
}

fn secret_is_valid(given: &str, app_state: &AppState) -> bool {
    !app_state.secret_key.is_empty() && token::secrets_match(given, &app_state.secret_key)
}

/// Issues the bearer token of a session.
///
/// # Returns
/// - 200 with `{ session, token, full }` where `full` is `<session>:<token>`
/// - 401 when the secret key does not match
#[web::post("/api/{session}/{secretkey}/generate-token")]
pub async fn generate_token(
    path: web::types::Path<TokenPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let mut writer = ResponseWriter::new();

    if !secret_is_valid(&path.secretkey, &app_state) {
        metric::incr_auth_statds("invalid_secret");
        writer.failure(&ApiError::Unauthorized, false);
        return writer.into_response();
    }

    let token = match token::generate_token(&app_state.secret_key, &path.session) {
        Ok(token) => token,
        Err(e) => {
            logfire::error!("Error generating token: {error}", error = e.to_string());
            writer.failure(
                &ApiError::operational("generate token", e),
                app_state.expose_error_details,
            );
            return writer.into_response();
        }
    };
    logfire::info!("Token generated for session {session}", session = path.session.clone());

    writer.success(
        "Token generated successfully",
        json!({
            "session": path.session,
            "full": format!("{}:{}", path.session, token),
            "token": token,
        }),
    );
    writer.into_response()
}

/// Lists the names of the registered sessions
#[web::get("/api/{session}/show-all-sessions")]
pub async fn show_all_sessions(
    path: web::types::Path<SecretPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let mut writer = ResponseWriter::new();

    if !secret_is_valid(&path.secretkey, &app_state) {
        metric::incr_auth_statds("invalid_secret");
        writer.failure(&ApiError::Unauthorized, false);
        return writer.into_response();
    }

    writer.success("Sessions retrieved successfully", json!(app_state.registry.names()));
    writer.into_response()
}

/// Starts every registered session.
///
/// Each session is started independently; the response reports the driver
/// result or the error for every session name.
#[web::post("/api/{session}/start-all")]
pub async fn start_all_sessions(
    path: web::types::Path<SecretPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let mut writer = ResponseWriter::new();

    if !secret_is_valid(&path.secretkey, &app_state) {
        metric::incr_auth_statds("invalid_secret");
        writer.failure(&ApiError::Unauthorized, false);
        return writer.into_response();
    }

    let mut results = Map::new();
    for name in app_state.registry.names() {
        let Some(session) = app_state.registry.get(&name) else {
            continue;
        };

        let result = match session.start_session().await {
            Ok(data) => {
                metric::incr_operation_statds("start session", "success");
                json!({ "success": true, "data": data })
            }
            Err(e) => {
                logfire::error!(
                    "Error starting session {session}: {error}",
                    session = name.clone(),
                    error = e.to_string()
                );
                metric::incr_operation_statds("start session", "error");
                let error = if app_state.expose_error_details {
                    e.to_string()
                } else {
                    "Failed to start session".to_string()
                };
                json!({ "success": false, "error": error })
            }
        };
        results.insert(name, result);
    }

    writer.success("Sessions started", Value::Object(results));
    writer.into_response()
}
