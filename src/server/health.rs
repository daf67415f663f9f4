use super::AppState;
use crate::api::envelope::ResponseWriter;
use chrono::Utc;
use ntex::web;
use serde_json::json;

/// Liveness probe
#[web::get("/healthz")]
pub async fn healthz(app_state: web::types::State<AppState>) -> web::HttpResponse {
    let mut writer = ResponseWriter::new();
    writer.success(
        "OK",
        json!({
            "sessions": app_state.registry.names().len(),
            "uptime_secs": (Utc::now() - app_state.started_at).num_seconds(),
        }),
    );
    writer.into_response()
}
