use super::AppState;
use crate::api::envelope::{ApiError, Envelope};
use ntex::{http, web};

impl web::error::WebResponseError for ApiError {
    fn error_response(&self, req: &web::HttpRequest) -> web::HttpResponse {
        logfire::warn!(
            "{method} {path} rejected: {error}",
            method = req.method().to_string(),
            path = req.path().to_string(),
            error = self.to_string()
        );

        let expose_details = req
            .app_state::<AppState>()
            .map(|state| state.expose_error_details)
            .unwrap_or(false);

        web::HttpResponse::build(self.status_code()).json(&self.envelope(expose_details))
    }

    fn status_code(&self) -> http::StatusCode {
        self.status()
    }
}

/// JSON 404 for urls not defined
pub async fn serve_not_found() -> web::HttpResponse {
    web::HttpResponse::NotFound().json(&Envelope::failure("Route not found", None))
}
