//! Route configuration.
//!
//! Administrative routes are registered before the `/api/{session}` scope,
//! otherwise the scope would claim their paths.

use super::{health, messages, sessions};
use ntex::web;

/// Configures health and administrative routes.
///
/// # Routes
/// - `GET /healthz` - Liveness probe
/// - `POST /api/{session}/{secretkey}/generate-token` - Issue a session token
/// - `GET /api/{secretkey}/show-all-sessions` - List registered sessions
/// - `POST /api/{secretkey}/start-all` - Start every registered session
pub fn admin(cfg: &mut web::ServiceConfig) {
    cfg.service((
        health::healthz,
        sessions::generate_token,
        sessions::show_all_sessions,
        sessions::start_all_sessions,
    ));
}

/// Configures the session operation routes.
///
/// All routes require `Authorization: Bearer <token>` for `{session}`.
///
/// # Send Routes (POST)
/// - `/api/{session}/send-message`
/// - `/api/{session}/send-mentioned`
/// - `/api/{session}/send-voice`
/// - `/api/{session}/send-image`
/// - `/api/{session}/send-video`
/// - `/api/{session}/send-file`
/// - `/api/{session}/send-file-base64`
/// - `/api/{session}/send-contact`
/// - `/api/{session}/send-location`
/// - `/api/{session}/send-link-preview`
/// - `/api/{session}/send-buttons`
/// - `/api/{session}/send-list`
///
/// # Message Routes (POST)
/// - `/api/{session}/reply-message`
/// - `/api/{session}/edit-message`
/// - `/api/{session}/delete-message`
///
/// # Retrieval Routes (GET)
/// - `/api/{session}/get-messages?chatId=`
/// - `/api/{session}/get-chats`
/// - `/api/{session}/get-contacts`
/// - `/api/{session}/check-connection-session`
/// - `/api/{session}/get-status`
///
/// # Status Routes (POST)
/// - `/api/{session}/set-status`
/// - `/api/{session}/send-status-text`
///
/// # Session Routes
/// - `POST /api/{session}/start-session`
/// - `POST /api/{session}/close-session`
/// - `POST /api/{session}/logout-session`
/// - `GET /api/{session}/qrcode-session`
pub fn session_operations(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/{session}")
            .service((
                messages::send_message,
                messages::send_mentioned,
                messages::send_voice,
                messages::send_image,
                messages::send_video,
                messages::send_file,
                messages::send_file_base64,
            ))
            .service((
                messages::send_contact,
                messages::send_location,
                messages::send_link_preview,
                messages::send_buttons,
                messages::send_list,
            ))
            .service((
                messages::reply_message,
                messages::edit_message,
                messages::delete_message,
            ))
            .service((
                messages::get_messages,
                messages::get_chats,
                messages::get_contacts,
                messages::check_connection,
                messages::get_status,
            ))
            .service((messages::set_status, messages::send_status_text))
            .service((
                messages::start_session,
                messages::close_session,
                messages::logout_session,
                messages::qrcode_session,
            )),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::token::generate_token,
        server::{AppState, errors},
        session::{InMemorySessionRegistry, MockWhatsAppSession},
    };
    use mockall::predicate::*;
    use ntex::{
        http::{Request, StatusCode},
        web::test,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;

    const SECRET: &str = "THISISMYSECURETOKEN";

    fn connected_mock() -> MockWhatsAppSession {
        let mut mock = MockWhatsAppSession::new();
        mock.expect_get_connection_state()
            .returning(|| Ok(json!("CONNECTED")));
        mock
    }

    fn app_state_with(mock: MockWhatsAppSession, expose_error_details: bool) -> AppState {
        let registry = InMemorySessionRegistry::new();
        registry.insert("sales", Arc::new(mock));
        AppState::new(Arc::new(registry), SECRET, expose_error_details)
    }

    fn bearer(session: &str) -> String {
        format!("Bearer {}", generate_token(SECRET, session).unwrap())
    }

    async fn call(app_state: AppState, req: Request) -> (StatusCode, Value) {
        let app = test::init_service(
            web::App::new()
                .state(app_state)
                .configure(admin)
                .configure(session_operations)
                .default_service(web::route().to(errors::serve_not_found)),
        )
        .await;

        let response = test::call_service(&app, req).await;
        let status = response.status();
        let body = test::read_body(response).await;

        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[ntex::test]
    async fn test_send_message_route() {
        let mut mock = connected_mock();
        mock.expect_send_text()
            .with(eq("5511999999999".to_string()), eq("hello".to_string()))
            .times(1)
            .returning(|_, _| Ok(json!({"id": "true_5511999999999@c.us_ABC"})));

        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("sales"))
            .set_json(&json!({"phone": "5511999999999", "message": "hello"}))
            .to_request();

        let (status, body) = call(app_state_with(mock, false), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "Message sent successfully",
                "data": {"id": "true_5511999999999@c.us_ABC"},
            })
        );
    }

    #[ntex::test]
    async fn test_missing_fields_route() {
        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("sales"))
            .set_json(&json!({"phone": "5511999999999"}))
            .to_request();

        let (status, body) = call(app_state_with(connected_mock(), false), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "error": "Message is required"})
        );
    }

    #[ntex::test]
    async fn test_unknown_session_route() {
        let req = test::TestRequest::get()
            .uri("/api/ghost/get-chats")
            .header("Authorization", bearer("ghost"))
            .to_request();

        let (status, body) = call(app_state_with(MockWhatsAppSession::new(), false), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Session not found"}));
    }

    #[ntex::test]
    async fn test_wrong_token_is_rejected_before_dispatch() {
        // No expectations: any session call would panic.
        let state = app_state_with(MockWhatsAppSession::new(), false);

        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("support"))
            .set_json(&json!({"phone": "5511999999999", "message": "hello"}))
            .to_request();
        let (status, body) = call(state.clone(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"success": false, "error": "Unauthorized"}));

        let req = test::TestRequest::get()
            .uri("/api/sales/get-chats")
            .to_request();
        let (status, _) = call(state, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[ntex::test]
    async fn test_disconnected_session_is_rejected_before_dispatch() {
        let mut mock = MockWhatsAppSession::new();
        mock.expect_get_connection_state()
            .returning(|| Ok(json!("DISCONNECTED")));

        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("sales"))
            .set_json(&json!({"phone": "5511999999999", "message": "hello"}))
            .to_request();

        let (status, body) = call(app_state_with(mock, false), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "error": "Session is not connected"})
        );
    }

    #[ntex::test]
    async fn test_check_connection_skips_connection_guard() {
        let mut mock = MockWhatsAppSession::new();
        mock.expect_get_connection_state()
            .times(1)
            .returning(|| Ok(json!("DISCONNECTED")));

        let req = test::TestRequest::get()
            .uri("/api/sales/check-connection-session")
            .header("Authorization", bearer("sales"))
            .to_request();

        let (status, body) = call(app_state_with(mock, false), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "Connection status retrieved successfully",
                "data": "DISCONNECTED",
            })
        );
    }

    #[ntex::test]
    async fn test_session_error_details_in_development() {
        let mut mock = connected_mock();
        mock.expect_get_contacts()
            .returning(|| Err(anyhow::anyhow!("target closed")));

        let req = test::TestRequest::get()
            .uri("/api/sales/get-contacts")
            .header("Authorization", bearer("sales"))
            .to_request();

        let (status, body) = call(app_state_with(mock, true), req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "error": "Failed to get contacts", "details": "target closed"})
        );
    }

    #[ntex::test]
    async fn test_get_messages_reads_query() {
        let mut mock = connected_mock();
        mock.expect_get_messages()
            .with(eq("5511999999999@c.us".to_string()))
            .times(1)
            .returning(|_| Ok(json!([])));

        let req = test::TestRequest::get()
            .uri("/api/sales/get-messages?chatId=5511999999999%40c.us")
            .header("Authorization", bearer("sales"))
            .to_request();

        let (status, body) = call(app_state_with(mock, false), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[ntex::test]
    async fn test_form_body_forwards_first_phone() {
        let mut mock = connected_mock();
        mock.expect_send_text()
            .with(eq("5511111111111".to_string()), eq("hi".to_string()))
            .times(1)
            .returning(|_, _| Ok(Value::Null));

        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("sales"))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .set_payload("phone=5511111111111&phone=5522222222222&message=hi")
            .to_request();

        let (status, _) = call(app_state_with(mock, false), req).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[ntex::test]
    async fn test_send_file_base64_route() {
        let mut mock = connected_mock();
        mock.expect_send_file()
            .withf(|to, path, filename, _| {
                to == "5511999999999"
                    && path == "data:application/pdf;base64,JVBERi0xLjQ="
                    && filename.as_deref() == Some("invoice.pdf")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": "file-1"})));

        let req = test::TestRequest::post()
            .uri("/api/sales/send-file-base64")
            .header("Authorization", bearer("sales"))
            .set_json(&json!({
                "phone": "5511999999999",
                "base64": "JVBERi0xLjQ=",
                "filename": "invoice.pdf",
            }))
            .to_request();

        let (status, body) = call(app_state_with(mock, false), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("File sent successfully"));
    }

    #[ntex::test]
    async fn test_invalid_json_body() {
        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("sales"))
            .header("Content-Type", "application/json")
            .set_payload("{phone")
            .to_request();

        let (status, body) = call(app_state_with(connected_mock(), false), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[ntex::test]
    async fn test_generate_token_route() {
        let req = test::TestRequest::post()
            .uri(&format!("/api/sales/{SECRET}/generate-token"))
            .to_request();
        let (status, body) = call(app_state_with(MockWhatsAppSession::new(), false), req).await;

        let token = generate_token(SECRET, "sales").unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({"session": "sales", "token": token, "full": format!("sales:{token}")})
        );

        let req = test::TestRequest::post()
            .uri("/api/sales/wrong-secret/generate-token")
            .to_request();
        let (status, body) = call(app_state_with(MockWhatsAppSession::new(), false), req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"success": false, "error": "Unauthorized"}));
    }

    #[ntex::test]
    async fn test_show_all_sessions_route() {
        let req = test::TestRequest::get()
            .uri(&format!("/api/{SECRET}/show-all-sessions"))
            .to_request();
        let (status, body) = call(app_state_with(MockWhatsAppSession::new(), false), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!(["sales"]));
    }

    #[ntex::test]
    async fn test_healthz_and_unknown_route() {
        let req = test::TestRequest::get().uri("/healthz").to_request();
        let (status, body) = call(app_state_with(MockWhatsAppSession::new(), false), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sessions"], json!(1));

        let req = test::TestRequest::get().uri("/nope").to_request();
        let (status, body) = call(app_state_with(MockWhatsAppSession::new(), false), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
    }

    #[ntex::test]
    async fn test_connection_state_failure_is_operational() {
        let mut mock = MockWhatsAppSession::new();
        mock.expect_get_connection_state()
            .returning(|| Err(anyhow::anyhow!("browser closed")));

        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("sales"))
            .set_json(&json!({"phone": "5511999999999", "message": "hello"}))
            .to_request();

        let (status, body) = call(app_state_with(mock, true), req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Failed to check connection",
                "details": "browser closed",
            })
        );
    }

    #[ntex::test]
    async fn test_blank_first_phone_in_form_is_rejected() {
        let req = test::TestRequest::post()
            .uri("/api/sales/send-message")
            .header("Authorization", bearer("sales"))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .set_payload("phone=&phone=5511999999999&message=hi")
            .to_request();

        let (status, body) = call(app_state_with(connected_mock(), false), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Phone is required"}));
    }

    #[ntex::test]
    async fn test_pairing_routes_skip_connection_guard() {
        // No connection state expectation: the guard must not run.
        let mut mock = MockWhatsAppSession::new();
        mock.expect_start_session()
            .times(1)
            .returning(|| Ok(json!({"status": "QRCODE"})));
        mock.expect_get_qr_code()
            .times(1)
            .returning(|| Ok(json!({"qrcode": "data:image/png;base64,aGVsbG8="})));
        mock.expect_close_session()
            .times(1)
            .returning(|| Ok(Value::Bool(true)));
        let state = app_state_with(mock, false);

        let req = test::TestRequest::post()
            .uri("/api/sales/start-session")
            .header("Authorization", bearer("sales"))
            .to_request();
        let (status, body) = call(state.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Session started successfully"));

        let req = test::TestRequest::get()
            .uri("/api/sales/qrcode-session")
            .header("Authorization", bearer("sales"))
            .to_request();
        let (status, body) = call(state.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["qrcode"], json!("data:image/png;base64,aGVsbG8="));

        let req = test::TestRequest::post()
            .uri("/api/sales/close-session")
            .header("Authorization", bearer("sales"))
            .to_request();
        let (status, body) = call(state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Session closed successfully"));
    }

    #[ntex::test]
    async fn test_logout_requires_connected_session() {
        let mut mock = MockWhatsAppSession::new();
        mock.expect_get_connection_state()
            .returning(|| Ok(json!("DISCONNECTED")));

        let req = test::TestRequest::post()
            .uri("/api/sales/logout-session")
            .header("Authorization", bearer("sales"))
            .to_request();
        let (status, _) = call(app_state_with(mock, false), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut mock = connected_mock();
        mock.expect_logout_session()
            .times(1)
            .returning(|| Ok(Value::Bool(true)));

        let req = test::TestRequest::post()
            .uri("/api/sales/logout-session")
            .header("Authorization", bearer("sales"))
            .to_request();
        let (status, body) = call(app_state_with(mock, false), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Session logged out successfully"));
    }

    #[ntex::test]
    async fn test_start_all_route() {
        let mut sales = MockWhatsAppSession::new();
        sales
            .expect_start_session()
            .times(1)
            .returning(|| Ok(json!({"status": "CONNECTED"})));
        let mut support = MockWhatsAppSession::new();
        support
            .expect_start_session()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("profile locked")));

        let registry = InMemorySessionRegistry::new();
        registry.insert("sales", Arc::new(sales));
        registry.insert("support", Arc::new(support));
        let state = AppState::new(Arc::new(registry), SECRET, false);

        let req = test::TestRequest::post()
            .uri("/api/wrong-secret/start-all")
            .to_request();
        let (status, _) = call(state.clone(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri(&format!("/api/{SECRET}/start-all"))
            .to_request();
        let (status, body) = call(state, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({
                "sales": {"success": true, "data": {"status": "CONNECTED"}},
                "support": {"success": false, "error": "Failed to start session"},
            })
        );
    }
}
