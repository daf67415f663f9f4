//! Session operation endpoints, mounted under `/api/{session}`.
//!
//! Every handler is guarded by [`Authorized`]; all but the connection check
//! and the pairing routes (start, close, QR code) also require a
//! [`ConnectedSession`]. The work itself lives in
//! [`crate::api::message`].

use super::{
    AppState,
    middleware::{auth::Authorized, connection::ConnectedSession},
};
use crate::api::{
    envelope::{ApiError, ResponseWriter},
    fields::RequestFields,
    message::{self, Operation},
};
use ntex::{http::header, util::Bytes, web};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
pub struct SessionPath {
    pub session: String,
}

type Query = web::types::Query<HashMap<String, String>>;

fn body_fields(req: &web::HttpRequest, body: &Bytes) -> Result<RequestFields, ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    RequestFields::from_request_body(content_type, body)
}

async fn respond(
    operation: Operation,
    session: &str,
    fields: Result<RequestFields, ApiError>,
    app_state: &AppState,
) -> web::HttpResponse {
    let mut writer = ResponseWriter::new();

    match fields {
        Ok(fields) => {
            message::handle(
                &mut writer,
                app_state.registry.as_ref(),
                session,
                operation,
                &fields,
                app_state.expose_error_details,
            )
            .await
        }
        Err(err) => {
            writer.failure(&err, app_state.expose_error_details);
        }
    }

    writer.into_response()
}

/// Send a text message. Body: `{ phone, message }`
#[web::post("/send-message")]
pub async fn send_message(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendMessage,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Body: `{ phone, message, mentions }`; mentions are not forwarded
#[web::post("/send-mentioned")]
pub async fn send_mentioned(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendMentioned,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Body: `{ phone, path | base64, filename? }`
#[web::post("/send-voice")]
pub async fn send_voice(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendVoice,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Body: `{ phone, path | base64, filename?, caption? }`
#[web::post("/send-image")]
pub async fn send_image(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendImage,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Body: `{ phone, path | base64, filename?, caption? }`
#[web::post("/send-video")]
pub async fn send_video(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendVideo,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Body: `{ phone, path | base64, filename?, caption? }`
#[web::post("/send-file")]
pub async fn send_file(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendFile,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Same operation as `/send-file`, kept for clients posting inline payloads
#[web::post("/send-file-base64")]
pub async fn send_file_base64(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendFile,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

#[web::post("/send-contact")]
pub async fn send_contact(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendContact,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Body: `{ phone, lat, lng, title? }`
#[web::post("/send-location")]
pub async fn send_location(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendLocation,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

#[web::post("/send-link-preview")]
pub async fn send_link_preview(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendLinkPreview,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

#[web::post("/send-buttons")]
pub async fn send_buttons(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendButtons,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Body: `{ phone, title, sections, description?, buttonText? }`
#[web::post("/send-list")]
pub async fn send_list(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendList,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

#[web::post("/reply-message")]
pub async fn reply_message(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::ReplyMessage,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

#[web::post("/edit-message")]
pub async fn edit_message(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::EditMessage,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

#[web::post("/delete-message")]
pub async fn delete_message(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::DeleteMessage,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Query: `?chatId=`
#[web::get("/get-messages")]
pub async fn get_messages(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    query: Query,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::GetMessages,
        &path.session,
        Ok(RequestFields::from_query(query.into_inner())),
        &app_state,
    )
    .await
}

#[web::get("/get-chats")]
pub async fn get_chats(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::GetChats,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}

#[web::get("/get-contacts")]
pub async fn get_contacts(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::GetContacts,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}

/// Reports the connection state, so it is not behind [`ConnectedSession`]
#[web::get("/check-connection-session")]
pub async fn check_connection(
    _: Authorized,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::CheckConnection,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}

#[web::get("/get-status")]
pub async fn get_status(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::GetStatus,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}

#[web::post("/set-status")]
pub async fn set_status(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SetStatus,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

#[web::post("/send-status-text")]
pub async fn send_status_text(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::SendStatusText,
        &path.session,
        body_fields(&req, &body),
        &app_state,
    )
    .await
}

/// Not behind [`ConnectedSession`]: the session is not connected yet
#[web::post("/start-session")]
pub async fn start_session(
    _: Authorized,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::StartSession,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}

#[web::post("/close-session")]
pub async fn close_session(
    _: Authorized,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::CloseSession,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}

#[web::post("/logout-session")]
pub async fn logout_session(
    _: Authorized,
    _: ConnectedSession,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::LogoutSession,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}

/// QR code to pair the device, only meaningful before the session connects
#[web::get("/qrcode-session")]
pub async fn qrcode_session(
    _: Authorized,
    path: web::types::Path<SessionPath>,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    respond(
        Operation::GetQrCode,
        &path.session,
        Ok(RequestFields::default()),
        &app_state,
    )
    .await
}
