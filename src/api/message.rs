//! # Message API Module
//!
//! The operations exposed for a session: validation of the request fields,
//! session lookup, a single call on the session handle and the envelope that
//! reports the outcome.

use super::{
    attachment::Attachment,
    envelope::{ApiError, ResponseWriter},
    fields::RequestFields,
};
use crate::{
    metric,
    session::{SessionRegistry, WhatsAppSession},
};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SendMessage,
    SendMentioned,
    SendVoice,
    SendImage,
    SendVideo,
    SendFile,
    SendContact,
    SendLocation,
    SendLinkPreview,
    SendButtons,
    SendList,
    ReplyMessage,
    EditMessage,
    DeleteMessage,
    GetMessages,
    GetChats,
    GetContacts,
    CheckConnection,
    GetStatus,
    SetStatus,
    SendStatusText,
    StartSession,
    CloseSession,
    LogoutSession,
    GetQrCode,
}

impl Operation {
    pub const ALL: [Operation; 25] = [
        Operation::SendMessage,
        Operation::SendMentioned,
        Operation::SendVoice,
        Operation::SendImage,
        Operation::SendVideo,
        Operation::SendFile,
        Operation::SendContact,
        Operation::SendLocation,
        Operation::SendLinkPreview,
        Operation::SendButtons,
        Operation::SendList,
        Operation::ReplyMessage,
        Operation::EditMessage,
        Operation::DeleteMessage,
        Operation::GetMessages,
        Operation::GetChats,
        Operation::GetContacts,
        Operation::CheckConnection,
        Operation::GetStatus,
        Operation::SetStatus,
        Operation::SendStatusText,
        Operation::StartSession,
        Operation::CloseSession,
        Operation::LogoutSession,
        Operation::GetQrCode,
    ];

    /// Label used in logs and in `Failed to <label>` errors
    pub fn label(&self) -> &'static str {
        match self {
            Operation::SendMessage => "send message",
            Operation::SendMentioned => "send mentioned message",
            Operation::SendVoice => "send voice",
            Operation::SendImage => "send image",
            Operation::SendVideo => "send video",
            Operation::SendFile => "send file",
            Operation::SendContact => "send contact",
            Operation::SendLocation => "send location",
            Operation::SendLinkPreview => "send link preview",
            Operation::SendButtons => "send buttons",
            Operation::SendList => "send list",
            Operation::ReplyMessage => "reply message",
            Operation::EditMessage => "edit message",
            Operation::DeleteMessage => "delete message",
            Operation::GetMessages => "get messages",
            Operation::GetChats => "get chats",
            Operation::GetContacts => "get contacts",
            Operation::CheckConnection => "check connection",
            Operation::GetStatus => "get status",
            Operation::SetStatus => "set status",
            Operation::SendStatusText => "update status",
            Operation::StartSession => "start session",
            Operation::CloseSession => "close session",
            Operation::LogoutSession => "logout session",
            Operation::GetQrCode => "get QR code",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Operation::SendMessage => "Message sent successfully",
            Operation::SendMentioned => "Message with mentions sent successfully",
            Operation::SendVoice => "Voice message sent successfully",
            Operation::SendImage => "Image sent successfully",
            Operation::SendVideo => "Video sent successfully",
            Operation::SendFile => "File sent successfully",
            Operation::SendContact => "Contact sent successfully",
            Operation::SendLocation => "Location sent successfully",
            Operation::SendLinkPreview => "Link preview sent successfully",
            Operation::SendButtons => "Buttons sent successfully",
            Operation::SendList => "List sent successfully",
            Operation::ReplyMessage => "Reply sent successfully",
            Operation::EditMessage => "Message edited successfully",
            Operation::DeleteMessage => "Message deleted successfully",
            Operation::GetMessages => "Messages retrieved successfully",
            Operation::GetChats => "Chats retrieved successfully",
            Operation::GetContacts => "Contacts retrieved successfully",
            Operation::CheckConnection => "Connection status retrieved successfully",
            Operation::GetStatus => "Status retrieved successfully",
            Operation::SetStatus => "Status set successfully",
            Operation::SendStatusText => "Status updated successfully",
            Operation::StartSession => "Session started successfully",
            Operation::CloseSession => "Session closed successfully",
            Operation::LogoutSession => "Session logged out successfully",
            Operation::GetQrCode => "QR code retrieved successfully",
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Operation::SendMessage | Operation::SendMentioned => &["phone", "message"],
            Operation::SendVoice
            | Operation::SendImage
            | Operation::SendVideo
            | Operation::SendFile => &["phone"],
            Operation::SendContact => &["phone", "contactId"],
            Operation::SendLocation => &["phone", "lat", "lng"],
            Operation::SendLinkPreview => &["phone", "url"],
            Operation::SendButtons => &["phone", "title", "buttons"],
            Operation::SendList => &["phone", "title", "sections"],
            Operation::ReplyMessage => &["messageId", "message"],
            Operation::EditMessage => &["messageId", "newMessage"],
            Operation::DeleteMessage => &["messageId"],
            Operation::GetMessages => &["chatId"],
            Operation::SetStatus | Operation::SendStatusText => &["status"],
            Operation::GetChats
            | Operation::GetContacts
            | Operation::CheckConnection
            | Operation::GetStatus
            | Operation::StartSession
            | Operation::CloseSession
            | Operation::LogoutSession
            | Operation::GetQrCode => &[],
        }
    }

    /// Name of `field` in validation messages
    fn field_name(&self, field: &'static str) -> &'static str {
        match (self, field) {
            (Operation::SendStatusText, "status") => "status text",
            _ => field,
        }
    }

    /// Operations that need either a `path` or an inline `base64` payload
    pub fn needs_attachment(&self) -> bool {
        matches!(
            self,
            Operation::SendVoice | Operation::SendImage | Operation::SendVideo | Operation::SendFile
        )
    }

    /// Checks every required field is present, naming the missing ones
    pub fn validate(&self, fields: &RequestFields) -> Result<(), ApiError> {
        let mut missing = fields
            .missing(self.required_fields())
            .into_iter()
            .map(|field| self.field_name(field))
            .collect::<Vec<_>>();
        if self.needs_attachment() && !fields.is_present("path") && !fields.is_present("base64")
        {
            missing.push("path or base64");
        }

        if missing.is_empty() {
            return Ok(());
        }

        Err(ApiError::Validation(missing_fields_message(&missing)))
    }
}

/// `["phone", "message"]` becomes `"Phone and message are required"`
fn missing_fields_message(missing: &[&str]) -> String {
    let mut names = missing.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    if let Some(first) = names.first_mut() {
        let mut chars = first.chars();
        if let Some(c) = chars.next() {
            *first = c.to_uppercase().chain(chars).collect();
        }
    }

    match names.as_slice() {
        [single] => format!("{single} is required"),
        [rest @ .., last] => format!("{} and {last} are required", rest.join(", ")),
        [] => String::new(),
    }
}

fn required_text(fields: &RequestFields, key: &str) -> anyhow::Result<String> {
    fields
        .text(key)
        .ok_or_else(|| anyhow::anyhow!("{key} must be a text value"))
}

fn required_recipient(fields: &RequestFields) -> anyhow::Result<String> {
    fields
        .recipient()
        .ok_or_else(|| anyhow::anyhow!("phone must be a text value"))
}

fn required_value(fields: &RequestFields, key: &str) -> anyhow::Result<Value> {
    fields
        .value(key)
        .ok_or_else(|| anyhow::anyhow!("{key} is missing"))
}

/// Extracts the operation arguments and calls the session once.
///
/// `mentions` is accepted by [`Operation::SendMentioned`] but not forwarded;
/// the message goes out as plain text.
pub async fn dispatch(
    operation: Operation,
    session: &dyn WhatsAppSession,
    fields: &RequestFields,
) -> anyhow::Result<Value> {
    match operation {
        Operation::SendMessage | Operation::SendMentioned => {
            session
                .send_text(required_recipient(fields)?, required_text(fields, "message")?)
                .await
        }
        Operation::SendVoice => {
            let attachment = Attachment::from_fields(fields)?;
            session
                .send_voice(required_recipient(fields)?, attachment.path)
                .await
        }
        Operation::SendImage => {
            let Attachment {
                path,
                filename,
                caption,
            } = Attachment::from_fields(fields)?;
            session
                .send_image(required_recipient(fields)?, path, filename, caption)
                .await
        }
        Operation::SendVideo => {
            let Attachment {
                path,
                filename,
                caption,
            } = Attachment::from_fields(fields)?;
            session
                .send_video(required_recipient(fields)?, path, filename, caption)
                .await
        }
        Operation::SendFile => {
            let Attachment {
                path,
                filename,
                caption,
            } = Attachment::from_fields(fields)?;
            session
                .send_file(required_recipient(fields)?, path, filename, caption)
                .await
        }
        Operation::SendContact => {
            session
                .send_contact(
                    required_recipient(fields)?,
                    required_text(fields, "contactId")?,
                )
                .await
        }
        Operation::SendLocation => {
            session
                .send_location(
                    required_recipient(fields)?,
                    fields.number("lat")?,
                    fields.number("lng")?,
                    fields.text("title"),
                )
                .await
        }
        Operation::SendLinkPreview => {
            session
                .send_link_preview(
                    required_recipient(fields)?,
                    required_text(fields, "url")?,
                    fields.text("title"),
                )
                .await
        }
        Operation::SendButtons => {
            session
                .send_buttons(
                    required_recipient(fields)?,
                    required_text(fields, "title")?,
                    required_value(fields, "buttons")?,
                )
                .await
        }
        Operation::SendList => {
            session
                .send_list(
                    required_recipient(fields)?,
                    required_text(fields, "title")?,
                    fields.text("description"),
                    fields.text("buttonText"),
                    required_value(fields, "sections")?,
                )
                .await
        }
        Operation::ReplyMessage => {
            session
                .reply(
                    required_text(fields, "messageId")?,
                    required_text(fields, "message")?,
                )
                .await
        }
        Operation::EditMessage => {
            session
                .edit_message(
                    required_text(fields, "messageId")?,
                    required_text(fields, "newMessage")?,
                )
                .await
        }
        Operation::DeleteMessage => {
            session
                .delete_message(required_text(fields, "messageId")?)
                .await
        }
        Operation::GetMessages => {
            session
                .get_messages(required_text(fields, "chatId")?)
                .await
        }
        Operation::GetChats => session.get_chats().await,
        Operation::GetContacts => session.get_contacts().await,
        Operation::CheckConnection => session.get_connection_state().await,
        Operation::GetStatus => session.get_my_status().await,
        Operation::SetStatus | Operation::SendStatusText => {
            session
                .set_my_status(required_text(fields, "status")?)
                .await
        }
        Operation::StartSession => session.start_session().await,
        Operation::CloseSession => session.close_session().await,
        Operation::LogoutSession => session.logout_session().await,
        Operation::GetQrCode => session.get_qr_code().await,
    }
}

async fn run(
    operation: Operation,
    registry: &dyn SessionRegistry,
    session_name: &str,
    fields: &RequestFields,
) -> Result<Value, ApiError> {
    operation.validate(fields)?;

    let session = registry
        .get(session_name)
        .ok_or(ApiError::SessionNotFound)?;

    dispatch(operation, session.as_ref(), fields)
        .await
        .map_err(|e| ApiError::operational(operation.label(), e))
}

/// Runs `operation` for `session_name` and writes its envelope.
///
/// Nothing is dispatched when `writer` is already finalized.
pub async fn handle(
    writer: &mut ResponseWriter,
    registry: &dyn SessionRegistry,
    session_name: &str,
    operation: Operation,
    fields: &RequestFields,
    expose_details: bool,
) {
    if writer.is_finalized() {
        logfire::warn!(
            "Response already sent for {operation}, skipping",
            operation = operation.label()
        );
        return;
    }

    match run(operation, registry, session_name, fields).await {
        Ok(data) => {
            metric::incr_operation_statds(operation.label(), "success");
            writer.success(operation.success_message(), data);
        }
        Err(err @ ApiError::Operational { .. }) => {
            logfire::error!(
                "Error in {operation}: {error}",
                operation = operation.label(),
                error = err.to_string()
            );
            metric::incr_operation_statds(operation.label(), "error");
            writer.failure(&err, expose_details);
        }
        Err(err) => {
            logfire::warn!(
                "Rejected {operation} for session {session}: {error}",
                operation = operation.label(),
                session = session_name.to_string(),
                error = err.to_string()
            );
            metric::incr_operation_statds(operation.label(), "rejected");
            writer.failure(&err, expose_details);
        }
    }
}
