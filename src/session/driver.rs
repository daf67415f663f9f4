//! # Automation Driver Client
//!
//! [`WhatsAppSession`] implementation that forwards every call to the
//! automation driver owning the browser session. Each call is a
//! `POST {base_url}/{session}/{method}` carrying the arguments as a JSON object.

use super::WhatsAppSession;
use crate::config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Session handle backed by the automation driver
#[derive(Clone)]
pub struct DriverSession {
    /// HTTP client for making driver requests
    client: reqwest::Client,
    /// Session name as known by the driver
    name: String,
    /// Driver base URL, without trailing slash
    base_url: String,
    /// Authentication token, empty when the driver is unauthenticated
    auth_token: String,
}

impl DriverSession {
    pub fn new(
        client: reqwest::Client,
        name: impl Into<String>,
        base_url: &str,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
        }
    }

    /// Creates a session handle from the application configuration
    pub fn from_config(client: reqwest::Client, name: &str) -> Result<Self> {
        let app_config = config::APP_CONFIG
            .get()
            .context("failed to get app config")?;

        Ok(Self::new(
            client,
            name,
            &app_config.driver_url,
            app_config.driver_token.clone(),
        ))
    }

    /// Endpoint for `method` on this session
    pub fn endpoint(&self, method: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.name, method)
    }

    /// Internal method to invoke any driver method
    async fn call(&self, method: &str, args: Value) -> Result<Value> {
        let mut request = self.client.post(self.endpoint(method)).json(&args);
        if !self.auth_token.is_empty() {
            request = request.bearer_auth(&self.auth_token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {method} request to automation driver"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            anyhow::bail!("Automation driver returned error status {}: {}", status, body);
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read automation driver response")?;

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).context("Failed to parse automation driver response")
    }
}

#[async_trait]
impl WhatsAppSession for DriverSession {
    async fn send_text(&self, to: String, message: String) -> Result<Value> {
        self.call("sendText", json!({ "to": to, "message": message }))
            .await
    }

    async fn send_voice(&self, to: String, path: String) -> Result<Value> {
        self.call("sendVoice", json!({ "to": to, "path": path }))
            .await
    }

    async fn send_image(
        &self,
        to: String,
        path: String,
        filename: Option<String>,
        caption: Option<String>,
    ) -> Result<Value> {
        self.call(
            "sendImage",
            json!({ "to": to, "path": path, "filename": filename, "caption": caption }),
        )
        .await
    }

    async fn send_file(
        &self,
        to: String,
        path: String,
        filename: Option<String>,
        caption: Option<String>,
    ) -> Result<Value> {
        self.call(
            "sendFile",
            json!({ "to": to, "path": path, "filename": filename, "caption": caption }),
        )
        .await
    }

    async fn send_video(
        &self,
        to: String,
        path: String,
        filename: Option<String>,
        caption: Option<String>,
    ) -> Result<Value> {
        self.call(
            "sendVideo",
            json!({ "to": to, "path": path, "filename": filename, "caption": caption }),
        )
        .await
    }

    async fn send_contact(&self, to: String, contact_id: String) -> Result<Value> {
        self.call("sendContact", json!({ "to": to, "contactId": contact_id }))
            .await
    }

    async fn send_location(
        &self,
        to: String,
        lat: f64,
        lng: f64,
        title: Option<String>,
    ) -> Result<Value> {
        self.call(
            "sendLocation",
            json!({ "to": to, "lat": lat, "lng": lng, "title": title }),
        )
        .await
    }

    async fn send_link_preview(
        &self,
        to: String,
        url: String,
        title: Option<String>,
    ) -> Result<Value> {
        self.call(
            "sendLinkPreview",
            json!({ "to": to, "url": url, "title": title }),
        )
        .await
    }

    async fn send_buttons(&self, to: String, title: String, buttons: Value) -> Result<Value> {
        self.call(
            "sendButtons",
            json!({ "to": to, "title": title, "buttons": buttons }),
        )
        .await
    }

    async fn send_list(
        &self,
        to: String,
        title: String,
        description: Option<String>,
        button_text: Option<String>,
        sections: Value,
    ) -> Result<Value> {
        self.call(
            "sendList",
            json!({
                "to": to,
                "title": title,
                "description": description,
                "buttonText": button_text,
                "sections": sections,
            }),
        )
        .await
    }

    async fn reply(&self, message_id: String, message: String) -> Result<Value> {
        self.call("reply", json!({ "messageId": message_id, "message": message }))
            .await
    }

    async fn edit_message(&self, message_id: String, new_message: String) -> Result<Value> {
        self.call(
            "editMessage",
            json!({ "messageId": message_id, "newMessage": new_message }),
        )
        .await
    }

    async fn delete_message(&self, message_id: String) -> Result<Value> {
        self.call("deleteMessage", json!({ "messageId": message_id }))
            .await
    }

    async fn get_messages(&self, chat_id: String) -> Result<Value> {
        self.call("getMessages", json!({ "chatId": chat_id })).await
    }

    async fn get_chats(&self) -> Result<Value> {
        self.call("getChats", json!({})).await
    }

    async fn get_contacts(&self) -> Result<Value> {
        self.call("getContacts", json!({})).await
    }

    async fn get_connection_state(&self) -> Result<Value> {
        self.call("getConnectionState", json!({})).await
    }

    async fn set_my_status(&self, status: String) -> Result<Value> {
        self.call("setMyStatus", json!({ "status": status })).await
    }

    async fn get_my_status(&self) -> Result<Value> {
        self.call("getMyStatus", json!({})).await
    }

    async fn start_session(&self) -> Result<Value> {
        self.call("startSession", json!({})).await
    }

    async fn close_session(&self) -> Result<Value> {
        self.call("closeSession", json!({})).await
    }

    async fn logout_session(&self) -> Result<Value> {
        self.call("logoutSession", json!({})).await
    }

    async fn get_qr_code(&self) -> Result<Value> {
        self.call("getQrCode", json!({})).await
    }
}
