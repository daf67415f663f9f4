//! # Sessions
//!
//! The contract the HTTP layer relies on to talk to a logged-in WhatsApp
//! automation client, and the registry that maps session names to them.
//!
//! ## Submodules
//!
//! - [`driver`] - [`WhatsAppSession`] implementation backed by the automation driver

pub mod driver;

use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// Every operation the HTTP layer may invoke on a session.
///
/// Results are opaque JSON values produced by the automation client and are
/// returned to the caller untouched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WhatsAppSession: Send + Sync {
    async fn send_text(&self, to: String, message: String) -> anyhow::Result<Value>;

    async fn send_voice(&self, to: String, path: String) -> anyhow::Result<Value>;

    async fn send_image(
        &self,
        to: String,
        path: String,
        filename: Option<String>,
        caption: Option<String>,
    ) -> anyhow::Result<Value>;

    async fn send_file(
        &self,
        to: String,
        path: String,
        filename: Option<String>,
        caption: Option<String>,
    ) -> anyhow::Result<Value>;

    async fn send_video(
        &self,
        to: String,
        path: String,
        filename: Option<String>,
        caption: Option<String>,
    ) -> anyhow::Result<Value>;

    async fn send_contact(&self, to: String, contact_id: String) -> anyhow::Result<Value>;

    async fn send_location(
        &self,
        to: String,
        lat: f64,
        lng: f64,
        title: Option<String>,
    ) -> anyhow::Result<Value>;

    async fn send_link_preview(
        &self,
        to: String,
        url: String,
        title: Option<String>,
    ) -> anyhow::Result<Value>;

    async fn send_buttons(&self, to: String, title: String, buttons: Value)
    -> anyhow::Result<Value>;

    async fn send_list(
        &self,
        to: String,
        title: String,
        description: Option<String>,
        button_text: Option<String>,
        sections: Value,
    ) -> anyhow::Result<Value>;

    async fn reply(&self, message_id: String, message: String) -> anyhow::Result<Value>;

    async fn edit_message(&self, message_id: String, new_message: String)
    -> anyhow::Result<Value>;

    async fn delete_message(&self, message_id: String) -> anyhow::Result<Value>;

    async fn get_messages(&self, chat_id: String) -> anyhow::Result<Value>;

    async fn get_chats(&self) -> anyhow::Result<Value>;

    async fn get_contacts(&self) -> anyhow::Result<Value>;

    /// Connection state as reported by the client, `"CONNECTED"` when usable
    async fn get_connection_state(&self) -> anyhow::Result<Value>;

    async fn set_my_status(&self, status: String) -> anyhow::Result<Value>;

    async fn get_my_status(&self) -> anyhow::Result<Value>;

    /// Opens the browser session; the result carries the QR code while the
    /// device is not paired
    async fn start_session(&self) -> anyhow::Result<Value>;

    async fn close_session(&self) -> anyhow::Result<Value>;

    /// Unpairs the device
    async fn logout_session(&self) -> anyhow::Result<Value>;

    async fn get_qr_code(&self) -> anyhow::Result<Value>;
}

pub type ImplSession = Arc<dyn WhatsAppSession>;

/// Read-only keyed access to session handles
pub trait SessionRegistry: Send + Sync {
    fn get(&self, name: &str) -> Option<ImplSession>;

    /// Registered session names, sorted
    fn names(&self) -> Vec<String>;
}

pub type ImplSessionRegistry = Arc<dyn SessionRegistry>;

/// Registry kept in process memory
#[derive(Default)]
pub struct InMemorySessionRegistry {
    sessions: RwLock<HashMap<String, ImplSession>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session` under `name`, returning the handle it replaced
    pub fn insert(&self, name: impl Into<String>, session: ImplSession) -> Option<ImplSession> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.into(), session)
    }

    pub fn remove(&self, name: &str) -> Option<ImplSession> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name)
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn get(&self, name: &str) -> Option<ImplSession> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    fn names(&self) -> Vec<String> {
        let mut names = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}
