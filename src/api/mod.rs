//! # API Module
//!
//! Business logic behind the HTTP routes. Nothing here reads global
//! configuration; the session registry and flags are passed in.
//!
//! ## Modules
//!
//! - [`attachment`] - Inline payload to data URI normalization
//! - [`envelope`] - Response envelope, error kinds and the write-once response writer
//! - [`fields`] - Presence-based access to request fields
//! - [`message`] - The session operations
//! - [`token`] - Session bearer tokens

pub mod attachment;
pub mod envelope;
pub mod fields;
pub mod message;
pub mod token;
