//! Attachment normalization for media sends.
//!
//! A media operation takes either a `path` the automation client can read or
//! an inline `base64` payload. Inline payloads are turned into a data URI so
//! the session handle always receives a single locator.

use super::fields::RequestFields;
use anyhow::Context;
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    prelude::BASE64_STANDARD,
};
use std::path::Path;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Infers the content type from the filename extension
pub fn content_type_for(filename: Option<&str>) -> &'static str {
    let extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "3gp" => "video/3gpp",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "ogg" | "opus" => "audio/ogg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

/// Accepts unpadded input; padding is restored when re-encoding
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a payload that may be line wrapped or unpadded and returns it in
/// canonical padded form
fn canonical_base64(encoded: &str) -> anyhow::Result<String> {
    let compact = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>();

    let bytes = LENIENT_BASE64
        .decode(compact)
        .context("base64 payload could not be decoded")?;

    Ok(BASE64_STANDARD.encode(bytes))
}

/// Builds `data:<content-type>;base64,<payload>` after checking the payload
/// decodes. A payload that already is a data URI keeps its content type.
pub fn data_uri(payload: &str, filename: Option<&str>) -> anyhow::Result<String> {
    let payload = payload.trim();
    if let Some((content_type, encoded)) = payload
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
    {
        return Ok(format!(
            "data:{};base64,{}",
            content_type,
            canonical_base64(encoded)?
        ));
    }

    Ok(format!(
        "data:{};base64,{}",
        content_type_for(filename),
        canonical_base64(payload)?
    ))
}

/// Media locator plus the optional metadata sent along with it
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub path: String,
    pub filename: Option<String>,
    pub caption: Option<String>,
}

impl Attachment {
    /// Prefers `path`; falls back to the inline `base64` payload
    pub fn from_fields(fields: &RequestFields) -> anyhow::Result<Self> {
        let filename = fields.text("filename");
        let caption = fields.text("caption");

        let path = match fields.text("path") {
            Some(path) => path,
            None => {
                let payload = fields
                    .text("base64")
                    .context("neither path nor base64 payload was provided")?;
                data_uri(&payload, filename.as_deref())?
            }
        };

        Ok(Self {
            path,
            filename,
            caption,
        })
    }
}
