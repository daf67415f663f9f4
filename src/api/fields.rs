//! Request field access shared by every operation.
//!
//! Fields come from a JSON body, an urlencoded form body or the query string
//! and are kept as JSON values. Validation is presence based only.

use super::envelope::ApiError;
use serde_json::{Map, Value};
use std::collections::HashMap;

const RECIPIENT_FIELD: &str = "phone";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequestFields(Map<String, Value>);

impl RequestFields {
    pub fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(Value::Null) => Ok(Self::default()),
            Ok(_) => Err(ApiError::Validation(
                "Request body must be a JSON object".into(),
            )),
            Err(e) => Err(ApiError::Validation(format!(
                "Request body is not valid JSON: {e}"
            ))),
        }
    }

    /// Parses an urlencoded body; a key repeated in the form becomes an array
    pub fn from_form(body: &[u8]) -> Result<Self, ApiError> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
            .map_err(|e| ApiError::Validation(format!("Request body is not a valid form: {e}")))?;

        let mut map = Map::new();
        for (key, value) in pairs {
            match map.get_mut(&key) {
                Some(Value::Array(values)) => values.push(Value::String(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
                None => {
                    map.insert(key, Value::String(value));
                }
            }
        }

        Ok(Self(map))
    }

    pub fn from_query(query: HashMap<String, String>) -> Self {
        Self(
            query
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        )
    }

    /// Picks the parser from the request content type, JSON by default
    pub fn from_request_body(content_type: Option<&str>, body: &[u8]) -> Result<Self, ApiError> {
        let is_form = content_type
            .map(|ct| ct.trim_start().starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            Self::from_form(body)
        } else {
            Self::from_json(body)
        }
    }

    /// A field is present when it exists and is neither null nor an empty string.
    /// `phone` is judged on the recipient it yields.
    pub fn is_present(&self, key: &str) -> bool {
        if key == RECIPIENT_FIELD {
            return self.recipient().is_some();
        }

        match self.0.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|key| !self.is_present(key))
            .collect()
    }

    /// Scalar field as text; numbers and booleans are stringified
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The `phone` field. A sequence (duplicate form fields) yields its first
    /// element only.
    pub fn recipient(&self) -> Option<String> {
        match self.0.get(RECIPIENT_FIELD)? {
            Value::Array(values) => match values.first()? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
            _ => self.text(RECIPIENT_FIELD),
        }
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.0.get(key).filter(|v| !v.is_null()).cloned()
    }

    /// Numeric field, given either as a JSON number or as numeric text
    pub fn number(&self, key: &str) -> anyhow::Result<f64> {
        match self.0.get(key) {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("{key} is out of range")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| anyhow::anyhow!("{key} is not a number: {e}")),
            _ => anyhow::bail!("{key} is not a number"),
        }
    }
}

impl From<Map<String, Value>> for RequestFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
