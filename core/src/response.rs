//! Response decoding and status classification.
//!
//! `classify` is pure: given the operation, the response and the URL it came
//! from, it either yields the decoded success body or the one `ApiError`
//! that describes the failure. Both the async executor and host-driven
//! callers go through it.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::operation::Operation;

pub const UNEXPECTED_STATUS: &str = "Unexpected status";
pub const VALIDATION_FAILED: &str = "Response validation failed.";
pub const DECODING_FAILED: &str = "Response decoding failed.";

/// A success body, decoded according to its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Json(Value),
    Text(String),
    Binary(Bytes),
    Empty,
}

impl Decoded {
    /// View as JSON: text becomes a string value, empty becomes null.
    /// Binary bodies have no JSON view.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Decoded::Json(v) => Some(v),
            Decoded::Text(s) => Some(Value::String(s)),
            Decoded::Empty => Some(Value::Null),
            Decoded::Binary(_) => None,
        }
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn is_text(content_type: &str) -> bool {
    let lower = content_type.trim().to_ascii_lowercase();
    lower.starts_with("text/")
        || lower.starts_with("application/xml")
        || lower.starts_with("application/x-www-form-urlencoded")
}

/// Decode a body by content type. `Err` only for a JSON content type whose
/// body does not parse.
pub fn decode_body(response: &HttpResponse) -> Result<Decoded, serde_json::Error> {
    if response.body.is_empty() {
        return Ok(Decoded::Empty);
    }
    match response.content_type() {
        Some(ct) if is_json(ct) => serde_json::from_slice(&response.body).map(Decoded::Json),
        Some(ct) if is_text(ct) => Ok(text_or_binary(&response.body)),
        Some(_) => Ok(Decoded::Binary(response.body.clone())),
        None => Ok(text_or_binary(&response.body)),
    }
}

fn text_or_binary(body: &Bytes) -> Decoded {
    match std::str::from_utf8(body) {
        Ok(s) => Decoded::Text(s.to_string()),
        Err(_) => Decoded::Binary(body.clone()),
    }
}

/// Best-effort body for error reports: JSON if it parses, text otherwise.
pub fn error_body(response: &HttpResponse) -> Option<Value> {
    if response.body.is_empty() {
        return None;
    }
    serde_json::from_slice(&response.body)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(&response.body).into_owned())))
}

pub fn classify(
    op: &Operation,
    response: &HttpResponse,
    url: &str,
    validate: bool,
) -> Result<Decoded, ApiError> {
    let fail = |message: &str| ApiError {
        status: response.status,
        url: url.to_string(),
        message: message.to_string(),
        body: error_body(response),
    };

    if !op.is_success(response.status) {
        return Err(fail(op.error_label(response.status).unwrap_or(UNEXPECTED_STATUS)));
    }

    let decoded = decode_body(response).map_err(|_| fail(DECODING_FAILED))?;

    if validate {
        if let Some(schema) = op.response {
            let valid = match &decoded {
                Decoded::Json(value) => schema.validate(value).is_ok(),
                _ => false,
            };
            if !valid {
                return Err(fail(VALIDATION_FAILED));
            }
        }
    }

    Ok(decoded)
}

/// Convert a decoded success body into `T`.
pub fn into_typed<T: DeserializeOwned>(
    decoded: Decoded,
    status: u16,
    url: &str,
) -> Result<T, ApiError> {
    let fail = |body: Option<Value>| ApiError {
        status,
        url: url.to_string(),
        message: DECODING_FAILED.to_string(),
        body,
    };
    let value = decoded.into_json().ok_or_else(|| fail(None))?;
    T::deserialize(&value).map_err(|_| fail(Some(value)))
}
