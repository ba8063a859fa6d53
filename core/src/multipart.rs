//! Pre-built `multipart/form-data` payloads.
//!
//! File parts carry raw bytes and are copied into the encoded body verbatim;
//! nothing in here ever runs a multipart payload through JSON.

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ConfigurationError;

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("recipe-core-{}", Uuid::new_v4().simple()))
    }

    /// Fixed boundary, for reproducible encodings in tests.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Text parts from the fields of a JSON object. Nulls are skipped,
    /// arrays become one part per element and nested objects are sent as
    /// JSON text.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let Value::Object(map) = value else {
            return Err(ConfigurationError::Serialization(
                "multipart fields must be a JSON object".to_string(),
            ));
        };
        let mut form = Self::new();
        for (name, field) in map {
            match field {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items.iter().filter(|v| !v.is_null()) {
                        form = form.text(name.clone(), field_text(item));
                    }
                }
                other => form = form.text(name.clone(), field_text(other)),
            }
        }
        Ok(form)
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for part in &self.parts {
            buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quoted(&part.name)
            );
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
            }
            buf.put_slice(disposition.as_bytes());
            buf.put_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                buf.put_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        buf.freeze()
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
