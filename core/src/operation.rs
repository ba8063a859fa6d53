//! Declarative operation descriptors and call-time arguments.
//!
//! # Design
//! One `Operation` per endpoint, declared as a `static` and consumed by a
//! single generic builder/executor. Nothing about an endpoint is encoded in
//! code paths: method, URL template, body media type, success range, error
//! labels and response shape are all data.

use std::ops::RangeInclusive;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigurationError;
use crate::http::HttpMethod;
use crate::multipart::MultipartForm;
use crate::schema::Schema;

/// How a request body is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    FormUrlEncoded,
    Multipart,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::FormUrlEncoded => "application/x-www-form-urlencoded",
            MediaType::Multipart => "multipart/form-data",
        }
    }
}

/// Static description of one API endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: &'static str,
    pub method: HttpMethod,
    /// Path with `{name}` placeholders, appended to the base URL.
    pub path: &'static str,
    pub media_type: Option<MediaType>,
    pub success: RangeInclusive<u16>,
    /// Status code to human-readable label.
    pub errors: &'static [(u16, &'static str)],
    pub response: Option<&'static Schema>,
}

impl Operation {
    pub const fn new(id: &'static str, method: HttpMethod, path: &'static str) -> Self {
        Self {
            id,
            method,
            path,
            media_type: None,
            success: 200..=299,
            errors: &[],
            response: None,
        }
    }

    pub const fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub const fn success(mut self, success: RangeInclusive<u16>) -> Self {
        self.success = success;
        self
    }

    pub const fn errors(mut self, errors: &'static [(u16, &'static str)]) -> Self {
        self.errors = errors;
        self
    }

    pub const fn response(mut self, schema: &'static Schema) -> Self {
        self.response = Some(schema);
        self
    }

    pub fn is_success(&self, status: u16) -> bool {
        self.success.contains(&status)
    }

    pub fn error_label(&self, status: u16) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, label)| *label)
    }

    /// Placeholder names in template order.
    pub fn path_params(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            names.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        names
    }
}

/// A query parameter value. `Undefined` keys are dropped from the URL;
/// `Many` repeats the key once per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Undefined,
    One(String),
    Many(Vec<String>),
}

macro_rules! query_value_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for QueryValue {
                fn from(v: $t) -> Self {
                    QueryValue::One(v.to_string())
                }
            }

            impl From<Option<$t>> for QueryValue {
                fn from(v: Option<$t>) -> Self {
                    v.map_or(QueryValue::Undefined, |v| QueryValue::One(v.to_string()))
                }
            }

            impl From<Vec<$t>> for QueryValue {
                fn from(v: Vec<$t>) -> Self {
                    QueryValue::Many(v.iter().map(|x| x.to_string()).collect())
                }
            }
        )*
    };
}

query_value_from!(&str, String, bool, i32, i64, u32, u64, usize);

/// Everything supplied when an operation is invoked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArgs {
    pub(crate) path: Vec<(String, String)>,
    pub(crate) query: Vec<(String, QueryValue)>,
    pub(crate) body: Option<Value>,
    pub(crate) form_data: Option<MultipartForm>,
}

impl RequestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path.push((name.into(), value.to_string()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Body value, encoded later according to the operation's media type.
    pub fn body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ConfigurationError> {
        let value = serde_json::to_value(value)
            .map_err(|e| ConfigurationError::Serialization(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(value);
        self
    }

    /// Pre-built multipart payload, for file uploads.
    pub fn form_data(mut self, form: MultipartForm) -> Self {
        self.form_data = Some(form);
        self
    }
}
