//! Error types for the recipe API client.
//!
//! # Design
//! Failures fall into three disjoint groups. `ConfigurationError` is raised
//! synchronously while a request is being built, before anything touches the
//! network. `ApiError` and `CancelError` are the two ways an in-flight
//! request can settle without a value; `RequestError` is their union and is
//! the error type of every `CancelableRequest`.
//!
//! `ApiError` is a struct rather than an enum so callers branch on
//! `status` (422 for field validation, 0 for transport failures) instead of
//! matching variants.

use serde_json::Value;
use thiserror::Error;

/// Status recorded on an `ApiError` when no HTTP response was received.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Raised while building a request. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("missing path parameter `{name}` for {operation}")]
    MissingPathParam {
        operation: &'static str,
        name: String,
    },

    #[error("base URL is not set")]
    MissingBaseUrl,

    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid header `{name}`")]
    InvalidHeader { name: String },

    #[error("request body could not be serialized: {0}")]
    Serialization(String),

    /// The supplied payload does not fit the operation's media type.
    #[error("{operation}: {reason}")]
    UnsupportedBody {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("no async runtime available to execute {operation}")]
    NoRuntime { operation: &'static str },
}

/// A request settled with a failure status, a transport failure, or a
/// response that did not match its declared shape.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (status {status}, {url})")]
pub struct ApiError {
    /// HTTP status, or `TRANSPORT_FAILURE_STATUS` if nothing came back.
    pub status: u16,
    pub url: String,
    pub message: String,
    /// Decoded body: JSON when it parses, raw text otherwise.
    pub body: Option<Value>,
}

impl ApiError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            url: url.into(),
            message: message.into(),
            body: None,
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE_STATUS
    }

    /// `body.detail` as text, the field FastAPI-style backends put error
    /// explanations in.
    pub fn detail(&self) -> Option<String> {
        match self.body.as_ref()?.get("detail")? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// The request was aborted by its owner before it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Request aborted")]
pub struct CancelError;

/// How an in-flight request can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cancelled(#[from] CancelError),
}

impl RequestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled(_))
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            RequestError::Api(e) => Some(e),
            RequestError::Cancelled(_) => None,
        }
    }
}

/// Umbrella error for callers that build and await in one function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cancelled(#[from] CancelError),
}

impl From<RequestError> for Error {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(e) => Error::Api(e),
            RequestError::Cancelled(e) => Error::Cancelled(e),
        }
    }
}
