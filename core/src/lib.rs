//! Typed API client core for the recipe and meal-planning service.
//!
//! # Overview
//! Every endpoint is a static `Operation` descriptor in `operations`. A call
//! pairs a descriptor with `RequestArgs`; `ApiClient` turns that into an
//! `HttpRequest`, authorizes it, sends it through a `Transport`, classifies
//! the `HttpResponse` and decodes the body into the caller's type.
//!
//! # Design
//! - Building (`build_request`) and classifying (`classify`) are pure, so a
//!   host can drive the network itself and still share the core's rules.
//! - `ApiClient` is the async path: each call returns a `CancelableRequest`
//!   that resolves exactly once with a value, an `ApiError` or a
//!   `CancelError`.
//! - Configuration is read once per call; credentials are resolved per call,
//!   so a rotated token is picked up by the next request.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod builder;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod multipart;
pub mod normalize;
pub mod operation;
pub mod operations;
pub mod response;
pub mod schema;
pub mod transport;
pub mod types;

pub use builder::{authorize, build_request};
pub use cancel::{CancelHandle, CancelableRequest};
pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder, CredentialProvider};
pub use error::{ApiError, CancelError, ConfigurationError, Error, RequestError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::MultipartForm;
pub use normalize::{keys_to_camel_case, keys_to_snake_case, KeyCase};
pub use operation::{MediaType, Operation, QueryValue, RequestArgs};
pub use response::{classify, Decoded};
pub use transport::{ReqwestTransport, Transport, TransportError};
