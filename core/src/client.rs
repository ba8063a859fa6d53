//! Generic request executor for the recipe API.
//!
//! # Design
//! `ApiClient` holds the shared configuration and a transport and knows
//! nothing about individual endpoints; every call is an `Operation` plus
//! `RequestArgs`. A call goes through four stages:
//! 1. `build_request` (synchronous; configuration errors surface here and
//!    no task is spawned),
//! 2. credential lookup and `authorize`,
//! 3. `Transport::send`, the single suspension point on the network,
//! 4. `classify` and typed decoding.
//!
//! Stages 2 to 4 run on a spawned task behind a `CancelableRequest`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::builder::{authorize, build_request};
use crate::cancel::CancelableRequest;
use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigurationError, RequestError};
use crate::http::HttpRequest;
use crate::operation::{Operation, RequestArgs};
use crate::response::{classify, into_typed, Decoded};
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client over the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start `op` and decode the success body into `T`.
    pub fn request<T>(
        &self,
        op: &'static Operation,
        args: RequestArgs,
    ) -> Result<CancelableRequest<T>, ConfigurationError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.start(op, args, into_typed::<T>)
    }

    /// Start `op` and return the body exactly as decoded from the wire.
    pub fn request_raw(
        &self,
        op: &'static Operation,
        args: RequestArgs,
    ) -> Result<CancelableRequest<Decoded>, ConfigurationError> {
        self.start(op, args, |decoded, _, _| Ok(decoded))
    }

    fn start<T: Send + 'static>(
        &self,
        op: &'static Operation,
        args: RequestArgs,
        decode: fn(Decoded, u16, &str) -> Result<T, ApiError>,
    ) -> Result<CancelableRequest<T>, ConfigurationError> {
        let request = build_request(&self.config, op, &args)?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ConfigurationError::NoRuntime { operation: op.id });
        }

        let span = tracing::debug_span!(
            "api_request",
            operation = op.id,
            http.method = %request.method,
            http.url = %request.url,
            http.status_code = tracing::field::Empty,
        );
        let url = request.url.clone();
        let config = self.config.clone();
        let transport = self.transport.clone();
        let pipeline = {
            let url = url.clone();
            async move {
                let (status, decoded) = execute(&config, transport.as_ref(), op, request).await?;
                decode(decoded, status, &url).map_err(RequestError::from)
            }
            .instrument(span)
        };

        Ok(CancelableRequest::spawn(url, pipeline))
    }
}

async fn execute(
    config: &ClientConfig,
    transport: &dyn Transport,
    op: &Operation,
    mut request: HttpRequest,
) -> Result<(u16, Decoded), ApiError> {
    let token = config.credentials().token().await;
    authorize(&mut request, token);

    let url = request.url.clone();
    let response = match transport.send(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(error = %e, "transport failure");
            return Err(ApiError::transport(url, e.to_string()));
        }
    };
    tracing::Span::current().record("http.status_code", response.status);
    tracing::debug!(status = response.status, "response received");

    let decoded = classify(op, &response, &url, config.validate_responses())?;
    Ok((response.status, decoded))
}
