//! Client configuration and credential providers.
//!
//! # Design
//! `ClientConfig` is built once and shared read-only (`Arc`) by every
//! request. Nothing here is global: tests construct as many configurations
//! as they need. The credential provider is consulted once per request,
//! immediately before the transport call, so a token refreshed between two
//! calls is always the one sent.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::ConfigurationError;

pub const ENV_BASE_URL: &str = "RECIPE_API_URL";
pub const ENV_TOKEN: &str = "RECIPE_API_TOKEN";
pub const ENV_VALIDATE: &str = "RECIPE_API_VALIDATE";

/// Supplies the current bearer token. `None` or an empty string means the
/// request goes out without an `authorization` header.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn token(&self) -> Option<String>;
}

/// Never sends credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialProvider for NoCredentials {
    async fn token(&self) -> Option<String> {
        None
    }
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Synchronous provider, e.g. a read from an in-memory token store.
pub struct TokenFn<F>(pub F);

#[async_trait]
impl<F> CredentialProvider for TokenFn<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn token(&self) -> Option<String> {
        (self.0)()
    }
}

/// Asynchronous provider, e.g. one that refreshes an expired token first.
pub struct AsyncTokenFn<F>(pub F);

#[async_trait]
impl<F, Fut> CredentialProvider for AsyncTokenFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Option<String>> + Send,
{
    async fn token(&self) -> Option<String> {
        (self.0)().await
    }
}

/// Process-wide, read-only client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    default_headers: Vec<(String, String)>,
    validate_responses: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("validate_responses", &self.validate_responses)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: base_url.into(),
            credentials: Arc::new(NoCredentials),
            default_headers: Vec::new(),
            validate_responses: false,
        }
    }

    /// Read `RECIPE_API_URL`, `RECIPE_API_TOKEN` and `RECIPE_API_VALIDATE`
    /// from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigurationError::MissingBaseUrl)?;
        let mut builder = Self::builder(base_url);
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            builder = builder.token(token);
        }
        if let Some(flag) = lookup(ENV_VALIDATE) {
            builder = builder.validate_responses(matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ));
        }
        builder.build()
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    pub fn validate_responses(&self) -> bool {
        self.validate_responses
    }
}

/// Builder for `ClientConfig`. Validation happens in `build`.
pub struct ClientConfigBuilder {
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    default_headers: Vec<(String, String)>,
    validate_responses: bool,
}

impl ClientConfigBuilder {
    pub fn token(self, token: impl Into<String>) -> Self {
        self.credentials(StaticToken(token.into()))
    }

    pub fn credentials(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.credentials = Arc::new(provider);
        self
    }

    pub fn token_fn<F>(self, f: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.credentials(TokenFn(f))
    }

    pub fn async_token_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        self.credentials(AsyncTokenFn(f))
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers
            .push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigurationError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigurationError::MissingBaseUrl);
        }
        let parsed = Url::parse(trimmed).map_err(|e| ConfigurationError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidBaseUrl {
                url: trimmed.to_string(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(ConfigurationError::InvalidBaseUrl {
                url: trimmed.to_string(),
                reason: "query and fragment are not allowed".to_string(),
            });
        }

        for (name, value) in &self.default_headers {
            if !is_valid_header(name, value) {
                return Err(ConfigurationError::InvalidHeader { name: name.clone() });
            }
        }

        Ok(ClientConfig {
            base_url: trimmed.to_string(),
            credentials: self.credentials,
            default_headers: self.default_headers,
            validate_responses: self.validate_responses,
        })
    }
}

fn is_valid_header(name: &str, value: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
        && !value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0)
}
