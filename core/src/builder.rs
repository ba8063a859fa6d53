//! Turns an `Operation` plus `RequestArgs` into an `HttpRequest`.
//!
//! Building is synchronous and side-effect free. Credentials are not part
//! of it: `authorize` is applied by whoever sends the request, right before
//! sending.

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ConfigurationError;
use crate::http::HttpRequest;
use crate::operation::{MediaType, Operation, QueryValue, RequestArgs};

/// Characters left alone by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

pub fn build_request(
    config: &ClientConfig,
    op: &Operation,
    args: &RequestArgs,
) -> Result<HttpRequest, ConfigurationError> {
    let mut url = String::from(config.base_url());
    url.push_str(&substitute_path(op, &args.path)?);
    let query = encode_query(&args.query);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    let mut headers: Vec<(String, String)> = config.default_headers().to_vec();
    if !headers.iter().any(|(k, _)| k == "accept") {
        headers.push(("accept".to_string(), "application/json".to_string()));
    }

    let mut request = HttpRequest {
        method: op.method,
        url,
        headers,
        body: None,
    };

    if let Some((content_type, body)) = encode_body(op, args)? {
        request.set_header("content-type", content_type);
        request.body = Some(body);
    }

    Ok(request)
}

/// Add `authorization: Bearer <token>`; empty or absent tokens add nothing.
pub fn authorize(request: &mut HttpRequest, token: Option<String>) {
    match token {
        Some(token) if !token.trim().is_empty() => {
            request.set_header("authorization", format!("Bearer {token}"));
        }
        _ => {}
    }
}

fn substitute_path(
    op: &Operation,
    values: &[(String, String)],
) -> Result<String, ConfigurationError> {
    let mut out = String::with_capacity(op.path.len());
    let mut rest = op.path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| ConfigurationError::MissingPathParam {
                operation: op.id,
                name: name.to_string(),
            })?;
        out.push_str(&rest[..start]);
        out.push_str(&encode_component(value));
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn encode_query(query: &[(String, QueryValue)]) -> String {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            QueryValue::Undefined => {}
            QueryValue::One(v) => pairs.push(pair(key, v)),
            QueryValue::Many(vs) => pairs.extend(vs.iter().map(|v| pair(key, v))),
        }
    }
    pairs.join("&")
}

fn pair(key: &str, value: &str) -> String {
    format!("{}={}", encode_component(key), encode_component(value))
}

fn encode_body(
    op: &Operation,
    args: &RequestArgs,
) -> Result<Option<(String, Bytes)>, ConfigurationError> {
    match (op.media_type, &args.body, &args.form_data) {
        (_, None, None) => Ok(None),
        (Some(MediaType::Multipart), None, Some(form)) => {
            Ok(Some((form.content_type(), form.encode())))
        }
        (Some(MediaType::Multipart), Some(_), _) => Err(ConfigurationError::UnsupportedBody {
            operation: op.id,
            reason: "multipart operations take a pre-built form payload",
        }),
        (_, _, Some(_)) => Err(ConfigurationError::UnsupportedBody {
            operation: op.id,
            reason: "form payload supplied to a non-multipart operation",
        }),
        (Some(MediaType::FormUrlEncoded), Some(body), None) => Ok(Some((
            MediaType::FormUrlEncoded.as_str().to_string(),
            Bytes::from(encode_form(op, body)?),
        ))),
        (Some(MediaType::Json) | None, Some(body), None) => {
            let json = serde_json::to_vec(body)
                .map_err(|e| ConfigurationError::Serialization(e.to_string()))?;
            Ok(Some((MediaType::Json.as_str().to_string(), Bytes::from(json))))
        }
    }
}

fn encode_form(op: &Operation, body: &Value) -> Result<String, ConfigurationError> {
    let Value::Object(map) = body else {
        return Err(ConfigurationError::UnsupportedBody {
            operation: op.id,
            reason: "form-urlencoded body must be an object",
        });
    };
    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    pairs.push(pair(key, &scalar_text(item)));
                }
            }
            other => pairs.push(pair(key, &scalar_text(other))),
        }
    }
    Ok(pairs.join("&"))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
