//! Recursive key-case normalization for JSON payloads.
//!
//! The backend speaks snake_case; third-party payloads (open-graph scrapes)
//! arrive with `og:title`, `twitter-card` and similar keys. Both normalizers
//! are idempotent and never mutate their input.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    Camel,
    Snake,
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | ':' | ' ')
}

/// `nested_key` → `nestedKey`, `og:title` → `ogTitle`. The first segment
/// keeps its case; every later segment gets an uppercase first letter.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if is_separator(c) {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `nestedKey` → `nested_key`, `og:title` → `og_title`.
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if is_separator(c) {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else if c.is_uppercase() {
            if matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit())
                && !out.ends_with('_')
            {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

pub fn normalize_keys(value: &Value, case: KeyCase) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match case {
                    KeyCase::Camel => to_camel_case(k),
                    KeyCase::Snake => to_snake_case(k),
                };
                out.insert(key, normalize_keys(v, case));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| normalize_keys(v, case)).collect())
        }
        other => other.clone(),
    }
}

pub fn keys_to_camel_case(value: &Value) -> Value {
    normalize_keys(value, KeyCase::Camel)
}

pub fn keys_to_snake_case(value: &Value) -> Value {
    normalize_keys(value, KeyCase::Snake)
}
