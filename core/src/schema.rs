//! Static response shapes used for optional response validation.
//!
//! Schemas are `'static` data so they can be referenced from `Operation`
//! descriptors. Validation is structural: required properties must be
//! present, declared properties must have the declared type, and unknown
//! properties are ignored.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schema {
    String,
    Integer,
    Number,
    Boolean,
    Any,
    Nullable(&'static Schema),
    Array(&'static Schema),
    Object(&'static [Property]),
    /// Object with arbitrary keys whose values share one schema.
    Map(&'static Schema),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Property {
    pub const fn required(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: false,
        }
    }
}

/// First mismatch found, with a JSONPath-like location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub expected: &'static str,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}", self.path, self.expected)
    }
}

impl std::error::Error for SchemaViolation {}

impl Schema {
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.check(value, "$")
    }

    fn describe(&self) -> &'static str {
        match self {
            Schema::String => "string",
            Schema::Integer => "integer",
            Schema::Number => "number",
            Schema::Boolean => "boolean",
            Schema::Any => "any",
            Schema::Nullable(_) => "nullable value",
            Schema::Array(_) => "array",
            Schema::Object(_) | Schema::Map(_) => "object",
        }
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let ok = match (self, value) {
            (Schema::Any, _) => true,
            (Schema::Nullable(_), Value::Null) => true,
            (Schema::Nullable(inner), v) => return inner.check(v, path),
            (Schema::String, Value::String(_)) => true,
            (Schema::Boolean, Value::Bool(_)) => true,
            (Schema::Number, Value::Number(_)) => true,
            (Schema::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Schema::Array(item), Value::Array(items)) => {
                for (i, v) in items.iter().enumerate() {
                    item.check(v, &format!("{path}[{i}]"))?;
                }
                true
            }
            (Schema::Object(props), Value::Object(map)) => {
                for prop in props.iter() {
                    let child = format!("{path}.{}", prop.name);
                    match map.get(prop.name) {
                        Some(v) => prop.schema.check(v, &child)?,
                        None if prop.required => {
                            return Err(SchemaViolation {
                                path: child,
                                expected: "required property",
                            })
                        }
                        None => {}
                    }
                }
                true
            }
            (Schema::Map(inner), Value::Object(map)) => {
                for (k, v) in map {
                    inner.check(v, &format!("{path}.{k}"))?;
                }
                true
            }
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(SchemaViolation {
                path: path.to_string(),
                expected: self.describe(),
            })
        }
    }
}
