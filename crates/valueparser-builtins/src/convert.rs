//! Type conversions and null replacement.

use std::sync::Arc;
use valueparser_core::{Config, Field, Function, ParseError, Schema, Transform, Value, func};

/// `n` as an `i64`, failing when it is not a number or out of range.
pub(crate) fn checked_i64(n: f64) -> Result<i64, ParseError> {
    if n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Ok(n as i64)
    } else {
        Err(ParseError::invalid_value(format!(
            "cannot convert {:?} to int",
            n
        )))
    }
}

/// Convert to an integer. Floats are truncated toward zero.
pub fn to_int() -> Function {
    func("int", |value| match value {
        v @ Value::Int(_) => Ok(v),
        Value::Float(n) => checked_i64(n.trunc()).map(Value::Int),
        Value::Bool(b) => Ok(Value::Int(b as i64)),
        Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            ParseError::invalid_value(format!("invalid literal for int: {:?}", s))
        }),
        other => Err(ParseError::invalid_type(format!(
            "cannot convert {} to int",
            other.type_name()
        ))),
    })
}

/// Convert to a float.
pub fn to_float() -> Function {
    func("float", |value| match value {
        v @ Value::Float(_) => Ok(v),
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            ParseError::invalid_value(format!("could not convert string to float: {:?}", s))
        }),
        other => Err(ParseError::invalid_type(format!(
            "cannot convert {} to float",
            other.type_name()
        ))),
    })
}

/// Convert to a string using the value's display form.
pub fn to_str() -> Function {
    func("str", |value| match value {
        v @ Value::String(_) => Ok(v),
        other => Ok(Value::String(other.to_string())),
    })
}

/// Convert to a bool.
///
/// Numbers are true when non-zero, containers when non-empty. Strings must
/// spell a boolean (`true`, `yes`, `on`, `1`, ...).
pub fn to_bool() -> Function {
    func("bool", |value| match value {
        v @ Value::Bool(_) => Ok(v),
        Value::Null => Ok(Value::Bool(false)),
        Value::Int(n) => Ok(Value::Bool(n != 0)),
        Value::Float(n) => Ok(Value::Bool(n != 0.0)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err(ParseError::invalid_value(format!(
                "cannot interpret {:?} as bool",
                s
            ))),
        },
        Value::Array(items) => Ok(Value::Bool(!items.is_empty())),
        Value::Object(obj) => Ok(Value::Bool(!obj.is_empty())),
    })
}

/// Replace null with a configured default. Registered as `Default`.
pub struct DefaultValue {
    schema: Arc<Schema>,
}

impl DefaultValue {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(
                Schema::new("Default").field(
                    Field::any("default")
                        .default(Value::Null)
                        .description("value used in place of null"),
                ),
            ),
        }
    }
}

impl Default for DefaultValue {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for DefaultValue {
    fn name(&self) -> &str {
        "Default"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        if value.is_null() {
            return Ok(config.get("default").cloned().unwrap_or(Value::Null));
        }
        Ok(value)
    }
}
