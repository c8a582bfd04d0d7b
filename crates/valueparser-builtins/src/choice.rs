//! Membership transforms.

use std::sync::Arc;
use valueparser_core::{Config, Field, ParseError, Schema, Transform, Value};

/// Equality where ints and floats compare by numeric value.
fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_f64() == b.as_f64()
        }
        _ => a == b,
    }
}

fn join(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| format!("{:?}", item.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accept only listed items.
///
/// Unlisted values are replaced by `default_item` when it is set (not null),
/// rejected otherwise.
pub struct Listed {
    schema: Arc<Schema>,
}

impl Listed {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(
                Schema::new("Listed")
                    .field(
                        Field::list("items")
                            .default(Vec::<Value>::new())
                            .description("accepted values"),
                    )
                    .field(
                        Field::any("default_item")
                            .default(Value::Null)
                            .description("replacement for unlisted values"),
                    ),
            ),
        }
    }
}

impl Default for Listed {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Listed {
    fn name(&self) -> &str {
        "Listed"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        let items = config
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if items.iter().any(|item| same(item, &value)) {
            return Ok(value);
        }
        match config.get("default_item") {
            Some(default) if !default.is_null() => Ok(default.clone()),
            _ => Err(ParseError::not_listed(format!(
                "item {:?} is not in the list: {}",
                value.to_string(),
                join(items)
            ))),
        }
    }
}

/// Map member names to member values.
///
/// A value that is already a member value is accepted as is, before any
/// name lookup.
pub struct Enumerated {
    schema: Arc<Schema>,
}

impl Enumerated {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(
                Schema::new("Enumerated")
                    .field(Field::object("members").description("member name to member value")),
            ),
        }
    }
}

impl Default for Enumerated {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Enumerated {
    fn name(&self) -> &str {
        "Enumerated"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        let Some(members) = config.get("members").and_then(Value::as_object) else {
            return Err(ParseError::invalid_value("no members configured"));
        };

        if members.values().any(|member| same(member, &value)) {
            return Ok(value);
        }
        if let Some(member) = value.as_str().and_then(|name| members.get(name)) {
            return Ok(member.clone());
        }

        let names: Vec<&str> = members.keys().map(String::as_str).collect();
        Err(ParseError::not_listed(format!(
            "{} is not a valid member; expected one of {}",
            value,
            names.join(", ")
        )))
    }
}
