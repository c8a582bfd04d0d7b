//! Parameter schemas and the merger that combines them.
//!
//! Every configurable transform declares a [`Schema`] fragment: an ordered set
//! of named, typed, defaulted [`Field`]s. Composing transforms merges their
//! fragments into one schema, which validates keyword parameters into a
//! [`Config`].

use crate::error::BuildError;
use crate::value::{Params, Value};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Accepted type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Any,
    Bool,
    Int,
    Float,
    Str,
    List,
    Object,
}

impl FieldKind {
    /// Check a value against this kind, widening where the kind allows it.
    ///
    /// Ints are accepted for floats; integral floats are accepted for ints.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (FieldKind::Any, v) => Some(v),
            (FieldKind::Bool, v @ Value::Bool(_)) => Some(v),
            (FieldKind::Int, v @ Value::Int(_)) => Some(v),
            (FieldKind::Int, Value::Float(n))
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 =>
            {
                Some(Value::Int(n as i64))
            }
            (FieldKind::Float, v @ Value::Float(_)) => Some(v),
            (FieldKind::Float, Value::Int(n)) => Some(Value::Float(n as f64)),
            (FieldKind::Str, v @ Value::String(_)) => Some(v),
            (FieldKind::List, v @ Value::Array(_)) => Some(v),
            (FieldKind::Object, v @ Value::Object(_)) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Any => "any",
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Str => "str",
            FieldKind::List => "list",
            FieldKind::Object => "object",
        }
    }
}

/// A named parameter of a transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Whether `null` is an accepted value.
    #[serde(default)]
    pub nullable: bool,
    /// Default value. A field without a default is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Field {
    /// Create a required field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
            description: String::new(),
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Any)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn str(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Str)
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Object)
    }

    /// Set the default value, making the field optional.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Accept `null` as a value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Validate a parameter value for this field.
    pub fn validate(&self, value: Value) -> Result<Value, BuildError> {
        if value.is_null() && (self.nullable || self.kind == FieldKind::Any) {
            return Ok(value);
        }
        let found = value.type_name();
        self.kind
            .coerce(value)
            .ok_or_else(|| BuildError::InvalidParameter {
                parameter: self.name.clone(),
                expected: self.expected(),
                found: found.to_string(),
            })
    }

    fn expected(&self) -> String {
        if self.nullable {
            format!("{} or null", self.kind.as_str())
        } else {
            self.kind.as_str().to_string()
        }
    }

    /// Two fields agree when kind, nullability and default all match.
    fn same_definition(&self, other: &Field) -> bool {
        self.kind == other.kind && self.nullable == other.nullable && self.default == other.default
    }
}

/// How to treat a field declared by two merged fragments with different definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Keep the first definition and log a warning.
    #[default]
    FirstWins,
    /// Fail the merge with [`BuildError::SchemaConflict`].
    Reject,
}

/// A named set of parameter fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    name: String,
    fields: IndexMap<String, Field>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field. A field of the same name is replaced.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// The shared schema without any field.
    pub fn empty() -> Arc<Schema> {
        static EMPTY: OnceLock<Arc<Schema>> = OnceLock::new();
        EMPTY.get_or_init(|| Arc::new(Schema::new("Empty"))).clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a config built for `other` can be used with this schema.
    pub fn accepts(&self, other: &Schema) -> bool {
        self.fields == other.fields
    }

    /// Merge schema fragments into one.
    ///
    /// No fragment yields [`Schema::empty`], a single fragment is returned
    /// as-is. Otherwise fields are collected in fragment order and the first
    /// definition of a name wins. Redefinitions that differ are handled
    /// according to `policy`.
    pub fn merge(
        name: impl Into<String>,
        fragments: &[Arc<Schema>],
        policy: CollisionPolicy,
    ) -> Result<Arc<Schema>, BuildError> {
        let mut unique: Vec<&Arc<Schema>> = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            if !unique.iter().any(|seen| Arc::ptr_eq(seen, fragment)) {
                unique.push(fragment);
            }
        }

        match unique.as_slice() {
            [] => return Ok(Schema::empty()),
            [only] => return Ok(Arc::clone(only)),
            _ => {}
        }

        let mut merged = Schema::new(name);
        let mut origin: IndexMap<&str, &str> = IndexMap::new();

        for fragment in unique {
            for field in fragment.fields() {
                match merged.fields.get(&field.name) {
                    None => {
                        origin.insert(&field.name, &fragment.name);
                        merged.fields.insert(field.name.clone(), field.clone());
                    }
                    Some(existing) if existing.same_definition(field) => {}
                    Some(_) => {
                        let first = origin.get(field.name.as_str()).copied().unwrap_or_default();
                        match policy {
                            CollisionPolicy::Reject => {
                                return Err(BuildError::SchemaConflict {
                                    parameter: field.name.clone(),
                                    first: first.to_string(),
                                    second: fragment.name.clone(),
                                });
                            }
                            CollisionPolicy::FirstWins => {
                                tracing::warn!(
                                    parameter = %field.name,
                                    kept = first,
                                    ignored = %fragment.name,
                                    "divergent parameter definition ignored while merging schemas"
                                );
                            }
                        }
                    }
                }
            }
        }

        Ok(Arc::new(merged))
    }

    /// Validate keyword parameters into a config.
    ///
    /// Unknown names are rejected, missing fields take their default.
    pub fn instantiate(self: &Arc<Self>, mut params: Params) -> Result<Config, BuildError> {
        if let Some(unknown) = params.keys().find(|key| !self.fields.contains_key(*key)) {
            return Err(BuildError::UnknownParameter {
                schema: self.name.clone(),
                parameter: unknown.clone(),
            });
        }

        let mut values = Params::with_capacity(self.fields.len());
        for field in self.fields.values() {
            let value = match params.shift_remove(&field.name) {
                Some(value) => field.validate(value)?,
                None => field
                    .default
                    .clone()
                    .ok_or_else(|| BuildError::MissingParameter {
                        schema: self.name.clone(),
                        parameter: field.name.clone(),
                    })?,
            };
            values.insert(field.name.clone(), value);
        }

        Ok(Config {
            schema: Arc::clone(self),
            values,
        })
    }

    /// Check keyword parameters without keeping the resulting config.
    pub fn check(self: &Arc<Self>, params: &Params) -> Result<(), BuildError> {
        self.instantiate(params.clone()).map(|_| ())
    }
}

/// A validated instance of a [`Schema`].
///
/// Holds one value per schema field. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    schema: Arc<Schema>,
    values: Params,
}

impl Config {
    /// The config of the empty schema.
    pub fn empty() -> Self {
        Self {
            schema: Schema::empty(),
            values: Params::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &Params {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}
