//! Typed-field adapter for schema/validation frameworks.
//!
//! A host framework describes each field of its models with a
//! [`FieldDescriptor`] and runs the field's validators in sequence, each one
//! receiving the previous output. [`Parsed`] is a validator that delegates to
//! a [`Parser`], so a composed parser can be used as a field type.

use crate::error::{BuildError, ParseError};
use crate::parser::{Parser, ParserBuilder, ParserType};
use crate::registry::Registry;
use crate::spec::SpecItem;
use crate::value::{Params, Value};
use std::fmt;
use std::sync::Arc;

/// Errors raised while validating a field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("field '{field}' accepts exactly one inner value, got {count}")]
    TooManyArguments { field: String, count: usize },

    #[error("field '{field}': {source}")]
    Parse {
        field: String,
        #[source]
        source: ParseError,
    },

    #[error("field '{field}': {message}")]
    Invalid { field: String, message: String },
}

/// Validator protocol of the host framework.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: Value, field: &FieldDescriptor) -> Result<Value, FieldError>;
}

impl<F> FieldValidator for F
where
    F: Fn(Value, &FieldDescriptor) -> Result<Value, FieldError> + Send + Sync,
{
    fn validate(&self, value: Value, field: &FieldDescriptor) -> Result<Value, FieldError> {
        self(value, field)
    }
}

/// A field declaration: its validators and its parametrization.
///
/// `sub_fields` are the inner value declarations of a parametrized field
/// type (`Parsed[inner]`).
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    validators: Vec<Arc<dyn FieldValidator>>,
    sub_fields: Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validators: Vec::new(),
            sub_fields: Vec::new(),
        }
    }

    /// Append a validator.
    pub fn validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Append an inner value declaration.
    pub fn sub_field(mut self, field: FieldDescriptor) -> Self {
        self.sub_fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sub_fields(&self) -> &[FieldDescriptor] {
        &self.sub_fields
    }

    /// Run every validator in order.
    pub fn validate(&self, value: Value) -> Result<Value, FieldError> {
        self.validators
            .iter()
            .try_fold(value, |value, validator| validator.validate(value, self))
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("validators", &self.validators.len())
            .field("sub_fields", &self.sub_fields)
            .finish()
    }
}

/// Field type whose validation is a parser's `parse`.
#[derive(Debug, Clone)]
pub struct Parsed {
    parser: Parser,
}

impl Parsed {
    pub fn new(parser: Parser) -> Self {
        Self { parser }
    }

    /// Wrap a parser type, configured with its defaults.
    pub fn from_type(parser_type: &ParserType) -> Result<Self, BuildError> {
        parser_type.default_instance().map(Self::new)
    }

    /// Build and configure a parser for use as a field type.
    ///
    /// Names are resolved through [`Registry::global`].
    pub fn build(spec: impl Into<SpecItem>, params: Params) -> Result<Self, BuildError> {
        Self::build_with(&ParserBuilder::new(Registry::global()), spec, params)
    }

    pub fn build_with(
        builder: &ParserBuilder<'_>,
        spec: impl Into<SpecItem>,
        params: Params,
    ) -> Result<Self, BuildError> {
        builder.parser(spec, params).map(Self::new)
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// A field declaration validated by this parser.
    pub fn descriptor(&self, name: impl Into<String>) -> FieldDescriptor {
        FieldDescriptor::new(name).validator(self.clone())
    }
}

impl FieldValidator for Parsed {
    fn validate(&self, value: Value, field: &FieldDescriptor) -> Result<Value, FieldError> {
        let value = match field.sub_fields() {
            [] => value,
            [inner] => inner.validate(value)?,
            many => {
                return Err(FieldError::TooManyArguments {
                    field: field.name().to_string(),
                    count: many.len(),
                });
            }
        };
        self.parser.parse(value).map_err(|source| FieldError::Parse {
            field: field.name().to_string(),
            source,
        })
    }
}

impl Parser {
    /// Use this parser as a field type.
    pub fn field(&self) -> Parsed {
        Parsed::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::step::func;

    fn cap(max: f64) -> Parser {
        let registry = Registry::new();
        ParserBuilder::new(&registry)
            .parser(
                func("cap", move |v| {
                    let n = v
                        .as_f64()
                        .ok_or_else(|| ParseError::invalid_type("expected a number"))?;
                    if n > max {
                        return Err(ParseError::out_of_bound(format!("{} > {}", n, max)));
                    }
                    Ok(Value::Float(n))
                }),
                Params::new(),
            )
            .unwrap()
    }

    fn to_float(value: Value, field: &FieldDescriptor) -> Result<Value, FieldError> {
        match value {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| FieldError::Invalid {
                    field: field.name().to_string(),
                    message: e.to_string(),
                }),
            other => Ok(other),
        }
    }

    #[test]
    fn test_plain_field_delegates_to_parse() {
        let field = cap(10.0).field().descriptor("x");
        assert_eq!(field.validate(Value::Int(3)).unwrap(), Value::Float(3.0));

        let err = field.validate(Value::Int(30)).unwrap_err();
        assert!(matches!(
            err,
            FieldError::Parse { ref field, ref source } if field == "x" && source.code == ErrorCode::OutOfBound
        ));
    }

    #[test]
    fn test_validators_run_in_sequence() {
        let field = FieldDescriptor::new("x")
            .validator(to_float)
            .validator(cap(10.0).field());
        assert_eq!(field.validate(Value::from("2.5")).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_single_sub_field_is_validated_first() {
        let inner = FieldDescriptor::new("value").validator(to_float);
        let field = cap(10.0).field().descriptor("x").sub_field(inner);

        assert_eq!(field.validate(Value::from("4")).unwrap(), Value::Float(4.0));
        let err = field.validate(Value::from("abc")).unwrap_err();
        assert!(matches!(err, FieldError::Invalid { .. }));
    }

    #[test]
    fn test_too_many_sub_fields() {
        let field = cap(10.0)
            .field()
            .descriptor("x")
            .sub_field(FieldDescriptor::new("a"))
            .sub_field(FieldDescriptor::new("b"));

        assert_eq!(
            field.validate(Value::Int(1)).unwrap_err(),
            FieldError::TooManyArguments {
                field: "x".into(),
                count: 2
            }
        );
    }

    #[test]
    fn test_nested_adapters_resolve_one_value() {
        let innermost = FieldDescriptor::new("raw").validator(to_float);
        let inner = cap(100.0).field().descriptor("inner").sub_field(innermost);
        let outer = cap(10.0).field().descriptor("outer").sub_field(inner);

        assert_eq!(outer.validate(Value::from("7")).unwrap(), Value::Float(7.0));

        // Passes the inner cap, rejected by the outer one.
        let err = outer.validate(Value::from("50")).unwrap_err();
        assert!(matches!(err, FieldError::Parse { ref field, .. } if field == "outer"));

        let err = outer.validate(Value::from("500")).unwrap_err();
        assert!(matches!(err, FieldError::Parse { ref field, .. } if field == "inner"));
    }

    #[test]
    fn test_from_type_uses_defaults() {
        let t = ParserType::from_function(func("identity", Ok));
        let parsed = Parsed::from_type(&t).unwrap();
        assert!(parsed.parser().parser_type().ptr_eq(&t));
        assert_eq!(
            parsed.descriptor("x").validate(Value::Null).unwrap(),
            Value::Null
        );
    }
}
