//! Transform steps and the trait leaf transforms implement.

use crate::error::ParseError;
use crate::parser::Parser;
use crate::schema::{Config, Schema};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Trait for implementing configurable transforms.
///
/// A transform is a pure function of the value and the parser's config.
/// Transforms that declare a [`Schema`] have their fields merged into the
/// schema of every parser they are composed into.
pub trait Transform: Send + Sync {
    /// Name used in diagnostics and as the default registry name.
    fn name(&self) -> &str;

    /// Parameters this transform reads from the config.
    fn schema(&self) -> Option<Arc<Schema>> {
        None
    }

    /// Transform one value.
    ///
    /// `config` is the merged config of the whole parser; it always contains
    /// the fields of [`Transform::schema`].
    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError>;
}

/// Signature of single-argument functions usable as steps.
pub type ParseFn = dyn Fn(Value) -> Result<Value, ParseError> + Send + Sync;

/// A named single-argument function.
#[derive(Clone)]
pub struct Function {
    name: String,
    func: Arc<ParseFn>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(Value) -> Result<Value, ParseError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, value: Value) -> Result<Value, ParseError> {
        (self.func)(value)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

/// Shorthand for [`Function::new`].
pub fn func(
    name: impl Into<String>,
    f: impl Fn(Value) -> Result<Value, ParseError> + Send + Sync + 'static,
) -> Function {
    Function::new(name, f)
}

/// One normalized element of a parser's chain.
#[derive(Clone)]
pub(crate) enum Step {
    /// Plain function, config ignored.
    Function(Function),
    /// Configurable transform reading the merged config.
    Transform(Arc<dyn Transform>),
    /// Pre-configured parser, run with its own frozen config.
    Instance(Parser),
}

impl Step {
    pub(crate) fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        match self {
            Step::Function(f) => f.call(value),
            Step::Transform(t) => t.apply(value, config),
            Step::Instance(p) => p.parse(value),
        }
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            Step::Function(f) => f.name(),
            Step::Transform(t) => t.name(),
            Step::Instance(p) => p.parser_type().name(),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Function(func) => f.debug_tuple("Function").field(&func.name()).finish(),
            Step::Transform(t) => f.debug_tuple("Transform").field(&t.name()).finish(),
            Step::Instance(p) => f
                .debug_tuple("Instance")
                .field(&p.parser_type().name())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use crate::value::{Params, ParamsExt};

    struct Scale {
        schema: Arc<Schema>,
    }

    impl Transform for Scale {
        fn name(&self) -> &str {
            "Scale"
        }

        fn schema(&self) -> Option<Arc<Schema>> {
            Some(self.schema.clone())
        }

        fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
            let n = value
                .as_f64()
                .ok_or_else(|| ParseError::invalid_type("expected a number"))?;
            Ok(Value::Float(n * config.get_f64("factor").unwrap_or(1.0)))
        }
    }

    #[test]
    fn test_function_step_ignores_config() {
        let step = Step::Function(func("negate", |v| {
            Ok(Value::from(-v.as_f64().unwrap_or_default()))
        }));
        assert_eq!(step.name(), "negate");
        assert_eq!(
            step.apply(Value::Int(2), &Config::empty()).unwrap(),
            Value::Float(-2.0)
        );
    }

    #[test]
    fn test_transform_step_reads_config() {
        let schema = Arc::new(Schema::new("Scale").field(Field::float("factor").default(1.0)));
        let config = schema
            .instantiate(Params::new().with("factor", 3i64))
            .unwrap();
        let step = Step::Transform(Arc::new(Scale { schema }));

        assert_eq!(step.apply(Value::Int(2), &config).unwrap(), Value::Float(6.0));
        let err = step.apply(Value::from("x"), &config).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidType);
    }
}
