//! Parser specs: the building blocks a parser type is composed from.

use crate::error::BuildError;
use crate::parser::{Parser, ParserType};
use crate::registry::Registry;
use crate::schema::Schema;
use crate::step::{Function, Step, Transform};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// One element of a parser composition.
#[derive(Clone)]
pub enum SpecItem {
    /// Single-argument function; contributes no parameters.
    Function(Function),
    /// Configurable transform; contributes its schema, if any.
    Transform(Arc<dyn Transform>),
    /// Existing parser type; its steps are spliced in and its schema merged.
    Type(ParserType),
    /// Configured parser; runs with its own config and contributes no parameters.
    Instance(Parser),
    /// Name of a registered parser type.
    Name(String),
    /// Ordered composition of items, flattened depth-first.
    List(Vec<SpecItem>),
}

impl SpecItem {
    pub fn transform(transform: impl Transform + 'static) -> Self {
        SpecItem::Transform(Arc::new(transform))
    }

    pub fn name(name: impl Into<String>) -> Self {
        SpecItem::Name(name.into())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SpecItem>,
    {
        SpecItem::List(items.into_iter().map(Into::into).collect())
    }

    /// Decode a spec from a dynamic value: a name or a list of specs.
    pub fn from_value(value: &Value) -> Result<Self, BuildError> {
        match value {
            Value::String(name) => Ok(SpecItem::Name(name.clone())),
            Value::Array(items) => items
                .iter()
                .map(SpecItem::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(SpecItem::List),
            other => Err(BuildError::InvalidSpec(format!(
                "expected a parser name or a list of specs, got {} {}",
                other.type_name(),
                other
            ))),
        }
    }
}

impl fmt::Debug for SpecItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecItem::Function(func) => f.debug_tuple("Function").field(&func.name()).finish(),
            SpecItem::Transform(t) => f.debug_tuple("Transform").field(&t.name()).finish(),
            SpecItem::Type(t) => f.debug_tuple("Type").field(&t.name()).finish(),
            SpecItem::Instance(p) => f
                .debug_tuple("Instance")
                .field(&p.parser_type().name())
                .finish(),
            SpecItem::Name(name) => f.debug_tuple("Name").field(name).finish(),
            SpecItem::List(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl From<Function> for SpecItem {
    fn from(f: Function) -> Self {
        SpecItem::Function(f)
    }
}

impl From<Arc<dyn Transform>> for SpecItem {
    fn from(t: Arc<dyn Transform>) -> Self {
        SpecItem::Transform(t)
    }
}

impl From<ParserType> for SpecItem {
    fn from(t: ParserType) -> Self {
        SpecItem::Type(t)
    }
}

impl From<&ParserType> for SpecItem {
    fn from(t: &ParserType) -> Self {
        SpecItem::Type(t.clone())
    }
}

impl From<Parser> for SpecItem {
    fn from(p: Parser) -> Self {
        SpecItem::Instance(p)
    }
}

impl From<&str> for SpecItem {
    fn from(name: &str) -> Self {
        SpecItem::Name(name.to_string())
    }
}

impl From<String> for SpecItem {
    fn from(name: String) -> Self {
        SpecItem::Name(name)
    }
}

impl<T: Into<SpecItem>> From<Vec<T>> for SpecItem {
    fn from(items: Vec<T>) -> Self {
        SpecItem::list(items)
    }
}

impl TryFrom<&Value> for SpecItem {
    type Error = BuildError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        SpecItem::from_value(value)
    }
}

/// Steps and schema fragments collected from a spec.
#[derive(Debug, Default)]
pub(crate) struct Normalized {
    pub(crate) steps: Vec<Step>,
    pub(crate) fragments: Vec<Arc<Schema>>,
}

impl Normalized {
    /// Normalize a spec, resolving names through `registry`.
    pub(crate) fn from_spec(spec: &SpecItem, registry: &Registry) -> Result<Self, BuildError> {
        let mut out = Self::default();
        out.push(spec, registry)?;
        Ok(out)
    }

    fn push(&mut self, spec: &SpecItem, registry: &Registry) -> Result<(), BuildError> {
        match spec {
            SpecItem::Function(f) => {
                if f.name().is_empty() {
                    return Err(BuildError::InvalidSpec("unnamed function".into()));
                }
                self.steps.push(Step::Function(f.clone()));
            }
            SpecItem::Transform(t) => {
                if t.name().is_empty() {
                    return Err(BuildError::InvalidSpec("unnamed transform".into()));
                }
                self.steps.push(Step::Transform(Arc::clone(t)));
                if let Some(schema) = t.schema() {
                    self.fragments.push(schema);
                }
            }
            SpecItem::Type(t) => self.push_type(t),
            SpecItem::Instance(p) => self.steps.push(Step::Instance(p.clone())),
            SpecItem::Name(name) => {
                if name.is_empty() {
                    return Err(BuildError::InvalidSpec("empty parser name".into()));
                }
                let t = registry.resolve(name)?;
                self.push_type(&t);
            }
            SpecItem::List(items) => {
                for item in items {
                    self.push(item, registry)?;
                }
            }
        }
        Ok(())
    }

    fn push_type(&mut self, parser_type: &ParserType) {
        self.steps.extend(parser_type.steps().iter().cloned());
        let schema = parser_type.schema();
        if !schema.is_empty() {
            self.fragments.push(Arc::clone(schema));
        }
    }
}
