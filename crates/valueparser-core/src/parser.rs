//! Parser types and parser instances.
//!
//! A [`ParserType`] is an ordered chain of steps plus the merged schema of
//! everything it was composed from. A [`Parser`] pairs a type with one
//! validated [`Config`] and runs the chain on demand.

use crate::error::{BuildError, ParseError};
use crate::registry::Registry;
use crate::schema::{CollisionPolicy, Config, Schema};
use crate::spec::{Normalized, SpecItem};
use crate::step::{Function, Step, Transform};
use crate::value::{Params, Value};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static PARSER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Next automatic parser name (`Parser001`, `Parser002`, ...).
///
/// Unique within the process, not stable across runs.
fn auto_name() -> String {
    let n = PARSER_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("Parser{:03}", n)
}

struct TypeInner {
    name: String,
    steps: Vec<Step>,
    schema: Arc<Schema>,
    base: Option<ParserType>,
}

/// A composed parser type.
///
/// Cheap to clone; clones share identity (see [`ParserType::ptr_eq`]).
#[derive(Clone)]
pub struct ParserType {
    inner: Arc<TypeInner>,
}

impl ParserType {
    fn from_parts(
        name: String,
        steps: Vec<Step>,
        schema: Arc<Schema>,
        base: Option<ParserType>,
    ) -> Self {
        Self {
            inner: Arc::new(TypeInner {
                name,
                steps,
                schema,
                base,
            }),
        }
    }

    /// One-step type running a transform, named after it.
    pub fn from_transform(transform: impl Transform + 'static) -> Self {
        let name = transform.name().to_string();
        let schema = transform.schema().unwrap_or_else(Schema::empty);
        Self::from_parts(
            name,
            vec![Step::Transform(Arc::new(transform))],
            schema,
            None,
        )
    }

    /// One-step type running a function, named after it.
    pub fn from_function(function: Function) -> Self {
        let name = function.name().to_string();
        Self::from_parts(name, vec![Step::Function(function)], Schema::empty(), None)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Merged schema of all composed steps.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    pub(crate) fn steps(&self) -> &[Step] {
        &self.inner.steps
    }

    /// Names of the steps, in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.inner.steps.iter().map(Step::name).collect()
    }

    /// The type this one was renamed from, if any.
    pub fn base(&self) -> Option<&ParserType> {
        self.inner.base.as_ref()
    }

    /// Whether both handles refer to the same type.
    pub fn ptr_eq(&self, other: &ParserType) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether this type is `other` or was derived from it by renaming.
    pub fn is_subtype_of(&self, other: &ParserType) -> bool {
        let mut current = Some(self);
        while let Some(t) = current {
            if t.ptr_eq(other) {
                return true;
            }
            current = t.base();
        }
        false
    }

    /// A new type with the same behavior under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::from_parts(
            name.into(),
            self.inner.steps.clone(),
            Arc::clone(&self.inner.schema),
            Some(self.clone()),
        )
    }

    /// Validate keyword parameters against the merged schema.
    pub fn config(&self, params: Params) -> Result<Config, BuildError> {
        self.inner.schema.instantiate(params)
    }

    /// Create an instance configured from keyword parameters.
    pub fn instance(&self, params: Params) -> Result<Parser, BuildError> {
        Parser::new(self, params)
    }

    /// Create an instance with every parameter at its default.
    pub fn default_instance(&self) -> Result<Parser, BuildError> {
        Parser::new(self, Params::new())
    }
}

impl PartialEq for ParserType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ParserType {}

impl fmt::Debug for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserType")
            .field("name", &self.name())
            .field("steps", &self.step_names())
            .field("parameters", &self.schema().field_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds parser types from specs.
///
/// Names in specs are resolved through the builder's registry.
#[derive(Debug, Clone, Copy)]
pub struct ParserBuilder<'r> {
    registry: &'r Registry,
    policy: CollisionPolicy,
}

impl<'r> ParserBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            policy: CollisionPolicy::default(),
        }
    }

    /// Set how divergent parameter definitions are merged.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Build a parser type from a spec.
    ///
    /// An existing type (or the name of one) is returned unchanged when no
    /// name is given, and as a renamed subtype otherwise. Any other spec is
    /// normalized into a fresh type, auto-named unless `name` is given.
    pub fn build(
        &self,
        spec: impl Into<SpecItem>,
        name: Option<&str>,
    ) -> Result<ParserType, BuildError> {
        let spec = spec.into();
        let existing = match &spec {
            SpecItem::Type(t) => Some(t.clone()),
            SpecItem::Name(n) if !n.is_empty() => Some(self.registry.resolve(n)?),
            _ => None,
        };
        if let Some(t) = existing {
            return Ok(match name {
                None => t,
                Some(name) => t.renamed(name),
            });
        }

        let normalized = Normalized::from_spec(&spec, self.registry)?;
        let name = name.map_or_else(auto_name, str::to_string);
        let schema = Schema::merge(name.as_str(), &normalized.fragments, self.policy)?;

        tracing::debug!(
            parser = %name,
            steps = normalized.steps.len(),
            parameters = schema.len(),
            "built parser type"
        );

        Ok(ParserType::from_parts(name, normalized.steps, schema, None))
    }

    /// Build a parser type and instantiate it with keyword parameters.
    pub fn parser(&self, spec: impl Into<SpecItem>, params: Params) -> Result<Parser, BuildError> {
        self.build(spec, None)?.instance(params)
    }
}

/// Build a parser type, resolving names through [`Registry::global`].
pub fn parser_type(spec: impl Into<SpecItem>, name: Option<&str>) -> Result<ParserType, BuildError> {
    ParserBuilder::new(Registry::global()).build(spec, name)
}

/// Build and configure a parser, resolving names through [`Registry::global`].
pub fn parser(spec: impl Into<SpecItem>, params: Params) -> Result<Parser, BuildError> {
    ParserBuilder::new(Registry::global()).parser(spec, params)
}

/// A configured parser.
///
/// Immutable; safe to share and to call from several threads at once.
#[derive(Clone)]
pub struct Parser {
    parser_type: ParserType,
    config: Arc<Config>,
    path: Option<String>,
}

impl Parser {
    /// Configure a parser type from keyword parameters.
    pub fn new(parser_type: &ParserType, params: Params) -> Result<Self, BuildError> {
        let config = parser_type.config(params)?;
        Ok(Self {
            parser_type: parser_type.clone(),
            config: Arc::new(config),
            path: None,
        })
    }

    /// Configure a parser type from an already validated config.
    ///
    /// The config must come from the type's schema, or from a schema with the
    /// same fields.
    pub fn with_config(parser_type: &ParserType, config: Config) -> Result<Self, BuildError> {
        let expected = parser_type.schema();
        if !Arc::ptr_eq(expected, config.schema()) && !expected.accepts(config.schema()) {
            return Err(BuildError::ConfigMismatch {
                parser: parser_type.name().to_string(),
                found: config.schema().name().to_string(),
            });
        }
        Ok(Self {
            parser_type: parser_type.clone(),
            config: Arc::new(config),
            path: None,
        })
    }

    /// Attach a diagnostic path (e.g. `settings.parser`).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn parser_type(&self) -> &ParserType {
        &self.parser_type
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Run every step in order, stopping at the first error.
    pub fn parse(&self, value: impl Into<Value>) -> Result<Value, ParseError> {
        let mut value = value.into();
        for (index, step) in self.parser_type.steps().iter().enumerate() {
            value = step.apply(value, &self.config).inspect_err(|err| {
                tracing::debug!(
                    parser = self.parser_type.name(),
                    path = self.path.as_deref().unwrap_or(""),
                    step = index,
                    step_name = step.name(),
                    code = %err.code,
                    "parse failed: {}",
                    err
                );
            })?;
        }
        Ok(value)
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("type", &self.parser_type.name())
            .field("config", self.config.values())
            .field("path", &self.path)
            .finish()
    }
}
