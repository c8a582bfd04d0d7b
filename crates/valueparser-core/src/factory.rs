//! Deferred parser construction.
//!
//! A [`Factory`] is declared early (a field of some larger configuration
//! object) and materialized later, when its owner is finalized. Declaration
//! validates the spec and the parameter names; [`Factory::build`] creates the
//! actual [`Parser`].

use crate::error::BuildError;
use crate::parser::{Parser, ParserBuilder, ParserType};
use crate::registry::Registry;
use crate::schema::Config;
use crate::spec::SpecItem;
use crate::value::{Params, Value};
use serde::{Deserialize, Deserializer};

/// Key holding the spec in the mapping form of a factory.
pub const TYPE_KEY: &str = "type";

/// Where a factory is being built: the owner's path and the field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    parent: Option<String>,
    name: Option<String>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Context of a field nested under this one.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            parent: self.path(),
            name: Some(name.into()),
        }
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Dotted path of the field, e.g. `settings.parser`.
    pub fn path(&self) -> Option<String> {
        match (self.parent.as_deref(), self.name.as_deref()) {
            (Some(parent), Some(name)) => Some(format!("{}.{}", parent, name)),
            (Some(parent), None) => Some(parent.to_string()),
            (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    /// Raw parameters, checked but not yet instantiated.
    Deferred {
        parser_type: ParserType,
        params: Params,
    },
    /// Already validated configuration.
    Config {
        parser_type: ParserType,
        config: Config,
    },
    /// Already built parser, passed through.
    Instance(Parser),
}

/// A deferred parser builder.
#[derive(Debug, Clone)]
pub struct Factory {
    source: Source,
}

impl Factory {
    /// Declare a parser from a spec and raw parameters.
    ///
    /// Names are resolved through [`Registry::global`].
    pub fn new(spec: impl Into<SpecItem>, params: Params) -> Result<Self, BuildError> {
        Self::new_with(&ParserBuilder::new(Registry::global()), spec, params)
    }

    /// Declare a parser, building its type with `builder`.
    ///
    /// The type is built right away and `params` are checked against its
    /// schema; the parser itself is only created by [`Factory::build`].
    pub fn new_with(
        builder: &ParserBuilder<'_>,
        spec: impl Into<SpecItem>,
        params: Params,
    ) -> Result<Self, BuildError> {
        let parser_type = builder.build(spec, None)?;
        let factory = Self {
            source: Source::Deferred {
                parser_type,
                params,
            },
        };
        factory.validate_args()?;
        Ok(factory)
    }

    /// Declare a parser from a dynamic value.
    ///
    /// Accepts the mapping form `{"type": spec, param: value, ...}` or a bare
    /// spec (a name or a list).
    pub fn from_value(value: &Value, registry: &Registry) -> Result<Self, BuildError> {
        let builder = ParserBuilder::new(registry);
        match value {
            Value::Object(obj) => {
                let spec = obj.get(TYPE_KEY).ok_or_else(|| {
                    BuildError::InvalidSpec(format!("missing '{}' key in parser mapping", TYPE_KEY))
                })?;
                let spec = SpecItem::from_value(spec)?;
                let params: Params = obj
                    .iter()
                    .filter(|(key, _)| key.as_str() != TYPE_KEY)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Self::new_with(&builder, spec, params)
            }
            other => Self::new_with(&builder, SpecItem::from_value(other)?, Params::new()),
        }
    }

    /// Wrap an already validated config of `parser_type`.
    pub fn from_config(parser_type: &ParserType, config: Config) -> Result<Self, BuildError> {
        // Same acceptance rule as the parser itself.
        Parser::with_config(parser_type, config.clone())?;
        Ok(Self {
            source: Source::Config {
                parser_type: parser_type.clone(),
                config,
            },
        })
    }

    /// The parser type this factory builds.
    pub fn parser_type(&self) -> &ParserType {
        match &self.source {
            Source::Deferred { parser_type, .. } | Source::Config { parser_type, .. } => {
                parser_type
            }
            Source::Instance(parser) => parser.parser_type(),
        }
    }

    /// Check the declared parameters against the parser type's schema.
    pub fn validate_args(&self) -> Result<(), BuildError> {
        match &self.source {
            Source::Deferred {
                parser_type,
                params,
            } => parser_type.schema().check(params),
            Source::Config { .. } | Source::Instance(_) => Ok(()),
        }
    }

    /// Materialize the parser.
    ///
    /// Every call creates an independent instance, except for factories
    /// wrapping an existing parser, which is returned as is.
    pub fn build(&self, ctx: &BuildContext) -> Result<Parser, BuildError> {
        let parser = match &self.source {
            Source::Deferred {
                parser_type,
                params,
            } => parser_type.instance(params.clone())?,
            Source::Config {
                parser_type,
                config,
            } => Parser::with_config(parser_type, config.clone())?,
            Source::Instance(parser) => return Ok(parser.clone()),
        };

        let path = ctx.path();
        tracing::debug!(
            parser = parser.parser_type().name(),
            path = path.as_deref().unwrap_or(""),
            "materialized parser"
        );

        Ok(match path {
            Some(path) => parser.with_path(path),
            None => parser,
        })
    }
}

impl From<Parser> for Factory {
    fn from(parser: Parser) -> Self {
        Self {
            source: Source::Instance(parser),
        }
    }
}

impl<'de> Deserialize<'de> for Factory {
    /// Deserialize the mapping or bare-spec form, resolving names through
    /// [`Registry::global`].
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Factory::from_value(&value, Registry::global()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::schema::{Field, Schema};
    use crate::step::{Transform, func};
    use crate::value::ParamsExt;
    use std::sync::Arc;

    struct Cap;

    impl Transform for Cap {
        fn name(&self) -> &str {
            "Cap"
        }

        fn schema(&self) -> Option<Arc<Schema>> {
            Some(Arc::new(
                Schema::new("Cap").field(Field::float("max").default(f64::INFINITY)),
            ))
        }

        fn apply(&self, value: Value, config: &crate::schema::Config) -> Result<Value, ParseError> {
            let n = value
                .as_f64()
                .ok_or_else(|| ParseError::invalid_type("expected a number"))?;
            Ok(Value::Float(n.min(config.get_f64("max").unwrap_or(f64::INFINITY))))
        }
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.register_transform(Cap);
        registry.register_function(func("float", |v| match v {
            Value::String(s) => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| ParseError::invalid_value(e.to_string())),
            other => other
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| ParseError::invalid_type("expected a number")),
        }));
        registry
    }

    #[test]
    fn test_context_path() {
        assert_eq!(BuildContext::new().path(), None);
        assert_eq!(BuildContext::new().with_name("p").path().as_deref(), Some("p"));

        let ctx = BuildContext::new().with_parent("settings").with_name("parser");
        assert_eq!(ctx.path().as_deref(), Some("settings.parser"));
        assert_eq!(ctx.child("inner").path().as_deref(), Some("settings.parser.inner"));
    }

    #[test]
    fn test_mapping_form() {
        let registry = registry();
        let value: Value =
            serde_json::from_str(r#"{"type": ["float", "Cap"], "max": 10}"#).unwrap();
        let factory = Factory::from_value(&value, &registry).unwrap();

        let parser = factory
            .build(&BuildContext::new().with_parent("s").with_name("parser"))
            .unwrap();
        assert_eq!(parser.path(), Some("s.parser"));
        assert_eq!(parser.parse("11").unwrap(), Value::Float(10.0));
        assert_eq!(parser.parse("1").unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_bare_spec_form() {
        let registry = registry();
        let factory = Factory::from_value(&Value::from("Cap"), &registry).unwrap();
        let parser = factory.build(&BuildContext::new()).unwrap();
        assert_eq!(parser.path(), None);
        assert_eq!(parser.parse(1e99).unwrap(), Value::Float(1e99));
    }

    #[test]
    fn test_declaration_checks_params() {
        let registry = registry();
        let value: Value =
            serde_json::from_str(r#"{"type": "Cap", "max": 1, "extra_arg": null}"#).unwrap();
        let err = Factory::from_value(&value, &registry).unwrap_err();
        assert!(matches!(err, BuildError::UnknownParameter { parameter, .. } if parameter == "extra_arg"));

        let value: Value = serde_json::from_str(r#"{"type": "Unknown"}"#).unwrap();
        let err = Factory::from_value(&value, &registry).unwrap_err();
        assert_eq!(err, BuildError::UnknownName("Unknown".into()));

        let value: Value = serde_json::from_str(r#"{"max": 1}"#).unwrap();
        let err = Factory::from_value(&value, &registry).unwrap_err();
        assert!(matches!(err, BuildError::InvalidSpec(_)));

        let err = Factory::from_value(&Value::Bool(true), &registry).unwrap_err();
        assert!(matches!(err, BuildError::InvalidSpec(_)));
    }

    #[test]
    fn test_builds_independent_instances() {
        let registry = registry();
        let factory = Factory::new_with(
            &ParserBuilder::new(&registry),
            "Cap",
            Params::new().with("max", 1.0),
        )
        .unwrap();

        let a = factory.build(&BuildContext::new()).unwrap();
        let b = factory.build(&BuildContext::new()).unwrap();
        assert!(!std::ptr::eq(a.config(), b.config()));
        assert_eq!(a.parse(2.0).unwrap(), b.parse(2.0).unwrap());
    }

    #[test]
    fn test_config_and_instance_pass_through() {
        let t = ParserType::from_transform(Cap);
        let config = t.config(Params::new().with("max", 1.0)).unwrap();
        let factory = Factory::from_config(&t, config).unwrap();
        assert!(factory.parser_type().ptr_eq(&t));
        assert_eq!(
            factory.build(&BuildContext::new()).unwrap().parse(2.0).unwrap(),
            Value::Float(1.0)
        );

        let parser = t.instance(Params::new().with("max", 5.0)).unwrap();
        let factory = Factory::from(parser.clone());
        let built = factory.build(&BuildContext::new().with_name("ignored")).unwrap();
        assert!(std::ptr::eq(built.config(), parser.config()));
        assert_eq!(built.path(), None);
    }
}
