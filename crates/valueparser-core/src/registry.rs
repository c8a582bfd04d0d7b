//! Registry of named parser types.

use crate::error::BuildError;
use crate::parser::ParserType;
use crate::step::{Function, Transform};
use indexmap::IndexMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Name → parser type table.
///
/// Names let specs refer to parser types indirectly, including from
/// configuration files (`type = "Clipped"`). Registering a name again replaces
/// the previous entry. Entries are never evicted.
///
/// A registry is normally passed explicitly; [`Registry::global`] is the
/// process-wide instance used by the convenience functions.
#[derive(Default)]
pub struct Registry {
    parsers: RwLock<IndexMap<String, ParserType>>,
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        let parsers = self
            .parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            parsers: RwLock::new(parsers),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Register a parser type under a name, replacing any previous entry.
    pub fn register(&self, name: impl Into<String>, parser_type: ParserType) {
        let name = name.into();
        tracing::debug!(name = %name, parser = parser_type.name(), "registering parser type");
        self.parsers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, parser_type);
    }

    /// Register a transform as a one-step parser type under its own name.
    pub fn register_transform(&self, transform: impl Transform + 'static) -> ParserType {
        let name = transform.name().to_string();
        let parser_type = ParserType::from_transform(transform);
        self.register(name, parser_type.clone());
        parser_type
    }

    /// Register a function as a one-step parser type under its own name.
    pub fn register_function(&self, function: Function) -> ParserType {
        let name = function.name().to_string();
        let parser_type = ParserType::from_function(function);
        self.register(name, parser_type.clone());
        parser_type
    }

    /// Look up a parser type by name.
    pub fn get(&self, name: &str) -> Option<ParserType> {
        self.parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Look up a parser type by name, failing if it is not registered.
    pub fn resolve(&self, name: &str) -> Result<ParserType, BuildError> {
        self.get(name)
            .ok_or_else(|| BuildError::UnknownName(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
