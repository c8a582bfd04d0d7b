//! Pipeline documents: named parser declarations loaded from files.
//!
//! ```yaml
//! parsers:
//!   percent:
//!     type: [float, Clipped]
//!     min: 0
//!     max: 100
//!   level: Int
//! ```
//!
//! Each entry is a [`Factory`] in mapping or bare-spec form.

use crate::error::BuildError;
use crate::factory::{BuildContext, Factory};
use crate::parser::Parser;
use crate::registry::Registry;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Deserialize;

/// On-disk shape, before names are resolved.
#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    parsers: IndexMap<String, Value>,
}

/// A set of named parser factories.
#[derive(Debug, Clone, Default)]
pub struct PipelineDocument {
    parsers: IndexMap<String, Factory>,
}

impl PipelineDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named factory.
    pub fn parser(mut self, name: impl Into<String>, factory: Factory) -> Self {
        self.parsers.insert(name.into(), factory);
        self
    }

    /// Parse a document from bytes, detecting the format from `path`.
    ///
    /// Names are resolved through [`Registry::global`].
    pub fn from_bytes(data: &[u8], path: Option<&str>) -> Result<Self, DocumentError> {
        let format = path
            .and_then(detect_format)
            .unwrap_or_else(|| "yaml".to_string());

        Self::from_bytes_format(data, &format, Registry::global())
    }

    /// Parse a document from bytes with explicit format.
    pub fn from_bytes_format(
        data: &[u8],
        format: &str,
        registry: &Registry,
    ) -> Result<Self, DocumentError> {
        let raw: RawDocument = match format {
            "json" => serde_json::from_slice(data).map_err(|e| DocumentError::Parse(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_slice(data).map_err(|e| DocumentError::Parse(e.to_string()))?
            }
            "toml" => {
                let s = std::str::from_utf8(data)
                    .map_err(|e| DocumentError::Parse(format!("Invalid UTF-8: {}", e)))?;
                toml::from_str(s).map_err(|e| DocumentError::Parse(e.to_string()))?
            }
            _ => {
                return Err(DocumentError::Parse(format!(
                    "Unsupported document format: {}",
                    format
                )));
            }
        };

        let mut parsers = IndexMap::with_capacity(raw.parsers.len());
        for (name, value) in raw.parsers {
            let factory = Factory::from_value(&value, registry).map_err(|source| {
                DocumentError::Build {
                    name: name.clone(),
                    source,
                }
            })?;
            parsers.insert(name, factory);
        }
        Ok(Self { parsers })
    }

    pub fn get(&self, name: &str) -> Option<&Factory> {
        self.parsers.get(name)
    }

    /// Declared parser names, in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Materialize one parser, named after its key under `parent`.
    pub fn build(&self, name: &str, parent: &BuildContext) -> Result<Parser, DocumentError> {
        let factory = self
            .get(name)
            .ok_or_else(|| DocumentError::UnknownParser(name.to_string()))?;
        factory
            .build(&parent.child(name))
            .map_err(|source| DocumentError::Build {
                name: name.to_string(),
                source,
            })
    }

    /// Materialize every parser, in document order.
    pub fn build_all(&self, parent: &BuildContext) -> Result<IndexMap<String, Parser>, DocumentError> {
        self.names()
            .map(|name| Ok((name.to_string(), self.build(name, parent)?)))
            .collect()
    }
}

/// Errors related to pipeline documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("no parser named '{0}' in document")]
    UnknownParser(String),

    #[error("parser '{name}': {source}")]
    Build {
        name: String,
        #[source]
        source: BuildError,
    },
}

/// Detect format from file path extension.
fn detect_format(path: &str) -> Option<String> {
    let ext = path.rsplit('.').next()?;
    match ext.to_lowercase().as_str() {
        "json" => Some("json".into()),
        "yaml" | "yml" => Some("yaml".into()),
        "toml" => Some("toml".into()),
        _ => None,
    }
}
