//! valueparser: composable value-parser pipelines
//!
//! Parsers are assembled from functions, configurable transforms, existing
//! parser types or instances, registered names, and lists of all of these.
//! The result is one parser type with one merged parameter schema, usable
//! directly, through a deferred [`Factory`], or as a [`Parsed`] field type.

mod document;
mod error;
mod factory;
mod field;
mod parser;
mod registry;
mod schema;
mod spec;
mod step;
mod value;

pub use document::{DocumentError, PipelineDocument};
pub use error::{BuildError, ErrorCode, ParseError};
pub use factory::{BuildContext, Factory, TYPE_KEY};
pub use field::{FieldDescriptor, FieldError, FieldValidator, Parsed};
pub use parser::{Parser, ParserBuilder, ParserType, parser, parser_type};
pub use registry::Registry;
pub use schema::{CollisionPolicy, Config, Field, FieldKind, Schema};
pub use spec::SpecItem;
pub use step::{Function, ParseFn, Transform, func};
pub use value::{Params, ParamsExt, Value};
