//! Built-in leaf transforms for valueparser.
//!
//! Conversion functions and small configurable transforms, registered by
//! name so specs and pipeline documents can refer to them:
//!
//! - `int`/`Int`, `float`/`Float`, `str`/`Str`, `bool`/`Bool` - conversions
//! - `Bounded` - reject numbers outside `[min, max]`
//! - `Clipped` - clamp numbers into `[min, max]`
//! - `Rounded` - round to `ndigits` (an integer when `ndigits` is null)
//! - `Modulo` - remainder with the sign of the divisor
//! - `Listed` - accept only `items`, or fall back to `default_item`
//! - `Enumerated` - map member names to member values
//! - `Formatted` - printf-style formatting (`%s`, `%d`, `%.2f`, ...)
//! - `Default` - replace null with `default`

mod choice;
mod convert;
mod numeric;
mod text;

pub use choice::{Enumerated, Listed};
pub use convert::{DefaultValue, to_bool, to_float, to_int, to_str};
pub use numeric::{Bounded, Clipped, Modulo, Rounded};
pub use text::Formatted;

use valueparser_core::{ParserType, Registry};

/// Register all built-in parsers with the registry.
pub fn register_all(registry: &Registry) {
    // Conversions are reachable under both spellings.
    for (lower, upper, function) in [
        ("int", "Int", to_int()),
        ("float", "Float", to_float()),
        ("str", "Str", to_str()),
        ("bool", "Bool", to_bool()),
    ] {
        let parser_type = ParserType::from_function(function);
        registry.register(lower, parser_type.clone());
        registry.register(upper, parser_type.renamed(upper));
    }

    registry.register_transform(Bounded::new());
    registry.register_transform(Clipped::new());
    registry.register_transform(Rounded::new());
    registry.register_transform(Modulo::new());
    registry.register_transform(Listed::new());
    registry.register_transform(Enumerated::new());
    registry.register_transform(Formatted::new());
    registry.register_transform(DefaultValue::new());

    tracing::debug!(count = registry.len(), "registered built-in parsers");
}

/// A new registry holding the built-in parsers.
pub fn registry() -> Registry {
    let registry = Registry::new();
    register_all(&registry);
    registry
}

/// Register the built-in parsers with [`Registry::global`].
pub fn install() {
    register_all(Registry::global());
}
