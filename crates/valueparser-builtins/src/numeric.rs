//! Numeric transforms: bounds, clipping, rounding, modulo.

use crate::convert::checked_i64;
use std::sync::Arc;
use valueparser_core::{Config, Field, ParseError, Schema, Transform, Value};

fn number(value: &Value) -> Result<f64, ParseError> {
    value.as_f64().ok_or_else(|| {
        ParseError::invalid_type(format!("expected a number, got {} {}", value.type_name(), value))
    })
}

fn bounds_schema(name: &str) -> Arc<Schema> {
    Arc::new(
        Schema::new(name)
            .field(
                Field::float("min")
                    .default(f64::NEG_INFINITY)
                    .description("lower bound"),
            )
            .field(
                Field::float("max")
                    .default(f64::INFINITY)
                    .description("upper bound"),
            ),
    )
}

fn bounds(config: &Config) -> (f64, f64) {
    (
        config.get_f64("min").unwrap_or(f64::NEG_INFINITY),
        config.get_f64("max").unwrap_or(f64::INFINITY),
    )
}

/// Reject numbers outside `[min, max]`.
pub struct Bounded {
    schema: Arc<Schema>,
}

impl Bounded {
    pub fn new() -> Self {
        Self {
            schema: bounds_schema("Bounded"),
        }
    }
}

impl Default for Bounded {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Bounded {
    fn name(&self) -> &str {
        "Bounded"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        let n = number(&value)?;
        let (min, max) = bounds(config);
        if n < min {
            return Err(ParseError::out_of_bound(format!("{} is lower than {}", value, min)));
        }
        if n > max {
            return Err(ParseError::out_of_bound(format!("{} is higher than {}", value, max)));
        }
        Ok(value)
    }
}

/// Clamp numbers into `[min, max]`.
///
/// Values already inside the bounds are returned unchanged.
pub struct Clipped {
    schema: Arc<Schema>,
}

impl Clipped {
    pub fn new() -> Self {
        Self {
            schema: bounds_schema("Clipped"),
        }
    }
}

impl Default for Clipped {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Clipped {
    fn name(&self) -> &str {
        "Clipped"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        let n = number(&value)?;
        let (min, max) = bounds(config);
        if n < min {
            Ok(Value::Float(min))
        } else if n > max {
            Ok(Value::Float(max))
        } else {
            Ok(value)
        }
    }
}

/// Round to `ndigits` decimals, ties to even.
///
/// A null `ndigits` rounds to an integer value.
pub struct Rounded {
    schema: Arc<Schema>,
}

impl Rounded {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(
                Schema::new("Rounded").field(
                    Field::int("ndigits")
                        .nullable()
                        .default(0i64)
                        .description("decimals to keep; null for an integer"),
                ),
            ),
        }
    }
}

impl Default for Rounded {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Rounded {
    fn name(&self) -> &str {
        "Rounded"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        let n = number(&value)?;
        let Some(ndigits) = config.get_i64("ndigits") else {
            return checked_i64(n.round_ties_even()).map(Value::Int);
        };

        if ndigits >= 0 && matches!(value, Value::Int(_)) {
            return Ok(value);
        }

        let scale = 10f64.powi(ndigits.unsigned_abs().min(i32::MAX as u64) as i32);
        let rounded = if ndigits >= 0 {
            let scaled = n * scale;
            // Already exact at this many digits.
            if !scaled.is_finite() {
                return Ok(value);
            }
            scaled.round_ties_even() / scale
        } else if scale.is_infinite() {
            0f64.copysign(n)
        } else {
            (n / scale).round_ties_even() * scale
        };
        Ok(match value {
            Value::Int(_) => Value::Int(checked_i64(rounded)?),
            _ => Value::Float(rounded),
        })
    }
}

/// Remainder of the division by `modulo`, with the sign of the divisor.
pub struct Modulo {
    schema: Arc<Schema>,
}

impl Modulo {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(
                Schema::new("Modulo").field(Field::float("modulo").description("divisor")),
            ),
        }
    }
}

impl Default for Modulo {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Modulo {
    fn name(&self) -> &str {
        "Modulo"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        let n = number(&value)?;
        let modulo = config.get_f64("modulo").unwrap_or(0.0);
        if modulo == 0.0 {
            return Err(ParseError::invalid_value("modulo by zero"));
        }

        let mut r = n % modulo;
        if r != 0.0 && (r < 0.0) != (modulo < 0.0) {
            r += modulo;
        }

        Ok(match value {
            Value::Int(_) if modulo.fract() == 0.0 => Value::Int(r as i64),
            _ => Value::Float(r),
        })
    }
}
