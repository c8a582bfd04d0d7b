//! printf-style formatting.

use crate::convert::checked_i64;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;
use valueparser_core::{Config, Field, ParseError, Schema, Transform, Value};

/// Format the value into a string with a printf-style `format`.
///
/// Supported conversions are `%s`, `%d`/`%i`, `%f`/`%F` and the literal
/// `%%`, with optional `-`/`0` flags, width and precision. The format must
/// hold exactly one conversion.
pub struct Formatted {
    schema: Arc<Schema>,
}

impl Formatted {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(
                Schema::new("Formatted").field(
                    Field::str("format")
                        .default("%s")
                        .description("printf-style format with one conversion"),
                ),
            ),
        }
    }
}

impl Default for Formatted {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Formatted {
    fn name(&self) -> &str {
        "Formatted"
    }

    fn schema(&self) -> Option<Arc<Schema>> {
        Some(self.schema.clone())
    }

    fn apply(&self, value: Value, config: &Config) -> Result<Value, ParseError> {
        let format = config.get_str("format").unwrap_or("%s");
        render(format, &value).map(Value::String)
    }
}

struct Conversion {
    left: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
    kind: char,
}

fn digits(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    n
}

fn conversion(chars: &mut Peekable<Chars<'_>>) -> Result<Conversion, ParseError> {
    let (mut left, mut zero) = (false, false);
    while let Some(&flag) = chars.peek() {
        match flag {
            '-' => left = true,
            '0' => zero = true,
            _ => break,
        }
        chars.next();
    }
    let width = digits(chars).unwrap_or(0);
    let precision = if chars.peek() == Some(&'.') {
        chars.next();
        Some(digits(chars).unwrap_or(0))
    } else {
        None
    };
    let kind = chars
        .next()
        .ok_or_else(|| ParseError::invalid_value("incomplete format"))?;
    Ok(Conversion {
        left,
        zero,
        width,
        precision,
        kind,
    })
}

fn number_for(value: &Value, kind: char) -> Result<f64, ParseError> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64().ok_or_else(|| {
            ParseError::invalid_type(format!(
                "%{} format: a number is required, not {}",
                kind,
                other.type_name()
            ))
        }),
    }
}

fn body(conv: &Conversion, value: &Value) -> Result<String, ParseError> {
    match conv.kind {
        's' => {
            let s = value.to_string();
            Ok(match conv.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            })
        }
        'd' | 'i' => Ok(match value {
            Value::Int(n) => n.to_string(),
            other => checked_i64(number_for(other, conv.kind)?.trunc())?.to_string(),
        }),
        'f' | 'F' => {
            let n = number_for(value, conv.kind)?;
            Ok(format!("{:.*}", conv.precision.unwrap_or(6), n))
        }
        other => Err(ParseError::invalid_value(format!(
            "unsupported format character {:?}",
            other
        ))),
    }
}

fn pad(out: &mut String, body: &str, conv: &Conversion) {
    let len = body.chars().count();
    if len >= conv.width {
        out.push_str(body);
        return;
    }
    let fill = conv.width - len;
    if conv.left {
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if conv.zero && conv.kind != 's' {
        let digits = match body.strip_prefix('-') {
            Some(rest) => {
                out.push('-');
                rest
            }
            None => body,
        };
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(body);
    }
}

fn render(format: &str, value: &Value) -> Result<String, ParseError> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut converted = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        let conv = conversion(&mut chars)?;
        if converted {
            return Err(ParseError::invalid_value(
                "not enough arguments for format string",
            ));
        }
        converted = true;
        pad(&mut out, &body(&conv, value)?, &conv);
    }

    if !converted {
        return Err(ParseError::invalid_value(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(out)
}
