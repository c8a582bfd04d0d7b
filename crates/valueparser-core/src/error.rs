//! Error types.
//!
//! Construction-time problems ([`BuildError`]: a misconfigured pipeline) are
//! kept apart from parse-time problems ([`ParseError`]: a rejected input).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable codes carried by [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Value lies outside configured bounds.
    OutOfBound,
    /// Value is not one of the accepted items.
    NotListed,
    /// Value has the right type but cannot be interpreted.
    InvalidValue,
    /// Value has a type the step cannot handle.
    InvalidType,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OutOfBound => "out_of_bound",
            ErrorCode::NotListed => "not_listed",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidType => "invalid_type",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value was rejected by a transform step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: ErrorCode,
    pub message: String,
}

impl ParseError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn out_of_bound(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OutOfBound, message)
    }

    pub fn not_listed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotListed, message)
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidValue, message)
    }

    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidType, message)
    }
}

/// Errors raised while building parser types, instances or factories.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("invalid parser spec: {0}")]
    InvalidSpec(String),

    #[error("unknown parser name: {0}")]
    UnknownName(String),

    #[error("unknown parameter '{parameter}' for {schema}")]
    UnknownParameter { schema: String, parameter: String },

    #[error("missing required parameter '{parameter}' for {schema}")]
    MissingParameter { schema: String, parameter: String },

    #[error("invalid value for parameter '{parameter}': expected {expected}, got {found}")]
    InvalidParameter {
        parameter: String,
        expected: String,
        found: String,
    },

    #[error("conflicting definitions of parameter '{parameter}' in {first} and {second}")]
    SchemaConflict {
        parameter: String,
        first: String,
        second: String,
    },

    #[error("a {found} configuration cannot configure parser {parser}")]
    ConfigMismatch { parser: String, found: String },
}
