//! Grammar errors raised while parsing control-file text.
//!
//! A [`StatParseError`] knows the offending line but not the file; the reader that opened the
//! file turns it into [`crate::Error::BadControlFile`] together with the absolute path.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatParseError {
    #[error("duplicate field '{field}' at line {line}")]
    DuplicateField { field: String, line: usize },

    #[error("invalid value for '{key}' at line {line}: '{value}': {source}")]
    InvalidKeyValue {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid value at line {line}: '{value}': {source}")]
    InvalidValue {
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid float for '{key}' at line {line}: '{value}': {source}")]
    InvalidFloat {
        key: String,
        value: String,
        line: usize,
        #[source]
        source: ParseFloatError,
    },

    #[error("non-finite float for '{key}' at line {line}: '{value}'")]
    NonFiniteFloat {
        key: String,
        value: String,
        line: usize,
    },

    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid format at line {line}: '{content}'")]
    InvalidFormat { line: usize, content: String },

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl StatParseError {
    pub(crate) fn invalid_format(line: usize, content: &str) -> Self {
        StatParseError::InvalidFormat {
            line,
            content: content.trim_end().to_string(),
        }
    }
}
