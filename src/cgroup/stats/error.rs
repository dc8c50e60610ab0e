//! Defines structured error types for parsing cgroup statistics.
//!
//! This module provides the [`StatParseError`] enum, which encapsulates detailed
//! error reporting for parsing failures encountered while processing cgroup items.
//!
//! # Error Types
//!
//! - [`StatParseError::InvalidValue`]: A single numeric value (e.g., `memory.usage_in_bytes`) failed to parse.
//! - [`StatParseError::InvalidKeyValue`]: A known key carried a value that is not a number.
//! - [`StatParseError::MissingValue`]: A known key was not followed by any value.
//! - [`StatParseError::DuplicateField`]: A duplicate field was found where disallowed.
//! - [`StatParseError::Io`]: Wraps underlying I/O errors during reads.
//!
//! # Example
//!
//! ```rust
//! use lxc_stats::cgroup::stats::StatParseError;
//!
//! fn parse_line(val: &str) -> Result<u64, StatParseError> {
//!     val.parse::<u64>().map_err(|e| StatParseError::InvalidValue {
//!         value: val.to_string(),
//!         line: 1,
//!         source: e,
//!     })
//! }
//!
//! parse_line("not-a-number").unwrap_err();
//! ```

use std::num::ParseIntError;

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

    #[error("missing value for '{key}' at line {line}")]
    MissingValue { key: String, line: usize },

    #[error("invalid value at line {line}: '{value}': {source}")]
    InvalidValue {
        value: String,
        line: usize,
        #[source]
        source: ParseIntError,
    },

    #[error("error during I/O: {0}")]
    Io(#[from] std::io::Error),
}
