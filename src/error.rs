//! Error types for schema specs and the CSV codec.
//!
//! This module provides the single [`Error`] type shared by the spec parser,
//! the reader and the writer.
//!
//! ## Error Categories
//!
//! - **Spec Errors**: a column spec does not match the grammar, or names an unknown type
//! - **Column Errors**: a column built in code cannot be expressed as a spec string
//! - **Field Format Errors**: a typed accessor was applied to text that cannot be coerced
//! - **State Errors**: API misuse, such as reading a field before advancing to a record
//! - **Binding Errors**: required schema columns left unmatched by a header row
//! - **I/O Errors**: failures of the underlying stream, passed through untouched
//!
//! Spec parsing is all-or-nothing: either the whole spec parses or the call fails and
//! no partial [`Schema`](crate::Schema) is produced. Codec errors are scoped to a single
//! field; the reader stays positioned on the current record so the caller can skip it
//! and keep reading.
//!
//! ## Examples
//!
//! ```rust
//! use colspec::{parse_schema, Error};
//!
//! let result = parse_schema("id:int,name:nosuchtype");
//! assert!(matches!(result, Err(Error::InvalidSpec { column: 1, .. })));
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A column spec failed to match the grammar or named an unknown type
    #[error("Invalid schema spec at column {column} ({text:?}): {msg}")]
    InvalidSpec {
        column: usize,
        text: String,
        msg: String,
    },

    /// A column built in code could not be expressed as a spec
    #[error("Invalid column {name:?}: {msg}")]
    InvalidColumn { name: String, msg: String },

    /// A field's raw text could not be coerced to the requested type
    #[error("Invalid field in column {ordinal} of record {record}: cannot read {raw:?} as {expected}")]
    FieldFormat {
        ordinal: usize,
        record: u64,
        raw: String,
        expected: String,
    },

    /// The API was used out of order
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Required schema columns were not bound to any header
    #[error("Unbound schema columns: {}", .0.join(", "))]
    UnboundMember(Vec<String>),

    /// The codec configuration is inconsistent
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl Error {
    /// Creates a spec error for the column spec at `column` (0-based).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colspec::Error;
    ///
    /// let err = Error::invalid_spec(2, "a:int[x]", "size must be a decimal integer");
    /// assert!(err.to_string().contains("column 2"));
    /// ```
    pub fn invalid_spec(column: usize, text: &str, msg: impl fmt::Display) -> Self {
        Error::InvalidSpec {
            column,
            text: text.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates an error for a column rejected by [`ColumnBuilder::build`](crate::ColumnBuilder::build).
    pub fn invalid_column(name: &str, msg: impl fmt::Display) -> Self {
        Error::InvalidColumn {
            name: name.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a field format error for the field at `ordinal` in the 1-based `record`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use colspec::Error;
    ///
    /// let err = Error::field_format(3, 7, "12x", "Int32");
    /// assert!(err.to_string().contains("\"12x\""));
    /// ```
    pub fn field_format(ordinal: usize, record: u64, raw: &str, expected: &str) -> Self {
        Error::FieldFormat {
            ordinal,
            record,
            raw: raw.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(msg: impl fmt::Display) -> Self {
        Error::InvalidState(msg.to_string())
    }

    /// Creates an invalid options error.
    pub fn invalid_options(msg: impl fmt::Display) -> Self {
        Error::InvalidOptions(msg.to_string())
    }

    /// Returns the column ordinal a field format error refers to.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            Error::FieldFormat { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
