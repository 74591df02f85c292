//! # colspec
//!
//! Schema-aware, streaming CSV reading and writing.
//!
//! ## What is a schema spec?
//!
//! A schema spec is a compact, single-line description of a table's columns:
//!
//! ```text
//! Id:int,Name,Amount:decimal?,Created:DateTime{%Y-%m-%d}
//! ```
//!
//! Each column has a name, an optional type with a size, a `?` for nullable and a
//! `{format}` used when values are read and written. Series columns (`Jan*`, `Feb*`)
//! group repeated measurements under one header pattern. See [`spec`] for the grammar.
//!
//! ## Key Features
//!
//! - **Round-trippable schemas**: [`parse_schema`] and [`schema_to_string`] are inverse
//!   operations
//! - **Streaming**: [`CsvReader`] and [`CsvWriter`] work through bounded buffers, and a
//!   field spanning many refills is reconstructed exactly
//! - **Typed fields**: integers, floats, decimals, dates with and without offsets,
//!   GUIDs and binary (Base64 or hex) as [`FieldValue`]s
//! - **Culture aware**: number literals follow a [`Culture`]'s decimal separator
//! - **Two quoting styles**: RFC 4180 quoting or escape characters with comment lines
//!
//! ## Quick Start
//!
//! ```rust
//! use colspec::{parse_schema, CsvOptions, CsvReader, FieldValue};
//!
//! let schema = parse_schema("Id:int,Name,Score:double?").unwrap();
//! let data = "Id,Name,Score\n1,Ann,9.5\n2,Bob,\n";
//!
//! let mut reader = CsvReader::with_schema(data.as_bytes(), CsvOptions::new(), schema).unwrap();
//! let mut scores = Vec::new();
//! while reader.read().unwrap() {
//!     scores.push(reader.get_value(2).unwrap());
//! }
//! assert_eq!(scores, vec![FieldValue::Double(9.5), FieldValue::Null]);
//! ```
//!
//! ### Writing
//!
//! ```rust
//! use colspec::{to_csv_string, CsvOptions, FieldValue, RecordSet};
//!
//! let mut set = RecordSet::new(vec!["Text".to_string()]);
//! set.push(vec![FieldValue::from("Test, 1")]);
//!
//! let csv = to_csv_string(&mut set, CsvOptions::new(), None).unwrap();
//! assert_eq!(csv, "Text\n\"Test, 1\"\n");
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: header records and comment lines at `debug`,
//! buffer refills and flushes at `trace`. Install any subscriber to see them.
//!
//! ## Demos
//!
//! See the `demos/` directory:
//!
//! - **`schema_spec.rs`** - Parsing, inspecting and re-serializing schemas
//! - **`csv_roundtrip.rs`** - Typed reading and writing with a schema
//! - **`culture_options.rs`** - Cultures, escaped style and binary encodings
//!
//! Run any demo with: `cargo run --example <name>`

pub mod culture;
pub mod error;
pub mod options;
pub mod reader;
pub mod record;
pub mod schema;
pub mod spec;
pub mod types;
pub mod value;
pub mod writer;

pub use culture::Culture;
pub use error::{Error, Result};
pub use options::{BinaryEncoding, CsvOptions, QuoteStyle};
pub use reader::CsvReader;
pub use record::{RecordSet, RecordSource};
pub use schema::{Column, ColumnBuilder, ColumnMap, ColumnSize, Schema, SchemaBuilder, SeriesGroup};
pub use spec::{ColumnSpec, TypeSpec};
pub use types::DataType;
pub use value::FieldValue;
pub use writer::CsvWriter;

/// Parses a schema spec string.
///
/// # Examples
///
/// ```rust
/// use colspec::{parse_schema, DataType};
///
/// let schema = parse_schema("Id:int,Name:string[50]?").unwrap();
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema[0].data_type(), DataType::Int32);
/// assert!(schema[1].is_nullable());
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidSpec`] naming the offending column.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_schema(spec: &str) -> Result<Schema> {
    spec::parse(spec)
}

/// Writes a schema back to its spec form, one column per line when `multi_line` is set.
///
/// ```rust
/// use colspec::{parse_schema, schema_to_string};
///
/// let text = "Id:int,Amount:decimal?";
/// assert_eq!(schema_to_string(&parse_schema(text).unwrap(), false), text);
/// ```
#[must_use]
pub fn schema_to_string(schema: &Schema, multi_line: bool) -> String {
    spec::serialize(schema, multi_line)
}

/// Reads all records of `text` into memory, typed by `schema` when given.
///
/// # Errors
///
/// Fails on invalid options and on fields that do not parse as their column type.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn read_all(text: &str, options: CsvOptions, schema: Option<Schema>) -> Result<RecordSet> {
    let mut reader = match schema {
        Some(schema) => CsvReader::with_schema(text.as_bytes(), options, schema)?,
        None => CsvReader::new(text.as_bytes(), options)?,
    };
    RecordSet::read_from(&mut reader)
}

/// Writes every record of `source` to a string, with column formats from `schema`.
///
/// # Errors
///
/// Fails on invalid options or when the source fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_csv_string<S: RecordSource + ?Sized>(
    source: &mut S,
    options: CsvOptions,
    schema: Option<Schema>,
) -> Result<String> {
    let mut writer = match schema {
        Some(schema) => CsvWriter::with_schema(Vec::new(), options, schema)?,
        None => CsvWriter::new(Vec::new(), options)?,
    };
    writer.write_all(source)?;
    let bytes = writer.into_inner()?;
    String::from_utf8(bytes).map_err(Error::invalid_state)
}
