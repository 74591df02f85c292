//! Schema spec strings.
//!
//! A spec string is the compact, hand-writable form of a [`Schema`]: a comma-separated
//! list of column specs, each of the form
//!
//! ```text
//! colSpec := (baseName '>')? name? (':' type ('[' size ']')? '?'? ('{' format '}')?)?
//! ```
//!
//! | Part | Meaning | Example |
//! |------|---------|---------|
//! | `baseName>` | Source column name, or the header format of a series | `CustomerId>Id` |
//! | `name` | Column name; a trailing `*` makes it a series column | `Values*` |
//! | `:type` | Canonical or shorthand type name, case-insensitive | `:int`, `:DateTime` |
//! | `[size]` | Length limit for strings and binary, `*` for explicitly unbounded | `[32]` |
//! | `?` | Nullable | `:int?` |
//! | `{format}` | Read/write format pattern | `{%Y%m%d}` |
//!
//! A column without a type suffix is a non-nullable string of unbounded size. Line
//! breaks anywhere in the spec are ignored, so long specs can be wrapped by hand.
//! Commas always separate columns and cannot be escaped.
//!
//! ## Series columns
//!
//! `{Date}>Values*:int` declares a series column named `Values` whose header format is
//! `{Date}`; the `{Date}` placeholder also types the series keys. Columns sharing a
//! header format form one series group, numbered 0, 1, 2, ... in schema order.
//!
//! ## Examples
//!
//! ```rust
//! use colspec::{parse_schema, schema_to_string, DataType};
//!
//! let schema = parse_schema("Id:int,Name,Amount:decimal?,Created:DateTime{%Y%m%d}").unwrap();
//! assert_eq!(schema[0].data_type(), DataType::Int32);
//! assert!(schema[2].is_nullable());
//! assert_eq!(schema[3].format(), Some("%Y%m%d"));
//!
//! assert_eq!(
//!     schema_to_string(&schema, false),
//!     "Id:int,Name,Amount:decimal?,Created:DateTime{%Y%m%d}"
//! );
//! ```

use crate::{Column, ColumnSize, DataType, Error, Result, Schema, SchemaBuilder};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Marks a series column when it ends a column name.
pub const SERIES_MARKER: char = '*';

/// The syntax of one column spec, before type resolution.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ColumnSpec<'a> {
    pub base_name: Option<&'a str>,
    pub name: Option<&'a str>,
    pub type_spec: Option<TypeSpec<'a>>,
}

/// The `:type[size]?{format}` suffix of a column spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSpec<'a> {
    pub type_name: &'a str,
    pub size: Option<ColumnSize>,
    pub nullable: bool,
    pub format: Option<&'a str>,
}

struct Scanner<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.position += ch.len_utf8();
        }
        &self.input[start..self.position]
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

impl<'a> ColumnSpec<'a> {
    /// Scans a single column spec. Surrounding whitespace is ignored, and an empty
    /// input yields an anonymous column.
    pub fn scan(text: &'a str) -> std::result::Result<Self, String> {
        let text = text.trim();
        // The base name can only appear before the type separator.
        let head_len = text.find(':').unwrap_or(text.len());
        let (base_name, name_start) = match text[..head_len].find('>') {
            Some(gt) => (non_empty(&text[..gt]), gt + 1),
            None => (None, 0),
        };
        let name = non_empty(&text[name_start..head_len]);

        if head_len == text.len() {
            return Ok(ColumnSpec {
                base_name,
                name,
                type_spec: None,
            });
        }

        let mut scanner = Scanner {
            input: text,
            position: head_len + 1,
        };
        let type_name = scanner.take_while(|c| c.is_ascii_alphanumeric());
        if type_name.is_empty() {
            return Err("expected a type name after ':'".to_string());
        }

        let size = if scanner.eat('[') {
            let size = if scanner.eat('*') {
                ColumnSize::Unbounded
            } else {
                let digits = scanner.take_while(|c| c.is_ascii_digit());
                match digits.parse::<u32>() {
                    Ok(0) => return Err("size must be positive".to_string()),
                    Ok(n) => ColumnSize::Bounded(n),
                    Err(_) => {
                        return Err(format!("invalid size '{}'", digits));
                    }
                }
            };
            if !scanner.eat(']') {
                return Err("expected ']' after size".to_string());
            }
            Some(size)
        } else {
            None
        };

        let nullable = scanner.eat('?');

        let format = if scanner.eat('{') {
            let format = scanner.take_while(|c| c != '}');
            if !scanner.eat('}') {
                return Err("unterminated format, expected '}'".to_string());
            }
            (!format.is_empty()).then_some(format)
        } else {
            None
        };

        if !scanner.at_end() {
            return Err(format!(
                "unexpected '{}' after type",
                &text[scanner.position..]
            ));
        }

        Ok(ColumnSpec {
            base_name,
            name,
            type_spec: Some(TypeSpec {
                type_name,
                size,
                nullable,
                format,
            }),
        })
    }

    /// Resolves the spec into a column.
    pub fn to_column(&self) -> std::result::Result<Column, String> {
        let (data_type, size, nullable, format) = match &self.type_spec {
            Some(t) => {
                let data_type = DataType::resolve(t.type_name)
                    .ok_or_else(|| format!("unknown type '{}'", t.type_name))?;
                (data_type, t.size, t.nullable, t.format)
            }
            None => (DataType::String, None, false, None),
        };

        let name = self.name.unwrap_or_default();
        let mut builder = match name.strip_suffix(SERIES_MARKER) {
            Some(series_name) => {
                let mut builder = Column::series(series_name.trim_end());
                if let Some(header_format) = self.base_name {
                    builder = builder.header_format(header_format);
                }
                builder
            }
            None => {
                let mut builder = Column::builder(name);
                if let Some(base_name) = self.base_name {
                    builder = builder.base_name(base_name);
                }
                builder
            }
        };

        builder = builder.data_type(data_type).nullable(nullable);
        if let Some(size) = size {
            builder = builder.size(size);
        }
        if let Some(format) = format {
            builder = builder.format(format);
        }
        builder.finish()
    }
}

/// Parses a spec string into a schema.
///
/// # Errors
///
/// Returns [`Error::InvalidSpec`] naming the first column spec that does not match the
/// grammar or names an unknown type. No partial schema is returned.
pub fn parse(spec: &str) -> Result<Schema> {
    let spec: String = spec.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    let mut builder = SchemaBuilder::new();
    for (index, text) in spec.split(',').enumerate() {
        let column = ColumnSpec::scan(text)
            .and_then(|c| c.to_column())
            .map_err(|msg| Error::invalid_spec(index, text, msg))?;
        builder.push(column);
    }
    let schema = builder.build();
    debug!(columns = schema.len(), "parsed schema spec");
    Ok(schema)
}

/// Serializes a schema into a spec string. With `multi_line`, every separating comma
/// is followed by a line break.
pub fn serialize(schema: &Schema, multi_line: bool) -> String {
    let separator = if multi_line { ",\n" } else { "," };
    let mut output = String::with_capacity(schema.len() * 16);
    for (i, column) in schema.iter().enumerate() {
        if i > 0 {
            output.push_str(separator);
        }
        write_column(&mut output, column);
    }
    output
}

fn write_column(output: &mut String, column: &Column) {
    if column.is_series() {
        if let Some(header_format) = column.series_header_format() {
            output.push_str(header_format);
            output.push('>');
        }
        output.push_str(column.series_name().unwrap_or_default());
        output.push(SERIES_MARKER);
    } else {
        if let Some(base_name) = column.base_name() {
            if base_name != column.name() {
                output.push_str(base_name);
                output.push('>');
            }
        }
        output.push_str(column.name());
    }
    write_type(output, column);
}

fn write_type(output: &mut String, column: &Column) {
    let data_type = column.data_type();
    if data_type == DataType::String
        && !column.is_nullable()
        && column.size().is_none()
        && column.format().is_none()
    {
        return;
    }

    output.push(':');
    output.push_str(data_type.spec_name());
    if data_type.is_length_bearing() {
        match column.size() {
            Some(ColumnSize::Bounded(n)) => {
                output.push('[');
                output.push_str(&n.to_string());
                output.push(']');
            }
            Some(ColumnSize::Unbounded) => output.push_str("[*]"),
            None => {}
        }
    }
    if column.is_nullable() {
        output.push('?');
    }
    if let Some(format) = column.format() {
        output.push('{');
        output.push_str(format);
        output.push('}');
    }
}

impl FromStr for Schema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self, false))
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&serialize(self, false))
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let spec = String::deserialize(deserializer)?;
        parse(&spec).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_full_column() {
        let spec = ColumnSpec::scan("Src>Dst:string[20]?{upper}").unwrap();
        assert_eq!(spec.base_name, Some("Src"));
        assert_eq!(spec.name, Some("Dst"));
        assert_eq!(
            spec.type_spec,
            Some(TypeSpec {
                type_name: "string",
                size: Some(ColumnSize::Bounded(20)),
                nullable: true,
                format: Some("upper"),
            })
        );
    }

    #[test]
    fn test_scan_empty_is_anonymous() {
        assert_eq!(ColumnSpec::scan("").unwrap(), ColumnSpec::default());
        assert_eq!(ColumnSpec::scan("   ").unwrap(), ColumnSpec::default());
    }

    #[test]
    fn test_scan_rejects_bad_suffix() {
        assert!(ColumnSpec::scan("a:").is_err());
        assert!(ColumnSpec::scan("a:int[").is_err());
        assert!(ColumnSpec::scan("a:int[x]").is_err());
        assert!(ColumnSpec::scan("a:int[0]").is_err());
        assert!(ColumnSpec::scan("a:int{fmt").is_err());
        assert!(ColumnSpec::scan("a:int?x").is_err());
        assert!(ColumnSpec::scan("a:in t").is_err());
    }

    #[test]
    fn test_type_suffix_order() {
        // nullable comes after size and before format
        assert!(ColumnSpec::scan("a:string?[3]").is_err());
        assert!(ColumnSpec::scan("a:string[3]?{x}").is_ok());
    }

    #[test]
    fn test_gt_after_colon_is_not_base_name() {
        let spec = ColumnSpec::scan("a:string{x>y}").unwrap();
        assert_eq!(spec.base_name, None);
        assert_eq!(spec.name, Some("a"));
        assert_eq!(spec.type_spec.unwrap().format, Some("x>y"));
    }

    #[test]
    fn test_default_column_omits_type() {
        let schema = parse("a,b:string,c:string?,d:string[*],e:string{x}").unwrap();
        assert_eq!(serialize(&schema, false), "a,b,c:string?,d:string[*],e:string{x}");
    }

    #[test]
    fn test_unknown_series_key_type() {
        let err = parse("a,{Nope}>v*:int").unwrap_err();
        match err {
            Error::InvalidSpec { column, .. } => assert_eq!(column, 1),
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_line_output() {
        let schema = parse("a:int,b").unwrap();
        assert_eq!(serialize(&schema, true), "a:int,\nb");
    }
}
