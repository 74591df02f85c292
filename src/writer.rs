//! Streaming CSV encoding.
//!
//! [`CsvWriter`] turns typed [`FieldValue`]s into delimited text, one field at a time,
//! through a bounded internal buffer that is flushed to the underlying
//! [`io::Write`] whenever it fills.
//!
//! ## Overview
//!
//! - **Quoting**: in the standard style a field is quoted exactly when it contains the
//!   delimiter, the quote character or a line break; quotes inside are doubled
//! - **Escaping**: in the escaped style each special character is prefixed with the
//!   escape character instead, including a comment marker that starts a line
//! - **Culture**: numbers use the configured culture's decimal separator, so `12.34`
//!   becomes `"12,34"` under `it-IT` with a `,` delimiter, or `12,34` with `;`
//! - **Binary**: byte arrays are written as one unbroken Base64 or hex token, encoded
//!   in chunks so large payloads never need a second full-size copy
//!
//! ```rust
//! use colspec::{CsvOptions, CsvWriter, FieldValue};
//!
//! let mut writer = CsvWriter::new(Vec::new(), CsvOptions::new()).unwrap();
//! writer.write_header(&["Text"]).unwrap();
//! writer.write_record(&[FieldValue::from("Test, 1")]).unwrap();
//! writer.write_record(&[FieldValue::from("\"test2\"")]).unwrap();
//!
//! let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
//! assert_eq!(out, "Text\n\"Test, 1\"\n\"\"\"test2\"\"\"\n");
//! ```

use crate::{
    BinaryEncoding, Column, ColumnMap, CsvOptions, Error, FieldValue, QuoteStyle, RecordSource,
    Result, Schema,
};
use base64::Engine;
use chrono::SecondsFormat;
use std::fmt::{self, Write as _};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, trace};

/// Input bytes per binary encoding chunk; a multiple of 3 so Base64 chunks concatenate
/// without padding in between.
const BINARY_CHUNK: usize = 3 * 1024;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S%.f";
const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A writer of delimited text.
///
/// Output is buffered; call [`CsvWriter::flush`] or [`CsvWriter::into_inner`] when done.
pub struct CsvWriter<W: Write> {
    inner: W,
    options: CsvOptions,
    schema: Option<Arc<Schema>>,
    /// Header-to-column binding; fields map to schema columns by ordinal without one.
    map: Option<ColumnMap>,
    buf: Vec<u8>,
    field: usize,
    header_written: bool,
    records: u64,
    text: String,
    /// The last field written ends with an escaped bare `\r`.
    trailing_cr: bool,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a writer without column hints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options do not validate.
    pub fn new(inner: W, options: CsvOptions) -> Result<Self> {
        Self::build(inner, options, None)
    }

    /// Creates a writer whose column formats come from `schema`.
    ///
    /// Fields are matched to columns by ordinal until a header is written; after that
    /// they follow the header binding, so a header in a different order from the schema
    /// still picks up each column's format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options do not validate.
    pub fn with_schema(inner: W, options: CsvOptions, schema: impl Into<Arc<Schema>>) -> Result<Self> {
        Self::build(inner, options, Some(schema.into()))
    }

    fn build(inner: W, options: CsvOptions, schema: Option<Arc<Schema>>) -> Result<Self> {
        options.validate()?;
        Ok(CsvWriter {
            inner,
            buf: Vec::with_capacity(options.buffer_size),
            options,
            schema,
            map: None,
            field: 0,
            header_written: false,
            records: 0,
            text: String::new(),
            trailing_cr: false,
        })
    }

    /// Number of records ended so far, the header included.
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Writes a header line and binds its names to the schema, if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if a header or any field was already written.
    pub fn write_header<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let map = self.schema.as_deref().map(|s| ColumnMap::bind(s, names));
        self.put_header(names, map)
    }

    /// Writes the header names of the writer's schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if there is no schema or a header or field was
    /// already written.
    pub fn write_schema_header(&mut self) -> Result<()> {
        let schema = self
            .schema
            .clone()
            .ok_or_else(|| Error::invalid_state("the writer has no schema"))?;
        self.put_header(&schema.header_names(), Some(ColumnMap::positional(&schema)))
    }

    fn put_header<S: AsRef<str>>(&mut self, names: &[S], map: Option<ColumnMap>) -> Result<()> {
        if self.header_written || self.records > 0 || self.field > 0 {
            return Err(Error::invalid_state(
                "the header must be written before any record",
            ));
        }
        for name in names {
            self.write_text(name.as_ref())?;
        }
        self.end_record()?;
        self.header_written = true;
        self.map = map;
        debug!(columns = names.len(), "wrote header record");
        Ok(())
    }

    /// Writes one raw text field, quoting or escaping it as needed.
    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.start_field()?;
        match self.options.style {
            QuoteStyle::Standard => self.put_quoted(text)?,
            QuoteStyle::Escaped => self.put_escaped(text, self.field == 0)?,
        }
        self.field += 1;
        Ok(())
    }

    /// Writes one typed field. Null writes an empty field.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and on date/time formats chrono cannot render.
    pub fn write_field(&mut self, value: &FieldValue) -> Result<()> {
        if let FieldValue::Binary(bytes) = value {
            return self.write_binary(bytes);
        }

        let schema = self.schema.clone();
        let ordinal = match &self.map {
            Some(map) => map.column_for(self.field),
            None => Some(self.field),
        };
        let format = schema
            .as_deref()
            .zip(ordinal)
            .and_then(|(s, ordinal)| s.get(ordinal))
            .and_then(Column::format);
        let mut text = std::mem::take(&mut self.text);
        text.clear();
        let culture = &self.options.culture;

        match value {
            FieldValue::Null | FieldValue::Binary(_) => {}
            FieldValue::Boolean(b) => {
                let literal = match format.and_then(|f| f.split_once('|')) {
                    Some((t, f)) => {
                        if *b {
                            t
                        } else {
                            f
                        }
                    }
                    None if *b => self.options.true_string.as_str(),
                    None => self.options.false_string.as_str(),
                };
                text.push_str(literal);
            }
            FieldValue::Byte(v) => text.push_str(&culture.format_i64(i64::from(*v), format)),
            FieldValue::Int16(v) => text.push_str(&culture.format_i64(i64::from(*v), format)),
            FieldValue::Int32(v) => text.push_str(&culture.format_i64(i64::from(*v), format)),
            FieldValue::Int64(v) => text.push_str(&culture.format_i64(*v, format)),
            FieldValue::Single(v) => text.push_str(&culture.format_f32(*v, format)),
            FieldValue::Double(v) => text.push_str(&culture.format_f64(*v, format)),
            FieldValue::Decimal(v) => text.push_str(&culture.format_decimal(v, format)),
            FieldValue::Char(c) => text.push(*c),
            FieldValue::String(s) => text.push_str(s),
            FieldValue::Date(d) => {
                let f = format
                    .or(self.options.date_format.as_deref())
                    .unwrap_or(DEFAULT_DATE_FORMAT);
                write_chrono(&mut text, d.format(f))?;
            }
            FieldValue::Time(t) => {
                write_chrono(&mut text, t.format(format.unwrap_or(DEFAULT_TIME_FORMAT)))?;
            }
            FieldValue::DateTime(dt) => {
                let f = format
                    .or(self.options.date_time_format.as_deref())
                    .unwrap_or(DEFAULT_DATE_TIME_FORMAT);
                write_chrono(&mut text, dt.format(f))?;
            }
            FieldValue::DateTimeOffset(dt) => {
                match format.or(self.options.date_time_format.as_deref()) {
                    Some(f) => write_chrono(&mut text, dt.format(f))?,
                    None => text.push_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                }
            }
            FieldValue::Guid(g) => {
                let _ = write!(text, "{}", g.hyphenated());
            }
        }

        let result = self.write_text(&text);
        self.text = text;
        result
    }

    /// Writes a binary field as a single Base64 or hexadecimal token.
    pub fn write_binary(&mut self, bytes: &[u8]) -> Result<()> {
        self.start_field()?;
        let at_line_start = self.field == 0;
        let alphabet: &[u8] = match self.options.binary_encoding {
            BinaryEncoding::Base64 => {
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/="
            }
            BinaryEncoding::Hexadecimal => b"0123456789abcdef",
        };
        let quoted = self.options.style == QuoteStyle::Standard
            && alphabet.iter().any(|&c| self.is_special(c));
        if quoted {
            self.put(&[self.options.quote_byte()])?;
        }

        let mut chunk = String::with_capacity(BINARY_CHUNK * 2);
        for (i, piece) in bytes.chunks(BINARY_CHUNK).enumerate() {
            chunk.clear();
            match self.options.binary_encoding {
                BinaryEncoding::Base64 => {
                    base64::engine::general_purpose::STANDARD.encode_string(piece, &mut chunk)
                }
                BinaryEncoding::Hexadecimal => chunk.push_str(&hex::encode(piece)),
            }
            match self.options.style {
                QuoteStyle::Standard => self.put(chunk.as_bytes())?,
                QuoteStyle::Escaped => self.put_escaped(&chunk, at_line_start && i == 0)?,
            }
        }

        if quoted {
            self.put(&[self.options.quote_byte()])?;
        }
        self.field += 1;
        Ok(())
    }

    /// Terminates the current record with the configured line break.
    pub fn end_record(&mut self) -> Result<()> {
        // An escaped `\r` directly before `\n` reads as one escaped line break.
        let new_line: &'static [u8] = match self.options.new_line.as_str() {
            "\r\n" => b"\r\n",
            "\r" => b"\r",
            _ if self.trailing_cr => b"\r\n",
            _ => b"\n",
        };
        self.trailing_cr = false;
        self.put(new_line)?;
        self.field = 0;
        self.records += 1;
        Ok(())
    }

    /// Writes all values followed by a line break.
    pub fn write_record(&mut self, values: &[FieldValue]) -> Result<()> {
        for value in values {
            self.write_field(value)?;
        }
        self.end_record()
    }

    /// Writes every record of `source`, preceded by a header line unless
    /// `options.write_header` is off. Header names come from the source, falling back
    /// to the writer's schema.
    ///
    /// Returns the number of data records written.
    pub fn write_all<S: RecordSource + ?Sized>(&mut self, source: &mut S) -> Result<u64> {
        let headers = source.headers();
        if self.options.write_header && !self.header_written {
            if !headers.is_empty() {
                self.write_header(&headers)?;
            } else if self.schema.as_deref().is_some_and(|s| !s.is_empty()) {
                self.write_schema_header()?;
            }
        } else if !headers.is_empty() && self.map.is_none() {
            self.map = self.schema.as_deref().map(|s| ColumnMap::bind(s, &headers));
        }
        let mut count = 0;
        while let Some(values) = source.next_record()? {
            self.write_record(&values)?;
            count += 1;
        }
        Ok(count)
    }

    /// Flushes buffered output to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_buf()?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.inner)
    }

    fn start_field(&mut self) -> Result<()> {
        self.trailing_cr = false;
        if self.field > 0 {
            self.put(&[self.options.delimiter_byte()])?;
        }
        Ok(())
    }

    fn is_special(&self, b: u8) -> bool {
        b == self.options.delimiter_byte()
            || b == b'\r'
            || b == b'\n'
            || match self.options.style {
                QuoteStyle::Standard => b == self.options.quote_byte(),
                QuoteStyle::Escaped => b == self.options.escape_byte(),
            }
    }

    /// Standard style: quote the field if it holds a special character (or starts with
    /// the comment marker at line start), doubling or escaping embedded quotes.
    fn put_quoted(&mut self, text: &str) -> Result<()> {
        let bytes = text.as_bytes();
        let comment_start =
            self.field == 0 && self.options.comment_byte().is_some_and(|c| bytes.first() == Some(&c));
        if !comment_start && !bytes.iter().any(|&b| self.is_special(b)) {
            return self.put(bytes);
        }

        let quote = self.options.quote_byte();
        let escape = self.options.escape_byte();
        self.put(&[quote])?;
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            if b == quote || (escape != quote && b == escape) {
                self.put(&bytes[start..i])?;
                self.put(&[escape, b])?;
                start = i + 1;
            }
        }
        self.put(&bytes[start..])?;
        self.put(&[quote])
    }

    /// Escaped style: prefix each special character with the escape character.
    fn put_escaped(&mut self, text: &str, at_line_start: bool) -> Result<()> {
        let bytes = text.as_bytes();
        let escape = self.options.escape_byte();
        let comment = self.options.comment_byte();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let leading_comment = i == 0 && at_line_start && Some(b) == comment;
            if leading_comment || self.is_special(b) {
                self.put(&bytes[start..i])?;
                self.put(&[escape])?;
                start = i;
            }
        }
        self.trailing_cr = bytes.last() == Some(&b'\r');
        self.put(&bytes[start..])
    }

    /// Appends to the buffer, flushing whenever it fills.
    fn put(&mut self, mut bytes: &[u8]) -> Result<()> {
        let capacity = self.options.buffer_size;
        while !bytes.is_empty() {
            let room = capacity.saturating_sub(self.buf.len());
            if room == 0 {
                self.flush_buf()?;
                continue;
            }
            let n = room.min(bytes.len());
            self.buf.extend_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
        }
        Ok(())
    }

    fn flush_buf(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.inner.write_all(&self.buf)?;
            trace!(bytes = self.buf.len(), "flushed write buffer");
            self.buf.clear();
        }
        Ok(())
    }
}

fn write_chrono(text: &mut String, value: impl fmt::Display) -> Result<()> {
    write!(text, "{}", value)
        .map_err(|_| Error::invalid_options("invalid date/time format pattern"))
}
