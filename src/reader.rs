//! Streaming CSV decoding.
//!
//! [`CsvReader`] reads records one at a time from any [`io::Read`] through a bounded
//! internal buffer. Fields are assembled in a per-record scratch area as bytes arrive,
//! so a field is reconstructed exactly no matter how many buffer refills it spans.
//!
//! ## Overview
//!
//! - **Forward only**: [`CsvReader::read`] advances to the next record; accessors look
//!   at the current one
//! - **Typed access**: `get_i32`, `get_f64`, `get_date_time`, `get_bytes`, ... coerce the
//!   raw text using the culture and the column format; [`CsvReader::get_value`] picks
//!   the coercion from the schema
//! - **Ragged rows**: records may have more or fewer fields than the header; missing
//!   trailing fields read as empty/null
//! - **Two quoting styles**: RFC 4180 double quotes, or escape characters with comment
//!   lines (see [`QuoteStyle`])
//!
//! ```rust
//! use colspec::{CsvOptions, CsvReader};
//!
//! let data = "Id,Name\n1,\"Smith, J\"\n2\n";
//! let mut reader = CsvReader::new(data.as_bytes(), CsvOptions::new()).unwrap();
//!
//! assert!(reader.read().unwrap());
//! assert_eq!(reader.get_i32(0).unwrap(), 1);
//! assert_eq!(reader.get_str(1).unwrap(), "Smith, J");
//!
//! assert!(reader.read().unwrap());
//! assert_eq!(reader.field_count(), 1);
//! assert!(reader.is_null(1).unwrap());
//!
//! assert!(!reader.read().unwrap());
//! ```

use crate::{
    BinaryEncoding, Column, ColumnMap, CsvOptions, DataType, Error, FieldValue, QuoteStyle,
    Result, Schema,
};
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Tokenizer state within a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// A `\r` ended the previous record; swallow a following `\n`.
    AfterCr,
    RecordStart,
    Comment,
    FieldStart,
    Unquoted,
    UnquotedEscape,
    EscapedCr,
    Quoted,
    QuotedEscape,
    QuoteInQuoted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    OnRecord,
    Exhausted,
}

/// A forward-only reader of delimited text.
pub struct CsvReader<R> {
    inner: R,
    options: CsvOptions,
    schema: Option<Arc<Schema>>,
    map: Option<ColumnMap>,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
    eof: bool,
    skip_lf: bool,
    record: Vec<u8>,
    ends: Vec<usize>,
    headers: Vec<String>,
    position: Position,
    row: u64,
}

impl<R: Read> CsvReader<R> {
    /// Creates a schema-less reader. When `options.has_headers` is set, the header
    /// record is read immediately.
    ///
    /// # Errors
    ///
    /// Fails on invalid options or an I/O error while reading the header.
    pub fn new(inner: R, options: CsvOptions) -> Result<Self> {
        Self::build(inner, options, None)
    }

    /// Creates a reader with a schema for typed access. Headers, when present, are
    /// bound to schema columns with [`ColumnMap::bind`]; otherwise columns bind by
    /// position.
    ///
    /// # Errors
    ///
    /// Fails on invalid options or an I/O error while reading the header.
    pub fn with_schema(inner: R, options: CsvOptions, schema: impl Into<Arc<Schema>>) -> Result<Self> {
        Self::build(inner, options, Some(schema.into()))
    }

    fn build(inner: R, options: CsvOptions, schema: Option<Arc<Schema>>) -> Result<Self> {
        options.validate()?;
        let mut reader = CsvReader {
            inner,
            buf: vec![0; options.buffer_size].into_boxed_slice(),
            options,
            schema,
            map: None,
            pos: 0,
            len: 0,
            eof: false,
            skip_lf: false,
            record: Vec::new(),
            ends: Vec::new(),
            headers: Vec::new(),
            position: Position::BeforeFirst,
            row: 0,
        };

        if reader.options.has_headers {
            if reader.read_record()? {
                reader.headers = (0..reader.ends.len())
                    .map(|i| String::from_utf8_lossy(reader.field_bytes(i)).into_owned())
                    .collect();
                debug!(columns = reader.headers.len(), "read header record");
            } else {
                reader.position = Position::Exhausted;
            }
        }

        reader.map = reader.schema.as_deref().map(|schema| {
            if reader.options.has_headers {
                ColumnMap::bind(schema, &reader.headers)
            } else {
                ColumnMap::positional(schema)
            }
        });
        Ok(reader)
    }

    /// Advances to the next record. Returns `false` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying stream.
    pub fn read(&mut self) -> Result<bool> {
        if self.position == Position::Exhausted {
            return Ok(false);
        }
        if self.read_record()? {
            self.row += 1;
            self.position = Position::OnRecord;
            Ok(true)
        } else {
            self.position = Position::Exhausted;
            self.record.clear();
            self.ends.clear();
            Ok(false)
        }
    }

    /// Refills the buffer. Returns `false` at end of stream.
    fn fill(&mut self) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }
        let n = loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        trace!(bytes = n, "refilled read buffer");
        self.pos = 0;
        self.len = n;
        if n == 0 {
            self.eof = true;
        }
        Ok(n > 0)
    }

    fn end_field(&mut self) {
        self.ends.push(self.record.len());
    }

    /// Tokenizes one record into the scratch area. Returns `false` if the stream ended
    /// before any of the record was seen.
    fn read_record(&mut self) -> Result<bool> {
        self.record.clear();
        self.ends.clear();

        let delimiter = self.options.delimiter_byte();
        let quote = self.options.quote_byte();
        let escape = self.options.escape_byte();
        let comment = self.options.comment_byte();
        let escaped_style = self.options.style == QuoteStyle::Escaped;
        // In the standard style, a distinct escape character works inside quotes.
        let quoted_escape = !escaped_style && escape != quote;

        let mut state = if std::mem::take(&mut self.skip_lf) {
            State::AfterCr
        } else {
            State::RecordStart
        };

        loop {
            if self.pos == self.len && !self.fill()? {
                return Ok(self.finish_at_eof(state, escape));
            }
            let b = self.buf[self.pos];

            match state {
                State::AfterCr => {
                    if b == b'\n' {
                        self.pos += 1;
                    }
                    state = State::RecordStart;
                }
                State::RecordStart => {
                    if Some(b) == comment {
                        self.pos += 1;
                        state = State::Comment;
                    } else {
                        state = State::FieldStart;
                    }
                }
                State::Comment => {
                    let rest = &self.buf[self.pos..self.len];
                    match rest.iter().position(|&c| c == b'\n' || c == b'\r') {
                        Some(i) => {
                            let c = rest[i];
                            self.pos += i + 1;
                            debug!("skipped comment line");
                            state = if c == b'\r' {
                                State::AfterCr
                            } else {
                                State::RecordStart
                            };
                        }
                        None => self.pos = self.len,
                    }
                }
                State::FieldStart => {
                    if !escaped_style && b == quote {
                        self.pos += 1;
                        state = State::Quoted;
                    } else {
                        state = State::Unquoted;
                    }
                }
                State::Unquoted => {
                    let start = self.pos;
                    let run = self.buf[start..self.len]
                        .iter()
                        .position(|&c| {
                            c == delimiter
                                || c == b'\n'
                                || c == b'\r'
                                || (escaped_style && c == escape)
                        })
                        .unwrap_or(self.len - start);
                    self.record.extend_from_slice(&self.buf[start..start + run]);
                    self.pos = start + run;
                    if self.pos == self.len {
                        continue;
                    }
                    let c = self.buf[self.pos];
                    self.pos += 1;
                    if c == delimiter {
                        self.end_field();
                        state = State::FieldStart;
                    } else if c == b'\n' || c == b'\r' {
                        self.end_field();
                        self.skip_lf = c == b'\r';
                        return Ok(true);
                    } else {
                        state = State::UnquotedEscape;
                    }
                }
                State::UnquotedEscape => {
                    self.record.push(b);
                    self.pos += 1;
                    state = if b == b'\r' {
                        State::EscapedCr
                    } else {
                        State::Unquoted
                    };
                }
                State::EscapedCr => {
                    if b == b'\n' {
                        self.record.push(b);
                        self.pos += 1;
                    }
                    state = State::Unquoted;
                }
                State::Quoted => {
                    let start = self.pos;
                    let run = self.buf[start..self.len]
                        .iter()
                        .position(|&c| c == quote || (quoted_escape && c == escape))
                        .unwrap_or(self.len - start);
                    self.record.extend_from_slice(&self.buf[start..start + run]);
                    self.pos = start + run;
                    if self.pos == self.len {
                        continue;
                    }
                    let c = self.buf[self.pos];
                    self.pos += 1;
                    state = if c == quote {
                        State::QuoteInQuoted
                    } else {
                        State::QuotedEscape
                    };
                }
                State::QuotedEscape => {
                    self.record.push(b);
                    self.pos += 1;
                    state = State::Quoted;
                }
                State::QuoteInQuoted => {
                    if b == quote {
                        self.record.push(quote);
                        self.pos += 1;
                        state = State::Quoted;
                    } else if b == delimiter {
                        self.pos += 1;
                        self.end_field();
                        state = State::FieldStart;
                    } else if b == b'\n' || b == b'\r' {
                        self.pos += 1;
                        self.end_field();
                        self.skip_lf = b == b'\r';
                        return Ok(true);
                    } else {
                        // Text after a closing quote is kept as part of the field.
                        state = State::Unquoted;
                    }
                }
            }
        }
    }

    fn finish_at_eof(&mut self, state: State, escape: u8) -> bool {
        match state {
            State::AfterCr | State::RecordStart | State::Comment => false,
            State::UnquotedEscape | State::QuotedEscape => {
                self.record.push(escape);
                self.end_field();
                true
            }
            State::Quoted => {
                debug!(row = self.row + 1, "unterminated quoted field at end of stream");
                self.end_field();
                true
            }
            _ => {
                self.end_field();
                true
            }
        }
    }
}

impl<R> CsvReader<R> {
    /// Column names from the header record; empty when headers are disabled.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    /// The binding of fields to schema columns, when a schema was given.
    pub fn column_map(&self) -> Option<&ColumnMap> {
        self.map.as_ref()
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Number of fields in the current record.
    pub fn field_count(&self) -> usize {
        self.ends.len()
    }

    /// Number of declared columns: the larger of the header and schema widths.
    pub fn column_count(&self) -> usize {
        let schema_len = self.schema.as_ref().map_or(0, |s| s.len());
        self.headers.len().max(schema_len)
    }

    /// 1-based number of the current data record.
    pub fn row_number(&self) -> u64 {
        self.row
    }

    /// Ordinal of the first header named `name`, or of the schema column when the
    /// input has no headers.
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        if self.options.has_headers {
            self.headers.iter().position(|h| h == name)
        } else {
            self.schema.as_ref().and_then(|s| s.ordinal(name))
        }
    }

    /// Schema column bound to the field at `ordinal`.
    pub fn column(&self, ordinal: usize) -> Option<&Column> {
        let index = self.map.as_ref()?.column_for(ordinal)?;
        self.schema.as_ref()?.get(index)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn field_bytes(&self, i: usize) -> &[u8] {
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        &self.record[start..self.ends[i]]
    }

    fn ensure_record(&self) -> Result<()> {
        match self.position {
            Position::OnRecord => Ok(()),
            Position::BeforeFirst => Err(Error::invalid_state(
                "no current record, call read() first",
            )),
            Position::Exhausted => Err(Error::invalid_state("the reader is exhausted")),
        }
    }

    fn raw(&self, ordinal: usize) -> Result<Option<&[u8]>> {
        self.ensure_record()?;
        Ok((ordinal < self.ends.len()).then(|| self.field_bytes(ordinal)))
    }

    /// Raw bytes of a field; empty when the record is too short to have it.
    pub fn get_raw(&self, ordinal: usize) -> Result<&[u8]> {
        Ok(self.raw(ordinal)?.unwrap_or_default())
    }

    /// Whether the field is absent or empty.
    pub fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.raw(ordinal)?.map_or(true, |b| b.is_empty()))
    }

    fn format_error(&self, ordinal: usize, raw: &[u8], expected: &str) -> Error {
        Error::field_format(ordinal, self.row, &String::from_utf8_lossy(raw), expected)
    }

    fn column_format(&self, ordinal: usize) -> Option<&str> {
        self.column(ordinal).and_then(Column::format)
    }

    /// Field text; empty when the record is too short to have it.
    pub fn get_str(&self, ordinal: usize) -> Result<&str> {
        let raw = self.get_raw(ordinal)?;
        std::str::from_utf8(raw).map_err(|_| self.format_error(ordinal, raw, "UTF-8 text"))
    }

    /// Applies `parse` to the field text, mapping failure to a field format error.
    fn parse_with<T>(
        &self,
        ordinal: usize,
        expected: DataType,
        parse: impl FnOnce(&str, Option<&str>) -> Option<T>,
    ) -> Result<T> {
        let text = self.get_str(ordinal)?;
        parse(text, self.column_format(ordinal))
            .ok_or_else(|| self.format_error(ordinal, text.as_bytes(), expected.canonical_name()))
    }

    pub fn get_bool(&self, ordinal: usize) -> Result<bool> {
        self.parse_with(ordinal, DataType::Boolean, |text, format| {
            let text = text.trim();
            if let Some((t, f)) = format.and_then(|f| f.split_once('|')) {
                return if text.eq_ignore_ascii_case(t) {
                    Some(true)
                } else if text.eq_ignore_ascii_case(f) {
                    Some(false)
                } else {
                    None
                };
            }
            if text.eq_ignore_ascii_case(&self.options.true_string)
                || text.eq_ignore_ascii_case("true")
                || text == "1"
            {
                Some(true)
            } else if text.eq_ignore_ascii_case(&self.options.false_string)
                || text.eq_ignore_ascii_case("false")
                || text == "0"
            {
                Some(false)
            } else {
                None
            }
        })
    }

    pub fn get_byte(&self, ordinal: usize) -> Result<u8> {
        self.parse_with(ordinal, DataType::Byte, |text, format| {
            self.options
                .culture
                .parse_i64(text, format)
                .and_then(|v| u8::try_from(v).ok())
        })
    }

    pub fn get_char(&self, ordinal: usize) -> Result<char> {
        self.parse_with(ordinal, DataType::Char, |text, _| {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        })
    }

    pub fn get_i16(&self, ordinal: usize) -> Result<i16> {
        self.parse_with(ordinal, DataType::Int16, |text, format| {
            self.options
                .culture
                .parse_i64(text, format)
                .and_then(|v| i16::try_from(v).ok())
        })
    }

    pub fn get_i32(&self, ordinal: usize) -> Result<i32> {
        self.parse_with(ordinal, DataType::Int32, |text, format| {
            self.options
                .culture
                .parse_i64(text, format)
                .and_then(|v| i32::try_from(v).ok())
        })
    }

    pub fn get_i64(&self, ordinal: usize) -> Result<i64> {
        self.parse_with(ordinal, DataType::Int64, |text, format| {
            self.options.culture.parse_i64(text, format)
        })
    }

    pub fn get_f32(&self, ordinal: usize) -> Result<f32> {
        self.parse_with(ordinal, DataType::Single, |text, format| {
            self.options.culture.parse_f32(text, format)
        })
    }

    pub fn get_f64(&self, ordinal: usize) -> Result<f64> {
        self.parse_with(ordinal, DataType::Double, |text, format| {
            self.options.culture.parse_f64(text, format)
        })
    }

    pub fn get_decimal(&self, ordinal: usize) -> Result<Decimal> {
        self.parse_with(ordinal, DataType::Decimal, |text, format| {
            self.options.culture.parse_decimal(text, format)
        })
    }

    pub fn get_date(&self, ordinal: usize) -> Result<NaiveDate> {
        self.parse_with(ordinal, DataType::Date, |text, format| {
            let format = format.or(self.options.date_format.as_deref());
            parse_date(text.trim(), format)
        })
    }

    pub fn get_time(&self, ordinal: usize) -> Result<NaiveTime> {
        self.parse_with(ordinal, DataType::Time, |text, format| {
            let text = text.trim();
            match format {
                Some(f) => NaiveTime::parse_from_str(text, f).ok(),
                None => TIME_FORMATS
                    .iter()
                    .find_map(|f| NaiveTime::parse_from_str(text, f).ok()),
            }
        })
    }

    /// Reads a date and time without offset. Text carrying an offset is converted to
    /// UTC first.
    pub fn get_date_time(&self, ordinal: usize) -> Result<NaiveDateTime> {
        self.parse_with(ordinal, DataType::DateTime, |text, format| {
            let format = format.or(self.options.date_time_format.as_deref());
            parse_date_time_offset(text.trim(), format)
                .map(|dt| dt.naive_utc())
                .or_else(|| parse_date_time(text.trim(), format))
        })
    }

    /// Reads a date and time with offset. Text without an offset is taken as UTC.
    pub fn get_date_time_offset(&self, ordinal: usize) -> Result<DateTime<FixedOffset>> {
        self.parse_with(ordinal, DataType::DateTimeOffset, |text, format| {
            let format = format.or(self.options.date_time_format.as_deref());
            parse_date_time_offset(text.trim(), format)
                .or_else(|| parse_date_time(text.trim(), format).map(|dt| dt.and_utc().fixed_offset()))
        })
    }

    pub fn get_guid(&self, ordinal: usize) -> Result<Uuid> {
        self.parse_with(ordinal, DataType::Guid, |text, _| {
            Uuid::parse_str(text.trim()).ok()
        })
    }

    /// Decodes a binary field using the configured [`BinaryEncoding`].
    pub fn get_bytes(&self, ordinal: usize) -> Result<Vec<u8>> {
        let raw = self.get_raw(ordinal)?;
        let decoded = match self.options.binary_encoding {
            BinaryEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(raw)
                .ok(),
            BinaryEncoding::Hexadecimal => {
                let digits = raw
                    .strip_prefix(b"0x")
                    .or_else(|| raw.strip_prefix(b"0X"))
                    .unwrap_or(raw);
                hex::decode(digits).ok()
            }
        };
        decoded.ok_or_else(|| self.format_error(ordinal, raw, DataType::Binary.canonical_name()))
    }

    /// Reads a field typed by its schema column; string when there is none.
    ///
    /// Absent fields read as null. Empty fields read as null for nullable columns, as
    /// empty values for strings and binary, and fail for other non-nullable types.
    pub fn get_value(&self, ordinal: usize) -> Result<FieldValue> {
        let raw = match self.raw(ordinal)? {
            Some(raw) => raw,
            None => return Ok(FieldValue::Null),
        };
        let column = self.column(ordinal);
        let data_type = column.map_or(DataType::String, Column::data_type);
        if raw.is_empty() {
            return match data_type {
                _ if column.map_or(false, Column::is_nullable) => Ok(FieldValue::Null),
                DataType::String => Ok(FieldValue::String(String::new())),
                DataType::Binary => Ok(FieldValue::Binary(Vec::new())),
                other => Err(self.format_error(ordinal, raw, other.canonical_name())),
            };
        }
        Ok(match data_type {
            DataType::Boolean => FieldValue::Boolean(self.get_bool(ordinal)?),
            DataType::Byte => FieldValue::Byte(self.get_byte(ordinal)?),
            DataType::Char => FieldValue::Char(self.get_char(ordinal)?),
            DataType::Int16 => FieldValue::Int16(self.get_i16(ordinal)?),
            DataType::Int32 => FieldValue::Int32(self.get_i32(ordinal)?),
            DataType::Int64 => FieldValue::Int64(self.get_i64(ordinal)?),
            DataType::Single => FieldValue::Single(self.get_f32(ordinal)?),
            DataType::Double => FieldValue::Double(self.get_f64(ordinal)?),
            DataType::Decimal => FieldValue::Decimal(self.get_decimal(ordinal)?),
            DataType::String => FieldValue::String(self.get_str(ordinal)?.to_string()),
            DataType::Binary => FieldValue::Binary(self.get_bytes(ordinal)?),
            DataType::Date => FieldValue::Date(self.get_date(ordinal)?),
            DataType::Time => FieldValue::Time(self.get_time(ordinal)?),
            DataType::DateTime => FieldValue::DateTime(self.get_date_time(ordinal)?),
            DataType::DateTimeOffset => {
                FieldValue::DateTimeOffset(self.get_date_time_offset(ordinal)?)
            }
            DataType::Guid => FieldValue::Guid(self.get_guid(ordinal)?),
        })
    }

    /// All fields of the current record, typed by [`CsvReader::get_value`].
    pub fn values(&self) -> Result<Vec<FieldValue>> {
        self.ensure_record()?;
        (0..self.field_count()).map(|i| self.get_value(i)).collect()
    }
}

fn parse_date(text: &str, format: Option<&str>) -> Option<NaiveDate> {
    match format {
        Some(f) => NaiveDate::parse_from_str(text, f)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(text, f).ok().map(|dt| dt.date())),
        None => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_date_time(text, None).map(|dt| dt.date())),
    }
}

fn parse_date_time(text: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    match format {
        Some(f) => NaiveDateTime::parse_from_str(text, f).ok().or_else(|| {
            NaiveDate::parse_from_str(text, f)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }),
        None => DATE_TIME_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
    }
}

fn parse_date_time_offset(text: &str, format: Option<&str>) -> Option<DateTime<FixedOffset>> {
    match format {
        Some(f) => DateTime::parse_from_str(text, f).ok(),
        None => DateTime::parse_from_rfc3339(text).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_schema;

    fn reader(data: &str, options: CsvOptions) -> CsvReader<&[u8]> {
        CsvReader::new(data.as_bytes(), options).unwrap()
    }

    fn rows(data: &str, options: CsvOptions) -> Vec<Vec<String>> {
        let mut r = reader(data, options);
        let mut out = Vec::new();
        while r.read().unwrap() {
            out.push(
                (0..r.field_count())
                    .map(|i| r.get_str(i).unwrap().to_string())
                    .collect(),
            );
        }
        out
    }

    #[test]
    fn test_quoted_fields() {
        let data = "a,b\n\"x,1\",\"say \"\"hi\"\"\"\n\"multi\nline\",z\n";
        assert_eq!(
            rows(data, CsvOptions::new()),
            vec![vec!["x,1", "say \"hi\""], vec!["multi\nline", "z"]]
        );
    }

    #[test]
    fn test_line_endings() {
        let data = "h\r\n1\r2\n3";
        assert_eq!(
            rows(data, CsvOptions::new()),
            vec![vec!["1"], vec!["2"], vec!["3"]]
        );
    }

    #[test]
    fn test_trailing_delimiter_and_blank_line() {
        let data = "a,b\n1,\n\n";
        assert_eq!(
            rows(data, CsvOptions::new()),
            vec![vec!["1", ""], vec![""]]
        );
    }

    #[test]
    fn test_escaped_style() {
        let data = "a,b\n# a comment\n\\#not,x\\,y\nline\\\nbreak,\\\\\n";
        assert_eq!(
            rows(data, CsvOptions::escaped()),
            vec![vec!["#not", "x,y"], vec!["line\nbreak", "\\"]]
        );
    }

    #[test]
    fn test_distinct_escape_in_standard_style() {
        let data = "a\n\"x\\\"y\"\n";
        let options = CsvOptions::new().with_escape('\\');
        assert_eq!(rows(data, options), vec![vec!["x\"y"]]);
    }

    #[test]
    fn test_state_errors() {
        let mut r = reader("a\n1\n", CsvOptions::new());
        assert!(matches!(r.get_str(0), Err(Error::InvalidState(_))));
        assert!(r.read().unwrap());
        assert!(!r.read().unwrap());
        assert!(matches!(r.get_str(0), Err(Error::InvalidState(_))));
        assert!(!r.read().unwrap());
    }

    #[test]
    fn test_field_format_error_keeps_position() {
        let mut r = reader("n\nabc\n7\n", CsvOptions::new());
        assert!(r.read().unwrap());
        match r.get_i32(0) {
            Err(Error::FieldFormat { ordinal, record, raw, .. }) => {
                assert_eq!((ordinal, record, raw.as_str()), (0, 1, "abc"));
            }
            other => panic!("expected FieldFormat, got {:?}", other),
        }
        assert!(r.read().unwrap());
        assert_eq!(r.get_i32(0).unwrap(), 7);
    }

    #[test]
    fn test_small_buffer_long_field() {
        let long = "x".repeat(1000);
        let data = format!("a,b\n\"{}\",{}\n", long, long);
        let options = CsvOptions::new().with_buffer_size(16);
        assert_eq!(rows(&data, options), vec![vec![long.clone(), long]]);
    }

    #[test]
    fn test_schema_typed_values() {
        let schema = parse_schema("Id:int,Price:double?,When:DateTime").unwrap();
        let data = "Price,Id,When\n,5,2024-01-02T03:04:05\n";
        let mut r = CsvReader::with_schema(data.as_bytes(), CsvOptions::new(), schema).unwrap();
        assert!(r.read().unwrap());
        assert_eq!(r.get_value(0).unwrap(), FieldValue::Null);
        assert_eq!(r.get_value(1).unwrap(), FieldValue::Int32(5));
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(r.get_value(2).unwrap(), FieldValue::DateTime(expected));
    }

    #[test]
    fn test_bool_format() {
        let schema = parse_schema("Flag:bool{yes|no}").unwrap();
        let mut r = CsvReader::with_schema("Flag\nYES\nno\n".as_bytes(), CsvOptions::new(), schema)
            .unwrap();
        assert!(r.read().unwrap());
        assert!(r.get_bool(0).unwrap());
        assert!(r.read().unwrap());
        assert!(!r.get_bool(0).unwrap());
    }

    #[test]
    fn test_hex_with_prefix() {
        let options = CsvOptions::new().with_binary_encoding(BinaryEncoding::Hexadecimal);
        let mut r = reader("b\n0xdeadBEEF\n", options);
        assert!(r.read().unwrap());
        assert_eq!(r.get_bytes(0).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }
}
