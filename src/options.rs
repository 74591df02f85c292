//! Configuration options for the CSV codec.
//!
//! This module provides types to configure [`CsvReader`](crate::CsvReader) and
//! [`CsvWriter`](crate::CsvWriter):
//!
//! - [`CsvOptions`]: Main configuration struct, shared by both directions
//! - [`QuoteStyle`]: How special characters inside fields are protected
//! - [`BinaryEncoding`]: How binary fields are represented as text
//!
//! A writer and a reader given the same options agree on the format, so values
//! written by one are read back unchanged by the other.
//!
//! ## Examples
//!
//! ```rust
//! use colspec::{BinaryEncoding, CsvOptions, Culture};
//!
//! // Semicolon-separated, comma decimals
//! let options = CsvOptions::new()
//!     .with_delimiter(';')
//!     .with_culture(Culture::from_name("it-IT").unwrap());
//!
//! // Backslash escapes and `#` comments instead of quoting
//! let options = CsvOptions::escaped().with_binary_encoding(BinaryEncoding::Hexadecimal);
//! ```

use crate::{Culture, Error, Result};

/// Smallest accepted internal buffer size.
pub const MIN_BUFFER_SIZE: usize = 16;

/// Default internal buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 0x4000;

/// How fields containing special characters are written.
///
/// - **Standard**: RFC 4180 style; such fields are wrapped in quotes and embedded
///   quotes are doubled.
/// - **Escaped**: no quoting; each special character is prefixed with the escape
///   character, and lines starting with the comment marker are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    #[default]
    Standard,
    Escaped,
}

/// Text encoding of binary fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    #[default]
    Base64,
    Hexadecimal,
}

/// Configuration for reading and writing delimited text.
///
/// # Examples
///
/// ```rust
/// use colspec::{CsvOptions, QuoteStyle};
///
/// let options = CsvOptions::new();
/// assert_eq!(options.delimiter, ',');
/// assert_eq!(options.style, QuoteStyle::Standard);
///
/// let escaped = CsvOptions::escaped();
/// assert_eq!(escaped.escape, '\\');
/// assert_eq!(escaped.comment, Some('#'));
/// ```
#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub delimiter: char,
    pub quote: char,
    pub escape: char,
    pub comment: Option<char>,
    pub new_line: String,
    pub style: QuoteStyle,
    pub binary_encoding: BinaryEncoding,
    pub culture: Culture,
    pub buffer_size: usize,
    /// Reader: treat the first record as column names.
    pub has_headers: bool,
    /// Writer: emit a header line before the first record.
    pub write_header: bool,
    /// Default pattern for `DateTime`/`DateTimeOffset` values without a column format.
    pub date_time_format: Option<String>,
    /// Default pattern for `Date` values without a column format.
    pub date_format: Option<String>,
    pub true_string: String,
    pub false_string: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: ',',
            quote: '"',
            escape: '"',
            comment: None,
            new_line: "\n".to_string(),
            style: QuoteStyle::Standard,
            binary_encoding: BinaryEncoding::default(),
            culture: Culture::invariant(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            has_headers: true,
            write_header: true,
            date_time_format: None,
            date_format: None,
            true_string: "true".to_string(),
            false_string: "false".to_string(),
        }
    }
}

impl CsvOptions {
    /// Creates default options (comma delimiter, standard quoting, Base64 binary).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for the escaped style: `\` escapes, `#` comments.
    #[must_use]
    pub fn escaped() -> Self {
        CsvOptions {
            style: QuoteStyle::Escaped,
            escape: '\\',
            comment: Some('#'),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Sets the escape character. In the standard style an escape that differs from
    /// the quote character escapes the next character inside quoted fields.
    #[must_use]
    pub fn with_escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: Option<char>) -> Self {
        self.comment = comment;
        self
    }

    #[must_use]
    pub fn with_new_line(mut self, new_line: impl Into<String>) -> Self {
        self.new_line = new_line.into();
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: QuoteStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_binary_encoding(mut self, encoding: BinaryEncoding) -> Self {
        self.binary_encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    #[must_use]
    pub fn with_write_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    #[must_use]
    pub fn with_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Sets the boolean literals written for `true` and `false`.
    #[must_use]
    pub fn with_bool_strings(mut self, true_string: &str, false_string: &str) -> Self {
        self.true_string = true_string.to_string();
        self.false_string = false_string.to_string();
        self
    }

    /// Checks that the special characters are ASCII and distinct from each other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(Error::invalid_options(format!(
                "buffer size {} is below the minimum of {}",
                self.buffer_size, MIN_BUFFER_SIZE
            )));
        }
        let mut specials = vec![("delimiter", self.delimiter), ("escape", self.escape)];
        if self.style == QuoteStyle::Standard {
            specials.push(("quote", self.quote));
        }
        if let Some(comment) = self.comment {
            specials.push(("comment", comment));
        }
        for (name, ch) in &specials {
            if !ch.is_ascii() || *ch == '\r' || *ch == '\n' {
                return Err(Error::invalid_options(format!(
                    "{} must be an ASCII character other than a line break, got {:?}",
                    name, ch
                )));
            }
        }
        for (i, (a, x)) in specials.iter().enumerate() {
            for (b, y) in &specials[i + 1..] {
                let shared_quote = *a == "escape" && *b == "quote";
                if x == y && !shared_quote {
                    return Err(Error::invalid_options(format!(
                        "{} and {} are both {:?}",
                        a, b, x
                    )));
                }
            }
        }
        if self.new_line != "\n" && self.new_line != "\r\n" && self.new_line != "\r" {
            return Err(Error::invalid_options(format!(
                "unsupported line break {:?}",
                self.new_line
            )));
        }
        if self.true_string == self.false_string {
            return Err(Error::invalid_options(
                "true and false literals must differ",
            ));
        }
        Ok(())
    }

    pub(crate) fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub(crate) fn quote_byte(&self) -> u8 {
        self.quote as u8
    }

    pub(crate) fn escape_byte(&self) -> u8 {
        self.escape as u8
    }

    pub(crate) fn comment_byte(&self) -> Option<u8> {
        self.comment.map(|c| c as u8)
    }
}
