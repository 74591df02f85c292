//! The schema model.
//!
//! A [`Schema`] is an ordered, immutable list of [`Column`] descriptors. Column order is
//! the wire order of the delimited text. Schemas are assembled with a [`SchemaBuilder`]
//! and frozen by [`SchemaBuilder::build`]; after that they are read-only and can be
//! shared between any number of readers and writers (wrap them in an `Arc` to share
//! across threads).
//!
//! ## Series columns
//!
//! A series column stands for one member of a repeated, wide-format observation such
//! as one column per month. Series columns have an empty `name`; they carry a series
//! name, an ordinal within their group, and optionally a header format such as
//! `{Date}` that describes how the original header text was formed.
//!
//! ```rust
//! use colspec::{Column, DataType, Schema};
//!
//! let schema = Schema::builder()
//!     .add(Column::builder("Name").build().unwrap())
//!     .add(Column::series("Values").header_format("{Date}").data_type(DataType::Int32).build().unwrap())
//!     .build();
//!
//! assert_eq!(schema.len(), 2);
//! assert!(schema[1].is_series());
//! assert_eq!(schema[1].series_value_type(), Some(DataType::Date));
//! ```

use crate::spec::SERIES_MARKER;
use crate::{DataType, Error, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::ops::Index;

/// Maximum length of a string or binary column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnSize {
    /// At most this many characters (strings) or bytes (binary).
    Bounded(u32),
    /// Explicitly marked as unbounded; written as `[*]`.
    Unbounded,
}

/// Series membership of a column.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SeriesInfo {
    name: String,
    ordinal: usize,
    header_format: Option<String>,
    value_type: Option<DataType>,
}

/// One schema entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    name: String,
    base_name: Option<String>,
    data_type: DataType,
    nullable: bool,
    size: Option<ColumnSize>,
    format: Option<String>,
    series: Option<SeriesInfo>,
}

impl Column {
    /// Starts an ordinary column. An empty name declares an anonymous column.
    pub fn builder(name: impl Into<String>) -> ColumnBuilder {
        ColumnBuilder {
            column: Column {
                name: name.into(),
                base_name: None,
                data_type: DataType::String,
                nullable: false,
                size: None,
                format: None,
                series: None,
            },
        }
    }

    /// Starts a series column belonging to `series_name`.
    pub fn series(series_name: impl Into<String>) -> ColumnBuilder {
        let mut builder = Column::builder("");
        builder.column.series = Some(SeriesInfo {
            name: series_name.into(),
            ordinal: 0,
            header_format: None,
            value_type: None,
        });
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source name of the column, when it differs from `name`.
    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Declared length limit for string and binary columns.
    ///
    /// The size is schema metadata only: the reader and writer do not truncate or
    /// reject values longer than it.
    pub fn size(&self) -> Option<ColumnSize> {
        self.size
    }

    /// Format pattern used when reading and writing values of this column.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn is_series(&self) -> bool {
        self.series.is_some()
    }

    pub fn series_name(&self) -> Option<&str> {
        self.series.as_ref().map(|s| s.name.as_str())
    }

    /// Position of this column within its series group, starting at 0.
    pub fn series_ordinal(&self) -> Option<usize> {
        self.series.as_ref().map(|s| s.ordinal)
    }

    pub fn series_header_format(&self) -> Option<&str> {
        self.series.as_ref().and_then(|s| s.header_format.as_deref())
    }

    /// Type named by the `{Type}` placeholder of the header format; it types the
    /// per-column keys of the series (dates for `{Date}`, integers for `{Integer}`).
    pub fn series_value_type(&self) -> Option<DataType> {
        self.series.as_ref().and_then(|s| s.value_type)
    }

    /// Key identifying the series group this column belongs to.
    pub fn series_group_key(&self) -> Option<&str> {
        self.series
            .as_ref()
            .map(|s| s.header_format.as_deref().unwrap_or(&s.name))
    }

    /// The header text this column is written under.
    pub fn header_name(&self) -> &str {
        match &self.series {
            None => &self.name,
            Some(s) if !s.name.is_empty() => &s.name,
            Some(s) => s.header_format.as_deref().unwrap_or_default(),
        }
    }

    /// Regenerates a wide-format header for `key` from the header format.
    ///
    /// Returns `None` for ordinary columns.
    ///
    /// ```rust
    /// use colspec::Column;
    ///
    /// let col = Column::series("Sales").header_format("Q{Integer}").build().unwrap();
    /// assert_eq!(col.series_header("3").as_deref(), Some("Q3"));
    /// ```
    pub fn series_header(&self, key: &str) -> Option<String> {
        let series = self.series.as_ref()?;
        let header = match series.header_format.as_deref() {
            Some(format) => match placeholder_span(format) {
                Some((start, end)) => format!("{}{}{}", &format[..start], key, &format[end..]),
                None => format!("{}{}", format, key),
            },
            None => format!("{}{}", series.name, key),
        };
        Some(header)
    }

    /// Whether `header` could have been produced by [`Column::series_header`], returning
    /// the key text when it could.
    fn match_series_header<'h>(&self, header: &'h str) -> Option<&'h str> {
        let series = self.series.as_ref()?;
        let format = series.header_format.as_deref()?;
        let (start, end) = placeholder_span(format)?;
        let (prefix, suffix) = (&format[..start], &format[end..]);
        if header.len() <= prefix.len() + suffix.len()
            || !header.starts_with(prefix)
            || !header.ends_with(suffix)
        {
            return None;
        }
        let key = &header[prefix.len()..header.len() - suffix.len()];
        let accepted = match series.value_type {
            Some(DataType::Date | DataType::DateTime | DataType::DateTimeOffset) => {
                NaiveDate::parse_from_str(key, "%Y-%m-%d").is_ok()
            }
            Some(t) if t.is_numeric() => key.parse::<i64>().is_ok(),
            _ => true,
        };
        accepted.then_some(key)
    }
}

/// Locates the first `{Token}` placeholder whose token is alphanumeric.
pub(crate) fn placeholder_span(format: &str) -> Option<(usize, usize)> {
    let start = format.find('{')?;
    let len = format[start + 1..].find('}')?;
    let token = &format[start + 1..start + 1 + len];
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((start, start + len + 2))
}

/// Builder for a single [`Column`].
#[derive(Clone, Debug)]
pub struct ColumnBuilder {
    column: Column,
}

impl ColumnBuilder {
    #[must_use]
    pub fn base_name(mut self, base_name: impl Into<String>) -> Self {
        self.column.base_name = Some(base_name.into());
        self
    }

    #[must_use]
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.column.data_type = data_type;
        self
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.column.nullable = nullable;
        self
    }

    #[must_use]
    pub fn size(mut self, size: ColumnSize) -> Self {
        self.column.size = Some(size);
        self
    }

    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.column.format = Some(format.into());
        self
    }

    /// Sets the series header format. Its `{Type}` placeholder, when present, becomes
    /// the series key type on [`build`](Self::build). Has no effect on ordinary columns.
    #[must_use]
    pub fn header_format(mut self, format: impl Into<String>) -> Self {
        if let Some(series) = self.column.series.as_mut() {
            series.header_format = Some(format.into());
        }
        self
    }

    /// Finishes the column.
    ///
    /// A size on a type that carries no length is dropped, as are empty formats and a
    /// base name equal to the column name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColumn`] when the column could not be written as a spec
    /// and read back unchanged: a name or base name holding a reserved character or
    /// surrounding whitespace, a format containing `}`, a base name on a series column,
    /// or a header format placeholder naming an unknown type.
    ///
    /// ```rust
    /// use colspec::Column;
    ///
    /// assert!(Column::builder("a:b").build().is_err());
    /// assert!(Column::series("v").header_format("{Month}").build().is_err());
    /// ```
    pub fn build(self) -> Result<Column> {
        let label = self.column.header_name().to_string();
        self.finish().map_err(|msg| Error::invalid_column(&label, msg))
    }

    pub(crate) fn finish(mut self) -> std::result::Result<Column, String> {
        let column = &mut self.column;
        if !column.data_type.is_length_bearing() {
            column.size = None;
        }
        if column.format.as_deref() == Some("") {
            column.format = None;
        }
        if matches!(column.base_name.as_deref(), Some(b) if b.is_empty() || b == column.name) {
            column.base_name = None;
        }
        if let Some(format) = column.format.as_deref() {
            if format.contains(['}', ',', '\r', '\n']) {
                return Err(format!("format '{}' contains a reserved character", format));
            }
        }
        if let Some(base_name) = column.base_name.as_deref() {
            check_token("base name", base_name)?;
        }
        match column.series.as_mut() {
            None => {
                check_token("name", &column.name)?;
                if column.name.ends_with(SERIES_MARKER) {
                    return Err(format!("name '{}' ends with the series marker", column.name));
                }
            }
            Some(series) => {
                if column.base_name.is_some() {
                    return Err("a series column takes its source name from the header format"
                        .to_string());
                }
                check_token("series name", &series.name)?;
                if series.header_format.as_deref() == Some("") {
                    series.header_format = None;
                }
                series.value_type = match series.header_format.as_deref() {
                    Some(format) => {
                        check_token("header format", format)?;
                        match placeholder_span(format) {
                            Some((start, end)) => {
                                let token = &format[start + 1..end - 1];
                                Some(DataType::resolve(token).ok_or_else(|| {
                                    format!("unknown series key type '{}'", token)
                                })?)
                            }
                            None => None,
                        }
                    }
                    None => None,
                };
            }
        }
        Ok(self.column)
    }
}

/// Rejects text that a spec string could not carry through a round trip.
fn check_token(what: &str, text: &str) -> std::result::Result<(), String> {
    if text.trim() != text {
        return Err(format!("{} '{}' has surrounding whitespace", what, text));
    }
    if text.contains([',', ':', '>', '\r', '\n']) {
        return Err(format!("{} '{}' contains a reserved character", what, text));
    }
    Ok(())
}

/// An immutable, ordered list of columns.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
    by_name: IndexMap<String, usize>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Column> {
        self.columns.get(ordinal)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    /// Ordinal of the first column named `name`.
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Groups series columns by their group key, in order of first appearance.
    pub fn series_groups(&self) -> Vec<SeriesGroup<'_>> {
        let mut groups: IndexMap<&str, SeriesGroup<'_>> = IndexMap::new();
        for (ordinal, column) in self.columns.iter().enumerate() {
            if let Some(key) = column.series_group_key() {
                let group = groups.entry(key).or_insert_with(|| SeriesGroup {
                    key,
                    members: Vec::new(),
                });
                group.members.push((ordinal, column));
            }
        }
        groups.into_values().collect()
    }

    /// Header line text for each column, in schema order.
    pub fn header_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::header_name).collect()
    }
}

impl Index<usize> for Schema {
    type Output = Column;

    fn index(&self, ordinal: usize) -> &Column {
        &self.columns[ordinal]
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Append-only builder for a [`Schema`].
#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn push(&mut self, column: Column) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Freezes the schema. Series ordinals are renumbered so that each group counts
    /// 0, 1, 2, ... in schema order.
    pub fn build(mut self) -> Schema {
        let mut next_ordinal: IndexMap<String, usize> = IndexMap::new();
        for column in &mut self.columns {
            let key = match column.series_group_key() {
                Some(key) => key.to_string(),
                None => continue,
            };
            let slot = next_ordinal.entry(key).or_insert(0);
            if let Some(series) = column.series.as_mut() {
                series.ordinal = *slot;
            }
            *slot += 1;
        }

        let mut by_name = IndexMap::new();
        for (ordinal, column) in self.columns.iter().enumerate() {
            if !column.name.is_empty() {
                by_name.entry(column.name.clone()).or_insert(ordinal);
            }
        }

        Schema {
            columns: self.columns,
            by_name,
        }
    }
}

/// Series columns sharing a group key, in schema order.
#[derive(Clone, Debug)]
pub struct SeriesGroup<'a> {
    key: &'a str,
    members: Vec<(usize, &'a Column)>,
}

impl<'a> SeriesGroup<'a> {
    /// The shared header format, or the series name when no format is set.
    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Schema ordinals of the members.
    pub fn ordinals(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().map(|(ordinal, _)| *ordinal)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'a Column> + '_ {
        self.members.iter().map(|(_, column)| *column)
    }
}

/// Binding of a header row to schema columns.
///
/// Ordinary columns bind to the first unbound header with the same name, falling back
/// to a case-insensitive match; anonymous columns bind by position. A series column
/// with a `{Type}` header format then claims every remaining header matching it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMap {
    bindings: Vec<Option<usize>>,
    series_keys: Vec<Option<String>>,
    unbound: Vec<usize>,
}

impl ColumnMap {
    /// Binds `headers` to `schema`.
    pub fn bind<S: AsRef<str>>(schema: &Schema, headers: &[S]) -> ColumnMap {
        let mut bindings: Vec<Option<usize>> = vec![None; headers.len()];
        let mut series_keys: Vec<Option<String>> = vec![None; headers.len()];
        let mut unbound = Vec::new();

        for (index, column) in schema.iter().enumerate() {
            if column.is_series() {
                continue;
            }
            let found = if column.name.is_empty() {
                (index < headers.len() && bindings[index].is_none()).then_some(index)
            } else {
                let free = |i: &usize| bindings[*i].is_none();
                (0..headers.len())
                    .filter(free)
                    .find(|&i| headers[i].as_ref() == column.name)
                    .or_else(|| {
                        (0..headers.len())
                            .filter(free)
                            .find(|&i| headers[i].as_ref().eq_ignore_ascii_case(&column.name))
                    })
            };
            match found {
                Some(i) => bindings[i] = Some(index),
                None => unbound.push(index),
            }
        }

        for (index, column) in schema.iter().enumerate() {
            if !column.is_series() {
                continue;
            }
            let pattern = column
                .series_header_format()
                .and_then(placeholder_span)
                .is_some();
            let mut bound_any = false;
            for (i, header) in headers.iter().enumerate() {
                if bindings[i].is_some() {
                    continue;
                }
                let header = header.as_ref();
                let key = if pattern {
                    match column.match_series_header(header) {
                        Some(key) => Some(key.to_string()),
                        None => continue,
                    }
                } else if header.eq_ignore_ascii_case(column.header_name()) {
                    None
                } else {
                    continue;
                };
                bindings[i] = Some(index);
                series_keys[i] = key;
                bound_any = true;
                if !pattern {
                    break;
                }
            }
            if !bound_any {
                unbound.push(index);
            }
        }

        unbound.sort_unstable();
        ColumnMap {
            bindings,
            series_keys,
            unbound,
        }
    }

    /// Binds each schema column to the field at the same position.
    pub fn positional(schema: &Schema) -> ColumnMap {
        ColumnMap {
            bindings: (0..schema.len()).map(Some).collect(),
            series_keys: vec![None; schema.len()],
            unbound: Vec::new(),
        }
    }

    /// Schema ordinal bound to the field at `ordinal`.
    pub fn column_for(&self, ordinal: usize) -> Option<usize> {
        self.bindings.get(ordinal).copied().flatten()
    }

    /// Key text extracted from a series header at `ordinal`.
    pub fn series_key(&self, ordinal: usize) -> Option<&str> {
        self.series_keys.get(ordinal).and_then(|k| k.as_deref())
    }

    /// Schema ordinals that no header bound to.
    pub fn unbound_columns(&self) -> &[usize] {
        &self.unbound
    }

    /// Header ordinals that bound to no schema column.
    pub fn unbound_headers(&self) -> impl Iterator<Item = usize> + '_ {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_none())
            .map(|(i, _)| i)
    }

    /// Fails with [`Error::UnboundMember`] if any non-nullable column is unbound.
    pub fn require_all(&self, schema: &Schema) -> Result<()> {
        let missing: Vec<String> = self
            .unbound
            .iter()
            .filter_map(|&i| schema.get(i))
            .filter(|c| !c.is_nullable())
            .map(|c| c.header_name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::UnboundMember(missing))
        }
    }
}
