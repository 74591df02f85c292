//! Sources of typed records for the writer.
//!
//! [`RecordSource`] is what [`CsvWriter::write_all`](crate::CsvWriter::write_all)
//! drains: a header list plus a stream of ordinal-indexed rows. A [`CsvReader`] is a
//! source, so reader output pipes straight into a writer; [`RecordSet`] is an
//! in-memory one.

use crate::{CsvReader, FieldValue, Result};
use std::io::Read;

/// A forward-only stream of records.
pub trait RecordSource {
    /// Column names, empty when the source has none.
    fn headers(&self) -> Vec<String>;

    /// The next record, or `None` once exhausted. Records may differ in length.
    fn next_record(&mut self) -> Result<Option<Vec<FieldValue>>>;
}

impl<R: Read> RecordSource for CsvReader<R> {
    fn headers(&self) -> Vec<String> {
        CsvReader::headers(self).to_vec()
    }

    fn next_record(&mut self) -> Result<Option<Vec<FieldValue>>> {
        if self.read()? {
            self.values().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Records held in memory.
///
/// ```rust
/// use colspec::{FieldValue, RecordSet};
///
/// let mut set = RecordSet::new(vec!["Id".to_string()]);
/// set.push(vec![FieldValue::from(1)]);
/// set.push(vec![]);
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
    cursor: usize,
}

impl RecordSet {
    #[must_use]
    pub fn new(headers: Vec<String>) -> Self {
        RecordSet {
            headers,
            rows: Vec::new(),
            cursor: 0,
        }
    }

    /// Drains a source into memory.
    pub fn read_from<S: RecordSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut set = RecordSet::new(source.headers());
        while let Some(row) = source.next_record()? {
            set.rows.push(row);
        }
        Ok(set)
    }

    pub fn push(&mut self, row: Vec<FieldValue>) {
        self.rows.push(row);
    }

    pub fn header_names(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Restarts iteration as a [`RecordSource`] from the first row.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn into_rows(self) -> Vec<Vec<FieldValue>> {
        self.rows
    }
}

impl RecordSource for RecordSet {
    fn headers(&self) -> Vec<String> {
        self.headers.clone()
    }

    fn next_record(&mut self) -> Result<Option<Vec<FieldValue>>> {
        let row = self.rows.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
        }
        Ok(row)
    }
}
