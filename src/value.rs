//! Dynamic field values.
//!
//! [`FieldValue`] holds one typed cell: it is what the reader produces from schema-typed
//! columns and what the writer consumes. Each non-null variant corresponds to one
//! [`DataType`].
//!
//! ```rust
//! use colspec::{DataType, FieldValue};
//!
//! let v = FieldValue::from(42);
//! assert_eq!(v.data_type(), Some(DataType::Int32));
//! assert_eq!(v.as_i64(), Some(42));
//! assert!(FieldValue::Null.is_null());
//! ```

use crate::DataType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A single typed field value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Boolean(bool),
    Byte(u8),
    Char(char),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// A date and time without an offset.
    DateTime(NaiveDateTime),
    /// A date and time with a UTC offset.
    DateTimeOffset(DateTime<FixedOffset>),
    Guid(Uuid),
}

impl FieldValue {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The data type of this value, `None` for null.
    #[must_use]
    pub const fn data_type(&self) -> Option<DataType> {
        Some(match self {
            FieldValue::Null => return None,
            FieldValue::Boolean(_) => DataType::Boolean,
            FieldValue::Byte(_) => DataType::Byte,
            FieldValue::Char(_) => DataType::Char,
            FieldValue::Int16(_) => DataType::Int16,
            FieldValue::Int32(_) => DataType::Int32,
            FieldValue::Int64(_) => DataType::Int64,
            FieldValue::Single(_) => DataType::Single,
            FieldValue::Double(_) => DataType::Double,
            FieldValue::Decimal(_) => DataType::Decimal,
            FieldValue::String(_) => DataType::String,
            FieldValue::Binary(_) => DataType::Binary,
            FieldValue::Date(_) => DataType::Date,
            FieldValue::Time(_) => DataType::Time,
            FieldValue::DateTime(_) => DataType::DateTime,
            FieldValue::DateTimeOffset(_) => DataType::DateTimeOffset,
            FieldValue::Guid(_) => DataType::Guid,
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widens any integer variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Byte(v) => Some(i64::from(*v)),
            FieldValue::Int16(v) => Some(i64::from(*v)),
            FieldValue::Int32(v) => Some(i64::from(*v)),
            FieldValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Single(v) => Some(f64::from(*v)),
            FieldValue::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// The instant a date/time value denotes. Values without an offset are taken as UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(dt.and_utc()),
            FieldValue::DateTimeOffset(dt) => Some(dt.with_timezone(&Utc)),
            FieldValue::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    u8 => Byte,
    char => Char,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Single,
    f64 => Double,
    Decimal => Decimal,
    String => String,
    Vec<u8> => Binary,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    Uuid => Guid,
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<&[u8]> for FieldValue {
    fn from(v: &[u8]) -> Self {
        FieldValue::Binary(v.to_vec())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::DateTimeOffset(v.fixed_offset())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_option() {
        assert_eq!(FieldValue::from(None::<i32>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("a")), FieldValue::String("a".into()));
    }

    #[test]
    fn test_widening() {
        assert_eq!(FieldValue::Int16(-3).as_i64(), Some(-3));
        assert_eq!(FieldValue::Int32(3).as_f64(), Some(3.0));
        assert_eq!(FieldValue::String("3".into()).as_i64(), None);
    }

    #[test]
    fn test_to_utc_normalizes_offset() {
        let offset = DateTime::parse_from_rfc3339("2024-03-01T10:00:00+02:00").unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(
            FieldValue::from(offset).to_utc(),
            FieldValue::from(naive).to_utc()
        );
    }
}
