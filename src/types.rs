//! The type lexicon.
//!
//! [`DataType`] is the closed set of column types a schema can declare. Spec strings
//! name types either by their canonical name (`Int32`, `DateTimeOffset`, ...) or by a
//! shorthand alias (`int`, `bool`, `long`, ...). Lookup is case-insensitive.
//!
//! ```rust
//! use colspec::DataType;
//!
//! assert_eq!(DataType::resolve("int"), Some(DataType::Int32));
//! assert_eq!(DataType::resolve("INT64"), Some(DataType::Int64));
//! assert_eq!(DataType::resolve("float"), Some(DataType::Single));
//! assert_eq!(DataType::resolve("varchar"), None);
//! ```

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Column data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    Boolean,
    Byte,
    Char,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    #[default]
    String,
    Binary,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    Guid,
}

const ALL: [DataType; 16] = [
    DataType::Boolean,
    DataType::Byte,
    DataType::Char,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Single,
    DataType::Double,
    DataType::Decimal,
    DataType::String,
    DataType::Binary,
    DataType::Date,
    DataType::Time,
    DataType::DateTime,
    DataType::DateTimeOffset,
    DataType::Guid,
];

// Shorthand aliases accepted in addition to the canonical names.
const ALIASES: &[(&str, DataType)] = &[
    ("bool", DataType::Boolean),
    ("short", DataType::Int16),
    ("int", DataType::Int32),
    ("integer", DataType::Int32),
    ("long", DataType::Int64),
    ("float", DataType::Single),
    ("uuid", DataType::Guid),
];

impl DataType {
    /// Resolves a canonical or shorthand type name, ignoring ASCII case.
    ///
    /// Returns `None` for unknown names; callers treat that as a hard error.
    #[must_use]
    pub fn resolve(name: &str) -> Option<DataType> {
        ALL.iter()
            .copied()
            .find(|t| t.canonical_name().eq_ignore_ascii_case(name))
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                    .map(|(_, t)| *t)
            })
    }

    /// The enumeration name, e.g. `Int32`.
    #[must_use]
    pub const fn canonical_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "Boolean",
            DataType::Byte => "Byte",
            DataType::Char => "Char",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Single => "Single",
            DataType::Double => "Double",
            DataType::Decimal => "Decimal",
            DataType::String => "String",
            DataType::Binary => "Binary",
            DataType::Date => "Date",
            DataType::Time => "Time",
            DataType::DateTime => "DateTime",
            DataType::DateTimeOffset => "DateTimeOffset",
            DataType::Guid => "Guid",
        }
    }

    /// The name used when writing a spec: a short lowercase name where one exists,
    /// otherwise the canonical name.
    #[must_use]
    pub const fn spec_name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int32 => "int",
            DataType::Double => "double",
            DataType::Decimal => "decimal",
            DataType::Boolean => "bool",
            other => other.canonical_name(),
        }
    }

    /// Whether a `[size]` is meaningful for this type.
    #[must_use]
    pub const fn is_length_bearing(&self) -> bool {
        matches!(self, DataType::String | DataType::Binary)
    }

    /// Whether values of this type are numeric.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Byte
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Single
                | DataType::Double
                | DataType::Decimal
        )
    }

    /// Iterates every data type in declaration order.
    pub fn all() -> impl Iterator<Item = DataType> {
        ALL.iter().copied()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for DataType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        DataType::resolve(s)
            .ok_or_else(|| crate::Error::invalid_spec(0, s, format!("unknown type '{}'", s)))
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical_name())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        DataType::resolve(&name)
            .ok_or_else(|| de::Error::custom(format!("unknown data type '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_aliases() {
        assert_eq!(DataType::resolve("bool"), Some(DataType::Boolean));
        assert_eq!(DataType::resolve("short"), Some(DataType::Int16));
        assert_eq!(DataType::resolve("int"), Some(DataType::Int32));
        assert_eq!(DataType::resolve("integer"), Some(DataType::Int32));
        assert_eq!(DataType::resolve("long"), Some(DataType::Int64));
        assert_eq!(DataType::resolve("float"), Some(DataType::Single));
    }

    #[test]
    fn test_canonical_names_case_insensitive() {
        for t in DataType::all() {
            assert_eq!(DataType::resolve(t.canonical_name()), Some(t));
            assert_eq!(DataType::resolve(&t.canonical_name().to_uppercase()), Some(t));
        }
    }

    #[test]
    fn test_spec_names_resolve_back() {
        for t in DataType::all() {
            assert_eq!(DataType::resolve(t.spec_name()), Some(t));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(DataType::resolve(""), None);
        assert_eq!(DataType::resolve("text"), None);
        assert!("text".parse::<DataType>().is_err());
    }

    #[test]
    fn test_length_bearing() {
        assert!(DataType::String.is_length_bearing());
        assert!(DataType::Binary.is_length_bearing());
        assert!(!DataType::Int32.is_length_bearing());
    }
}
