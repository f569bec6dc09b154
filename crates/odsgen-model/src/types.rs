//! Scalar data types shared by the metamodel and the relational output.

use rkyv::Archive;
use serde::{Deserialize, Serialize};

/// Scalar types a simple property or a column can carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    Serialize,
    Deserialize,
)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScalarType {
    /// True/false flag.
    Boolean,
    /// Monetary amount.
    Currency,
    /// Calendar date.
    Date,
    /// Date and time of day.
    DateTime,
    /// Fixed-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Digits after the decimal point.
        scale: u8,
    },
    /// Time span.
    Duration,
    /// 32-bit integer.
    Integer,
    /// 16-bit integer.
    SmallInteger,
    /// 64-bit integer.
    BigInteger,
    /// Percentage stored as a fraction.
    Percent,
    /// Variable-length string.
    String {
        /// Maximum length in characters.
        max_length: u32,
    },
    /// Time of day.
    Time,
    /// Calendar year.
    Year,
    /// 128-bit unique identifier.
    Uuid,
}

impl ScalarType {
    /// Create a string type with the given maximum length.
    pub fn string(max_length: u32) -> Self {
        ScalarType::String { max_length }
    }

    /// Create a decimal type.
    pub fn decimal(precision: u8, scale: u8) -> Self {
        ScalarType::Decimal { precision, scale }
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Currency
                | ScalarType::Decimal { .. }
                | ScalarType::Integer
                | ScalarType::SmallInteger
                | ScalarType::BigInteger
                | ScalarType::Percent
                | ScalarType::Year
        )
    }

    /// Check if this type is a temporal type.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ScalarType::Date | ScalarType::DateTime | ScalarType::Time | ScalarType::Duration
        )
    }

    /// Maximum length for string types.
    pub fn max_length(&self) -> Option<u32> {
        match self {
            ScalarType::String { max_length } => Some(*max_length),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Boolean => write!(f, "boolean"),
            ScalarType::Currency => write!(f, "currency"),
            ScalarType::Date => write!(f, "date"),
            ScalarType::DateTime => write!(f, "datetime"),
            ScalarType::Decimal { precision, scale } => write!(f, "decimal({precision}, {scale})"),
            ScalarType::Duration => write!(f, "duration"),
            ScalarType::Integer => write!(f, "integer"),
            ScalarType::SmallInteger => write!(f, "smallint"),
            ScalarType::BigInteger => write!(f, "bigint"),
            ScalarType::Percent => write!(f, "percent"),
            ScalarType::String { max_length } => write!(f, "string({max_length})"),
            ScalarType::Time => write!(f, "time"),
            ScalarType::Year => write!(f, "year"),
            ScalarType::Uuid => write!(f, "uuid"),
        }
    }
}
