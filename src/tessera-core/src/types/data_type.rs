//! Data type definitions for column descriptors.

use serde::{Deserialize, Serialize};

/// Data type of a column or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Null type (unknown or absent).
    Null,
    /// Boolean type.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 text.
    Text,
    /// Binary data.
    Binary,
    /// Date (days since epoch).
    Date,
    /// Timestamp with microsecond precision.
    Timestamp,
}

impl DataType {
    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Float64)
    }

    /// Check if this type is a temporal type.
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Timestamp | Self::Date)
    }

    /// SQL-style name of this type.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool => "BOOLEAN",
            Self::Int32 => "INT",
            Self::Int64 => "BIGINT",
            Self::Float64 => "DOUBLE",
            Self::Text => "TEXT",
            Self::Binary => "BLOB",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Check if this type can be coerced to another type.
    pub fn can_coerce_to(&self, target: &Self) -> bool {
        if self == target {
            return true;
        }

        matches!(
            (self, target),
            (Self::Null, _)
                | (Self::Int32, Self::Int64 | Self::Float64)
                | (Self::Int64, Self::Float64)
                | (Self::Date, Self::Timestamp)
        )
    }

    /// Get the common supertype of two types.
    pub fn common_supertype(&self, other: &Self) -> Option<Self> {
        if self.can_coerce_to(other) {
            Some(*other)
        } else if other.can_coerce_to(self) {
            Some(*self)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
