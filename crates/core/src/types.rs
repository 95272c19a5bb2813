//! Data type definitions for the Pivotal table engine.
//!
//! This module defines the column types a table schema may declare.

use crate::error::{Error, Result};
use core::fmt;
use core::str::FromStr;

/// Supported column types.
///
/// The textual names (`integer`, `float`, ...) are the ones accepted in
/// explicit schemas and computed column definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Calendar date stored as days since the Unix epoch
    Date,
    /// Date and time stored as Unix timestamp (milliseconds)
    DateTime,
}

impl DataType {
    /// Returns the schema name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int64 => "integer",
            DataType::Float64 => "float",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
        }
    }

    /// Returns whether values of this type take part in arithmetic.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Returns whether pivot keys of this type order by value.
    ///
    /// String keys are the only ones grouped in first-seen order.
    #[inline]
    pub fn is_ordered_key(&self) -> bool {
        !matches!(self, DataType::String)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "boolean" => Ok(DataType::Boolean),
            "integer" => Ok(DataType::Int64),
            "float" => Ok(DataType::Float64),
            "string" => Ok(DataType::String),
            "date" => Ok(DataType::Date),
            "datetime" => Ok(DataType::DateTime),
            other => Err(Error::invalid_schema(alloc::format!("Unknown type: {}", other))),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let name = <alloc::string::String as serde::Deserialize>::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
