//! Column definition for table schemas.

use crate::row::ColumnId;
use crate::types::DataType;
use alloc::string::String;

/// Whether a column is written by updates or derived from other columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Written by update payloads.
    Base,
    /// Derived by a computed column definition; read-only to updates.
    Computed,
}

/// A column definition in a table schema.
#[derive(Clone, Debug)]
pub struct Column {
    /// Column name.
    name: String,
    /// Data type of the column.
    data_type: DataType,
    /// Base or computed.
    kind: ColumnKind,
    /// Column index in the table (0-based).
    index: ColumnId,
}

impl Column {
    /// Creates a new base column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            kind: ColumnKind::Base,
            index: 0,
        }
    }

    /// Creates a new computed column definition.
    pub fn computed(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            kind: ColumnKind::Computed,
            ..Self::new(name, data_type)
        }
    }

    /// Sets the column index.
    pub(crate) fn with_index(mut self, index: ColumnId) -> Self {
        self.index = index;
        self
    }

    /// Returns the column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the column kind.
    #[inline]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Returns whether this column is derived.
    #[inline]
    pub fn is_computed(&self) -> bool {
        self.kind == ColumnKind::Computed
    }

    /// Returns the column index.
    #[inline]
    pub fn index(&self) -> ColumnId {
        self.index
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data_type == other.data_type && self.kind == other.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_new() {
        let col = Column::new("x", DataType::Int64);
        assert_eq!(col.name(), "x");
        assert_eq!(col.data_type(), DataType::Int64);
        assert_eq!(col.kind(), ColumnKind::Base);
        assert!(!col.is_computed());
    }

    #[test]
    fn test_column_computed() {
        let col = Column::computed("ratio", DataType::Float64).with_index(3);
        assert!(col.is_computed());
        assert_eq!(col.index(), 3);
        assert_ne!(col, Column::new("ratio", DataType::Float64));
    }
}
