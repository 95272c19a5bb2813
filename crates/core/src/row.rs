//! Row identity and update payloads.
//!
//! Rows are addressed by their stable position in the column store. A
//! `Payload` is one entry of an update batch: the fields it lists, and an
//! optional positional marker naming the row it targets.

use crate::value::Value;
use alloc::string::String;
use alloc::vec::Vec;

/// Stable position of a row in a table.
pub type RowIndex = usize;

/// Position of a column in a table schema.
pub type ColumnId = usize;

/// Sequence number of an update batch. Every row remembers the epoch of the
/// last batch that inserted it or changed one of its cells.
pub type Epoch = u64;

/// Reserved payload and record field addressing a row by position.
pub const INDEX_FIELD: &str = "__INDEX__";

/// Reserved record field carrying a group's key path.
pub const ROW_PATH_FIELD: &str = "__ROW_PATH__";

/// A partial or full row in an update batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    /// Listed fields, in arrival order.
    fields: Vec<(String, Value)>,
    /// Positional marker (`__INDEX__`), honoured when the table has no primary key.
    index: Option<RowIndex>,
}

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a payload from `(column, value)` pairs.
    pub fn from_fields<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            index: None,
        }
    }

    /// Adds a field. A later field with the same name overrides an earlier one.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Targets the row at `index`.
    pub fn at(mut self, index: RowIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Sets a field in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Sets the positional marker in place.
    pub fn set_index(&mut self, index: Option<RowIndex>) {
        self.index = index;
    }

    /// Returns the positional marker.
    #[inline]
    pub fn index(&self) -> Option<RowIndex> {
        self.index
    }

    /// Returns the listed fields.
    #[inline]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Gets a listed field by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the number of listed fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is listed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
