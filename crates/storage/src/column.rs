//! Typed column buffers.

use alloc::string::String;
use alloc::vec::Vec;
use pivotal_core::{DataType, Error, Result, RowIndex, Value};

/// One column's slots, stored by type. Every slot is nullable.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Boolean(Vec<Option<bool>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Date(Vec<Option<i32>>),
    DateTime(Vec<Option<i64>>),
}

macro_rules! each_column {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            ColumnData::Boolean($v) => $body,
            ColumnData::Int64($v) => $body,
            ColumnData::Float64($v) => $body,
            ColumnData::String($v) => $body,
            ColumnData::Date($v) => $body,
            ColumnData::DateTime($v) => $body,
        }
    };
}

impl ColumnData {
    /// Creates an empty column of the given type.
    pub fn new(data_type: DataType) -> Self {
        Self::with_nulls(data_type, 0)
    }

    /// Creates a column of `len` null slots.
    pub fn with_nulls(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Boolean => ColumnData::Boolean(alloc::vec![None; len]),
            DataType::Int64 => ColumnData::Int64(alloc::vec![None; len]),
            DataType::Float64 => ColumnData::Float64(alloc::vec![None; len]),
            DataType::String => ColumnData::String(alloc::vec![None; len]),
            DataType::Date => ColumnData::Date(alloc::vec![None; len]),
            DataType::DateTime => ColumnData::DateTime(alloc::vec![None; len]),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::String(_) => DataType::String,
            ColumnData::Date(_) => DataType::Date,
            ColumnData::DateTime(_) => DataType::DateTime,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        each_column!(self, v => v.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads one slot. Out-of-range reads are null.
    pub fn get(&self, row: RowIndex) -> Value {
        match self {
            ColumnData::Boolean(v) => v.get(row).copied().flatten().into(),
            ColumnData::Int64(v) => v.get(row).copied().flatten().into(),
            ColumnData::Float64(v) => v.get(row).copied().flatten().into(),
            ColumnData::String(v) => v.get(row).cloned().flatten().into(),
            ColumnData::Date(v) => match v.get(row).copied().flatten() {
                Some(days) => Value::Date(days),
                None => Value::Null,
            },
            ColumnData::DateTime(v) => match v.get(row).copied().flatten() {
                Some(ms) => Value::DateTime(ms),
                None => Value::Null,
            },
        }
    }

    /// Appends a null slot.
    pub fn push_null(&mut self) {
        each_column!(self, v => v.push(None))
    }

    /// Drops every slot at or after `len`.
    pub fn truncate(&mut self, len: usize) {
        each_column!(self, v => v.truncate(len))
    }

    /// Stores an already coerced value, returning the previous one.
    ///
    /// The value must be null or match the column type.
    pub fn set(&mut self, column: &str, row: RowIndex, value: Value) -> Result<Value> {
        if row >= self.len() {
            return Err(Error::invalid_operation(alloc::format!(
                "row {} out of range for column {}",
                row,
                column
            )));
        }
        let old = self.get(row);
        match (self, value) {
            (ColumnData::Boolean(v), Value::Boolean(x)) => v[row] = Some(x),
            (ColumnData::Int64(v), Value::Int64(x)) => v[row] = Some(x),
            (ColumnData::Float64(v), Value::Float64(x)) => v[row] = Some(x),
            (ColumnData::String(v), Value::String(x)) => v[row] = Some(x),
            (ColumnData::Date(v), Value::Date(x)) => v[row] = Some(x),
            (ColumnData::DateTime(v), Value::DateTime(x)) => v[row] = Some(x),
            (data, Value::Null) => each_column!(data, v => v[row] = None),
            (data, other) => return Err(Error::type_mismatch(column, data.data_type(), other)),
        }
        Ok(old)
    }
}
