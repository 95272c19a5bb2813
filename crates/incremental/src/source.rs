//! Read access to table rows.
//!
//! Pivot trees never own table data; they read it through `RowSource`, which
//! the column store implements. `MemorySource` is a row-major implementation
//! for tests and benchmarks.

use alloc::vec::Vec;
use pivotal_core::{ColumnId, Epoch, RowIndex, Value};

/// Immutable view of a table snapshot.
pub trait RowSource {
    /// Returns the number of rows.
    fn row_count(&self) -> usize;

    /// Reads one slot. Out-of-range reads return `Value::Null`.
    fn value(&self, column: ColumnId, row: RowIndex) -> Value;

    /// Returns the epoch of the batch that last touched the row.
    fn epoch(&self, row: RowIndex) -> Epoch;
}

/// Row-major in-memory rows.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    rows: Vec<Vec<Value>>,
    epochs: Vec<Epoch>,
}

impl MemorySource {
    /// Creates a source from rows, all stamped with epoch 1.
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        let epochs = alloc::vec![1; rows.len()];
        Self { rows, epochs }
    }

    /// Appends a row stamped with `epoch`, returning its index.
    pub fn push(&mut self, row: Vec<Value>, epoch: Epoch) -> RowIndex {
        self.rows.push(row);
        self.epochs.push(epoch);
        self.rows.len() - 1
    }

    /// Overwrites one slot and restamps the row.
    pub fn set(&mut self, column: ColumnId, row: RowIndex, value: Value, epoch: Epoch) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *slot = value;
            self.epochs[row] = epoch;
        }
    }
}

impl RowSource for MemorySource {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, column: ColumnId, row: RowIndex) -> Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn epoch(&self, row: RowIndex) -> Epoch {
        self.epochs.get(row).copied().unwrap_or(0)
    }
}
