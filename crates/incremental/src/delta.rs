//! Change-sets produced by update batches.
//!
//! A change-set records which `(row, column)` cells a batch actually changed,
//! and which rows it inserted. It is the only input the computed column engine
//! and the pivot trees need to bring themselves up to date.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use pivotal_core::{ColumnId, Epoch, RowIndex};

/// Changes recorded for one row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowChange {
    inserted: bool,
    columns: BTreeSet<ColumnId>,
}

impl RowChange {
    /// Returns true if the row was appended by this batch.
    #[inline]
    pub fn is_inserted(&self) -> bool {
        self.inserted
    }

    /// Returns the columns whose value changed.
    #[inline]
    pub fn columns(&self) -> &BTreeSet<ColumnId> {
        &self.columns
    }

    /// Returns true if the row is new or any of `columns` changed.
    pub fn touches(&self, columns: &[ColumnId]) -> bool {
        self.inserted || columns.iter().any(|c| self.columns.contains(c))
    }
}

/// The set of cells touched by one update batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    epoch: Epoch,
    rows: BTreeMap<RowIndex, RowChange>,
}

impl ChangeSet {
    /// Creates an empty change-set for the batch with the given epoch.
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            rows: BTreeMap::new(),
        }
    }

    /// Returns the epoch of the batch.
    #[inline]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Records an appended row.
    pub fn record_insert(&mut self, row: RowIndex) {
        self.rows.entry(row).or_default().inserted = true;
    }

    /// Records a changed cell.
    pub fn record_cell(&mut self, row: RowIndex, column: ColumnId) {
        self.rows.entry(row).or_default().columns.insert(column);
    }

    /// Returns true if nothing changed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows touched.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of changed cells.
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.columns.len()).sum()
    }

    /// Iterates touched rows in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = (RowIndex, &RowChange)> + '_ {
        self.rows.iter().map(|(row, change)| (*row, change))
    }

    /// Gets the change recorded for a row.
    pub fn row(&self, row: RowIndex) -> Option<&RowChange> {
        self.rows.get(&row)
    }

    /// Returns the rows appended by the batch.
    pub fn inserted_rows(&self) -> Vec<RowIndex> {
        self.rows
            .iter()
            .filter(|(_, change)| change.inserted)
            .map(|(row, _)| *row)
            .collect()
    }

    /// Returns every column changed in at least one row.
    pub fn changed_columns(&self) -> BTreeSet<ColumnId> {
        self.rows
            .values()
            .flat_map(|change| change.columns.iter().copied())
            .collect()
    }

    /// Returns true if any row was inserted or any of `columns` changed.
    pub fn touches_any(&self, columns: &[ColumnId]) -> bool {
        self.rows.values().any(|change| change.touches(columns))
    }

    /// Returns the rows that were inserted or had one of `columns` changed.
    pub fn rows_touching(&self, columns: &[ColumnId]) -> Vec<RowIndex> {
        self.rows
            .iter()
            .filter(|(_, change)| change.touches(columns))
            .map(|(row, _)| *row)
            .collect()
    }

    /// Merges another change-set into this one, keeping the later epoch.
    pub fn merge(&mut self, other: ChangeSet) {
        self.epoch = self.epoch.max(other.epoch);
        for (row, change) in other.rows {
            let entry = self.rows.entry(row).or_default();
            entry.inserted |= change.inserted;
            entry.columns.extend(change.columns);
        }
    }
}
