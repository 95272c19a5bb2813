//! Undo journal for update batches.
//!
//! Every mutation a transaction makes to a `ColumnStore` is recorded here
//! first. Rolling back replays the entries in reverse, restoring values,
//! epochs, the key index and the row count.

use crate::column_store::ColumnStore;
use alloc::vec::Vec;
use pivotal_core::{ColumnId, Epoch, Result, RowIndex, Value};

/// A single undoable mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum JournalEntry {
    /// A row was appended at `row`.
    Append { row: RowIndex },
    /// A slot was overwritten; `old` is its previous value.
    Write {
        column: ColumnId,
        row: RowIndex,
        old: Value,
    },
    /// A row was restamped; `old` is its previous epoch.
    Epoch { row: RowIndex, old: Epoch },
}

impl JournalEntry {
    /// Returns the row this entry touched.
    pub fn row(&self) -> RowIndex {
        match self {
            JournalEntry::Append { row } => *row,
            JournalEntry::Write { row, .. } => *row,
            JournalEntry::Epoch { row, .. } => *row,
        }
    }
}

/// Ordered undo log.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Creates a new empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an appended row.
    pub fn record_append(&mut self, row: RowIndex) {
        self.entries.push(JournalEntry::Append { row });
    }

    /// Records an overwritten slot.
    pub fn record_write(&mut self, column: ColumnId, row: RowIndex, old: Value) {
        self.entries.push(JournalEntry::Write { column, row, old });
    }

    /// Records a restamped row.
    pub fn record_epoch(&mut self, row: RowIndex, old: Epoch) {
        self.entries.push(JournalEntry::Epoch { row, old });
    }

    /// Returns all journal entries.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards the log, keeping every change.
    pub fn commit(&mut self) -> Vec<JournalEntry> {
        core::mem::take(&mut self.entries)
    }

    /// Undoes every recorded change, newest first.
    pub fn rollback(&mut self, store: &mut ColumnStore) -> Result<()> {
        while let Some(entry) = self.entries.pop() {
            match entry {
                JournalEntry::Append { row } => store.truncate(row),
                JournalEntry::Write { column, row, old } => {
                    // Slots of rows appended in this batch vanish with the append.
                    if row < store.len() {
                        store.restore(column, row, old)?;
                    }
                }
                JournalEntry::Epoch { row, old } => {
                    store.set_epoch(row, old);
                }
            }
        }
        Ok(())
    }
}
