//! Update transactions.
//!
//! A `Transaction` borrows a `ColumnStore` exclusively for one update batch.
//! It resolves each payload to its target row, writes the listed fields,
//! journals every mutation and records the cells that actually changed.
//! Committing yields the batch's `ChangeSet`; rolling back restores the store
//! exactly.

use crate::column_store::ColumnStore;
use crate::journal::Journal;
use alloc::vec::Vec;
use pivotal_core::{ColumnId, Epoch, Error, Payload, Result, RowIndex, Value};
use pivotal_incremental::ChangeSet;

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// One update batch in progress.
pub struct Transaction<'a> {
    store: &'a mut ColumnStore,
    journal: Journal,
    changes: ChangeSet,
    state: TransactionState,
    restamp: bool,
}

impl<'a> Transaction<'a> {
    /// Begins a batch stamped with `epoch`.
    pub fn begin(store: &'a mut ColumnStore, epoch: Epoch) -> Self {
        Self {
            store,
            journal: Journal::new(),
            changes: ChangeSet::new(epoch),
            state: TransactionState::Active,
            restamp: true,
        }
    }

    /// Begins a batch that fills slots without restamping rows, so member
    /// order in views is unaffected. Used to populate new computed columns.
    pub fn backfill(store: &'a mut ColumnStore, epoch: Epoch) -> Self {
        Self {
            restamp: false,
            ..Self::begin(store, epoch)
        }
    }

    #[inline]
    pub fn epoch(&self) -> Epoch {
        self.changes.epoch()
    }

    /// Read access to the store, including this batch's writes.
    #[inline]
    pub fn store(&self) -> &ColumnStore {
        self.store
    }

    /// Changes recorded so far.
    #[inline]
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    #[inline]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::invalid_operation("Transaction is not active"));
        }
        Ok(())
    }

    /// Applies one payload and returns the row it landed on.
    ///
    /// Keyed tables match the payload's key field, inserting on a miss.
    /// Unkeyed tables honor the positional `__INDEX__` marker, appending when
    /// it is absent. Only the listed fields are written.
    pub fn apply_payload(&mut self, payload: &Payload) -> Result<RowIndex> {
        self.check_active()?;
        let targets = self.resolve_fields(payload)?;
        let row = self.resolve_row(payload)?;
        for (column, value) in targets {
            self.write_cell(column, row, value)?;
        }
        Ok(row)
    }

    /// Applies payloads strictly in order.
    pub fn apply_all(&mut self, payloads: &[Payload]) -> Result<Vec<RowIndex>> {
        payloads.iter().map(|p| self.apply_payload(p)).collect()
    }

    /// Maps payload fields to writable columns.
    fn resolve_fields(&self, payload: &Payload) -> Result<Vec<(ColumnId, Value)>> {
        let schema = self.store.schema();
        payload
            .fields()
            .iter()
            .map(|(name, value)| {
                let column = schema.resolve(name)?;
                if column.is_computed() {
                    return Err(Error::read_only(name.as_str()));
                }
                Ok((column.index(), value.clone()))
            })
            .collect()
    }

    fn resolve_row(&mut self, payload: &Payload) -> Result<RowIndex> {
        let store_name = self.store.name();
        if let Some(pk) = self.store.schema().primary_key() {
            let key = match payload.get(pk.name()) {
                Some(key) if !key.is_null() => key.clone().coerce(pk.name(), pk.data_type())?,
                _ => return Err(Error::missing_key(store_name, pk.name())),
            };
            return match self.store.lookup(&key) {
                Some(row) => Ok(row),
                None => self.append_row(),
            };
        }

        match payload.index() {
            Some(row) if row < self.store.len() => Ok(row),
            Some(row) => Err(Error::row_not_found(store_name, Value::Int64(row as i64))),
            None => self.append_row(),
        }
    }

    /// Appends an empty row stamped with this batch's epoch.
    pub fn append_row(&mut self) -> Result<RowIndex> {
        self.check_active()?;
        let row = self.store.append_row();
        self.journal.record_append(row);
        self.changes.record_insert(row);
        self.touch(row);
        Ok(row)
    }

    /// Writes one cell. Returns true if its value changed.
    pub fn write_cell(&mut self, column: ColumnId, row: RowIndex, value: Value) -> Result<bool> {
        self.check_active()?;
        match self.store.write(column, row, value)? {
            Some(old) => {
                self.journal.record_write(column, row, old);
                self.changes.record_cell(row, column);
                self.touch(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn touch(&mut self, row: RowIndex) {
        let epoch = self.changes.epoch();
        if self.restamp && self.store.row_epoch(row) != epoch {
            let old = self.store.set_epoch(row, epoch);
            self.journal.record_epoch(row, old);
        }
    }

    /// Commits the batch and returns its change-set.
    pub fn commit(mut self) -> Result<ChangeSet> {
        self.check_active()?;
        self.state = TransactionState::Committed;
        self.journal.commit();
        Ok(core::mem::take(&mut self.changes))
    }

    /// Undoes every write made by the batch.
    pub fn rollback(mut self) -> Result<()> {
        self.check_active()?;
        self.state = TransactionState::RolledBack;
        self.journal.rollback(self.store)
    }
}
