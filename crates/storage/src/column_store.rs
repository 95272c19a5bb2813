//! Column storage for one table.
//!
//! `ColumnStore` owns a table's schema, one typed buffer per column, the
//! per-row epochs, and the primary-key index. All columns share one row count.

use crate::column::ColumnData;
use alloc::vec::Vec;
use hashbrown::HashMap;
use pivotal_core::schema::{Column, TableSchema};
use pivotal_core::{ColumnId, Epoch, Error, Result, RowIndex, Value};
use pivotal_incremental::RowSource;

/// Columnar storage for a single table.
#[derive(Clone, Debug)]
pub struct ColumnStore {
    schema: TableSchema,
    columns: Vec<ColumnData>,
    epochs: Vec<Epoch>,
    /// Primary-key value -> row.
    key_index: HashMap<Value, RowIndex>,
}

impl ColumnStore {
    /// Creates an empty store for `schema`.
    pub fn new(schema: TableSchema) -> Self {
        let columns = schema
            .columns()
            .iter()
            .map(|c| ColumnData::new(c.data_type()))
            .collect();
        Self {
            schema,
            columns,
            epochs: Vec::new(),
            key_index: HashMap::new(),
        }
    }

    #[inline]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Returns the primary-key column id, if any.
    pub fn primary_key(&self) -> Option<ColumnId> {
        self.schema.primary_key().map(Column::index)
    }

    pub fn column(&self, id: ColumnId) -> Option<&ColumnData> {
        self.columns.get(id)
    }

    /// Reads one slot.
    pub fn get(&self, column: ColumnId, row: RowIndex) -> Value {
        self.columns
            .get(column)
            .map(|c| c.get(row))
            .unwrap_or(Value::Null)
    }

    /// Reads a whole row in schema order.
    pub fn row(&self, row: RowIndex) -> Vec<Value> {
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    /// Finds the row holding a primary-key value.
    pub fn lookup(&self, key: &Value) -> Option<RowIndex> {
        self.key_index.get(key).copied()
    }

    /// Returns the epoch of a row.
    pub fn row_epoch(&self, row: RowIndex) -> Epoch {
        self.epochs.get(row).copied().unwrap_or(0)
    }

    /// Appends a row of nulls with epoch 0 and returns its index.
    pub fn append_row(&mut self) -> RowIndex {
        for column in &mut self.columns {
            column.push_null();
        }
        self.epochs.push(0);
        self.epochs.len() - 1
    }

    /// Drops every row at or after `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        if let Some(pk) = self.primary_key() {
            for row in len..self.len() {
                let key = self.get(pk, row);
                if self.key_index.get(&key) == Some(&row) {
                    self.key_index.remove(&key);
                }
            }
        }
        for column in &mut self.columns {
            column.truncate(len);
        }
        self.epochs.truncate(len);
    }

    /// Coerces and writes one slot.
    ///
    /// Returns the previous value when the slot changed, `None` when the new
    /// value equals the stored one.
    pub fn write(&mut self, column: ColumnId, row: RowIndex, value: Value) -> Result<Option<Value>> {
        let (name, data_type) = {
            let col = self
                .schema
                .column(column)
                .ok_or_else(|| Error::invalid_operation(alloc::format!("unknown column id {}", column)))?;
            (col.name(), col.data_type())
        };
        let value = value.coerce(name, data_type)?;
        let current = self.get(column, row);
        if row < self.len() && same_slot(&current, &value) {
            return Ok(None);
        }
        self.restore(column, row, value).map(Some)
    }

    /// Writes a value without coercion or change detection, keeping the key
    /// index in sync. Used to undo writes.
    pub fn restore(&mut self, column: ColumnId, row: RowIndex, value: Value) -> Result<Value> {
        let is_key = self.primary_key() == Some(column);
        let name = self
            .schema
            .column(column)
            .map(|c| c.name())
            .unwrap_or_default();
        let data = self
            .columns
            .get_mut(column)
            .ok_or_else(|| Error::invalid_operation(alloc::format!("unknown column id {}", column)))?;
        let new_key = if is_key { Some(value.clone()) } else { None };
        let old = data.set(name, row, value)?;

        if let Some(new_key) = new_key {
            if self.key_index.get(&old) == Some(&row) {
                self.key_index.remove(&old);
            }
            if !new_key.is_null() {
                self.key_index.insert(new_key, row);
            }
        }
        Ok(old)
    }

    /// Restamps a row, returning the previous epoch.
    pub fn set_epoch(&mut self, row: RowIndex, epoch: Epoch) -> Epoch {
        match self.epochs.get_mut(row) {
            Some(slot) => core::mem::replace(slot, epoch),
            None => 0,
        }
    }

    /// Adds a column of nulls to the schema and storage.
    pub fn add_column(&mut self, column: Column) -> Result<ColumnId> {
        let data_type = column.data_type();
        let id = self.schema.add_column(column)?;
        self.columns.push(ColumnData::with_nulls(data_type, self.len()));
        Ok(id)
    }

    /// Removes the most recently added column.
    pub fn pop_column(&mut self) -> Option<Column> {
        let column = self.schema.pop_column()?;
        self.columns.pop();
        Some(column)
    }
}

/// Slot equality for change detection: NaN matches NaN and 0.0 matches -0.0,
/// but an integer never matches a float.
fn same_slot(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float64(x), Value::Float64(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a.data_type() == b.data_type() && a == b,
    }
}

impl RowSource for ColumnStore {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn value(&self, column: ColumnId, row: RowIndex) -> Value {
        self.get(column, row)
    }

    fn epoch(&self, row: RowIndex) -> Epoch {
        self.row_epoch(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use pivotal_core::schema::SchemaBuilder;
    use pivotal_core::DataType;

    fn keyed_schema() -> TableSchema {
        SchemaBuilder::new("orders")
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("amount", DataType::Float64)
            .unwrap()
            .add_primary_key("id")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_append_and_read() {
        let mut store = ColumnStore::new(keyed_schema());
        let row = store.append_row();
        assert_eq!(row, 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.row(0), vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_write_coerces() {
        let mut store = ColumnStore::new(keyed_schema());
        store.append_row();
        let old = store.write(1, 0, Value::Int64(3)).unwrap();
        assert_eq!(old, Some(Value::Null));
        assert_eq!(store.get(1, 0), Value::Float64(3.0));
    }

    #[test]
    fn test_write_same_value_is_noop() {
        let mut store = ColumnStore::new(keyed_schema());
        store.append_row();
        store.write(1, 0, Value::Float64(2.5)).unwrap();
        assert_eq!(store.write(1, 0, Value::Float64(2.5)).unwrap(), None);
    }

    #[test]
    fn test_write_rejects_incompatible() {
        let mut store = ColumnStore::new(keyed_schema());
        store.append_row();
        let err = store.write(1, 0, Value::from("lots")).unwrap_err();
        assert_eq!(err.kind(), pivotal_core::ErrorKind::Type);
        assert_eq!(store.get(1, 0), Value::Null);
    }

    #[test]
    fn test_key_index() {
        let mut store = ColumnStore::new(keyed_schema());
        store.append_row();
        store.write(0, 0, Value::Int64(7)).unwrap();
        assert_eq!(store.lookup(&Value::Int64(7)), Some(0));

        store.write(0, 0, Value::Int64(8)).unwrap();
        assert_eq!(store.lookup(&Value::Int64(7)), None);
        assert_eq!(store.lookup(&Value::Int64(8)), Some(0));
    }

    #[test]
    fn test_truncate_drops_keys() {
        let mut store = ColumnStore::new(keyed_schema());
        for key in 0..3 {
            let row = store.append_row();
            store.write(0, row, Value::Int64(key)).unwrap();
        }
        store.truncate(1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(&Value::Int64(0)), Some(0));
        assert_eq!(store.lookup(&Value::Int64(2)), None);
    }

    #[test]
    fn test_add_and_pop_column() {
        let mut store = ColumnStore::new(keyed_schema());
        store.append_row();
        let id = store
            .add_column(Column::computed("double", DataType::Float64))
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(store.column(id).unwrap().len(), 1);

        let popped = store.pop_column().unwrap();
        assert_eq!(popped.name(), "double");
        assert_eq!(store.schema().len(), 2);
    }

    #[test]
    fn test_epochs() {
        let mut store = ColumnStore::new(keyed_schema());
        store.append_row();
        assert_eq!(store.row_epoch(0), 0);
        assert_eq!(store.set_epoch(0, 4), 0);
        assert_eq!(RowSource::epoch(&store, 0), 4);
    }
}
