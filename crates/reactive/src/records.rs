//! Flattening views into records.
//!
//! A pivoted view flattens depth-first: the root first, then each group
//! followed by its subgroups, siblings in display order. Every record carries
//! its group key path under `__ROW_PATH__`, one aggregate per output column,
//! and optionally the group's member rows under `__INDEX__`, most recently
//! written first.
//!
//! A flat view emits one record per table row with the raw values and no
//! key path.

use crate::view::View;
use pivotal_core::{Error, Result, RowIndex, Value, INDEX_FIELD, ROW_PATH_FIELD};
use pivotal_incremental::RowSource;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Serialization options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Include `__INDEX__` in every record.
    pub index: bool,
    /// First record to emit.
    pub start_row: Option<usize>,
    /// One past the last record to emit.
    pub end_row: Option<usize>,
}

impl SerializeOptions {
    pub fn with_index() -> Self {
        Self {
            index: true,
            ..Self::default()
        }
    }

    pub fn window(mut self, start_row: usize, end_row: usize) -> Self {
        self.start_row = Some(start_row);
        self.end_row = Some(end_row);
        self
    }

    fn range(&self, len: usize) -> std::ops::Range<usize> {
        let end = self.end_row.unwrap_or(len).min(len);
        let start = self.start_row.unwrap_or(0).min(end);
        start..end
    }
}

/// One flattened view row.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub row_path: Option<Vec<Value>>,
    pub values: Vec<(String, Value)>,
    pub index: Option<Vec<RowIndex>>,
}

impl Record {
    /// Gets an output column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn row_path(&self) -> Option<&[Value]> {
        self.row_path.as_deref()
    }

    pub fn index(&self) -> Option<&[RowIndex]> {
        self.index.as_deref()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.values.len() + self.row_path.is_some() as usize + self.index.is_some() as usize;
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(path) = &self.row_path {
            map.serialize_entry(ROW_PATH_FIELD, path)?;
        }
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        if let Some(index) = &self.index {
            map.serialize_entry(INDEX_FIELD, index)?;
        }
        map.end()
    }
}

/// Flattens a view over the current table state.
pub fn to_records(view: &View, source: &dyn RowSource, options: &SerializeOptions) -> Vec<Record> {
    if view.is_flat() {
        return options
            .range(source.row_count())
            .map(|row| Record {
                row_path: None,
                values: view
                    .columns()
                    .iter()
                    .map(|c| (c.name.clone(), source.value(c.column, row)))
                    .collect(),
                index: options.index.then(|| vec![row]),
            })
            .collect();
    }

    let tree = view.tree();
    let groups: Vec<_> = tree
        .walk()
        .into_iter()
        .filter(|&id| tree.node(id).map(|n| !n.is_empty()).unwrap_or(false))
        .collect();

    groups[options.range(groups.len())]
        .iter()
        .filter_map(|&id| {
            let node = tree.node(id)?;
            Some(Record {
                row_path: Some(tree.path(id)),
                values: view
                    .columns()
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(node.aggregate_values())
                    .collect(),
                index: options.index.then(|| tree.ordered_members(id, source)),
            })
        })
        .collect()
}

/// Renders records as a JSON array of objects.
pub fn to_json(records: &[Record]) -> Result<serde_json::Value> {
    serde_json::to_value(records).map_err(|e| Error::invalid_operation(e.to_string()))
}
