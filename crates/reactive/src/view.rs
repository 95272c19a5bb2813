//! Views over a table.
//!
//! A `View` resolves its `ViewConfig` against the table schema, owns the
//! resulting `PivotTree` and keeps it current from the change-sets routed to
//! it by the registry.

use crate::config::ViewConfig;
use crate::records::{self, Record, SerializeOptions};
use crate::subscription::{SubscriptionId, SubscriptionManager};
use crate::update::{ViewId, ViewUpdate};
use log::trace;
use pivotal_core::schema::TableSchema;
use pivotal_core::{ColumnId, DataType, Result};
use pivotal_incremental::{Aggregate, ChangeSet, OutputColumn, PivotTree, RowSource};
use std::collections::BTreeSet;

/// One output column of a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewColumn {
    pub name: String,
    pub column: ColumnId,
    pub aggregate: Aggregate,
    /// Type of the table column read.
    pub data_type: DataType,
}

impl ViewColumn {
    /// Type of the values this column shows in a pivoted view.
    pub fn result_type(&self) -> DataType {
        self.aggregate.result_type(self.data_type)
    }
}

pub struct View {
    id: ViewId,
    config: ViewConfig,
    pivots: Vec<ColumnId>,
    columns: Vec<ViewColumn>,
    tree: PivotTree,
    /// Columns read, directly or through computed columns.
    dependencies: Vec<ColumnId>,
    subscriptions: SubscriptionManager,
}

impl View {
    /// Resolves `config` and builds the initial tree.
    ///
    /// `upstream` expands a column set with everything it is derived from.
    pub fn new(
        id: ViewId,
        config: ViewConfig,
        schema: &TableSchema,
        source: &dyn RowSource,
        upstream: &dyn Fn(&[ColumnId]) -> BTreeSet<ColumnId>,
    ) -> Result<Self> {
        let pivots = config
            .row_pivots
            .iter()
            .map(|name| schema.resolve(name).map(|c| c.index()))
            .collect::<Result<Vec<_>>>()?;

        let names: Vec<String> = match &config.columns {
            Some(columns) => columns.clone(),
            None => schema.column_names().into_iter().map(String::from).collect(),
        };
        for name in config.aggregates.keys() {
            schema.resolve(name)?;
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let column = schema.resolve(&name)?;
            let aggregate = match config.aggregates.get(&name) {
                Some(aggregate) => aggregate.parse::<Aggregate>()?,
                None => Aggregate::default_for(column.data_type()),
            };
            aggregate.check(&name, column.data_type())?;
            columns.push(ViewColumn {
                column: column.index(),
                aggregate,
                data_type: column.data_type(),
                name,
            });
        }

        let read: Vec<ColumnId> = pivots
            .iter()
            .copied()
            .chain(columns.iter().map(|c| c.column))
            .collect();
        let dependencies = upstream(&read).into_iter().collect();

        let outputs = columns
            .iter()
            .map(|c| OutputColumn::new(c.column, c.aggregate, c.data_type))
            .collect();
        let tree = PivotTree::build(pivots.clone(), outputs, source);

        Ok(Self {
            id,
            config,
            pivots,
            columns,
            tree,
            dependencies,
            subscriptions: SubscriptionManager::new(),
        })
    }

    #[inline]
    pub fn id(&self) -> ViewId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.pivots.is_empty()
    }

    #[inline]
    pub fn columns(&self) -> &[ViewColumn] {
        &self.columns
    }

    #[inline]
    pub fn tree(&self) -> &PivotTree {
        &self.tree
    }

    /// Columns whose changes can affect this view.
    #[inline]
    pub fn dependencies(&self) -> &[ColumnId] {
        &self.dependencies
    }

    pub fn depends_on(&self, column: ColumnId) -> bool {
        self.dependencies.contains(&column)
    }

    /// Output column name to the type of the values it shows.
    pub fn schema(&self) -> Vec<(String, DataType)> {
        self.columns
            .iter()
            .map(|c| {
                let data_type = if self.is_flat() {
                    c.data_type
                } else {
                    c.result_type()
                };
                (c.name.clone(), data_type)
            })
            .collect()
    }

    /// Number of records `to_records` emits without a window.
    pub fn num_rows(&self, source: &dyn RowSource) -> usize {
        if self.is_flat() {
            source.row_count()
        } else if self.tree.root().is_empty() {
            0
        } else {
            self.tree.group_count()
        }
    }

    /// Brings the tree up to date with one batch and notifies subscribers.
    pub fn on_table_change(
        &mut self,
        changes: &ChangeSet,
        source: &dyn RowSource,
    ) -> Option<ViewUpdate> {
        if !changes.touches_any(&self.dependencies) {
            return None;
        }
        let delta = self.tree.apply(changes, source);
        if delta.is_empty() {
            return None;
        }
        trace!(
            "view {} refreshed {} rows ({} groups created, {} removed)",
            self.id,
            delta.rows.len(),
            delta.groups_created,
            delta.groups_removed
        );
        let update = ViewUpdate::from_delta(self.id, changes.epoch(), delta);
        self.subscriptions.notify_all(&update);
        Some(update)
    }

    /// Flattens the view into records.
    pub fn to_records(&self, source: &dyn RowSource, options: &SerializeOptions) -> Vec<Record> {
        records::to_records(self, source, options)
    }

    pub fn on_update<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ViewUpdate) + Send + 'static,
    {
        self.subscriptions.subscribe(callback)
    }

    pub fn remove_update(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    /// Drops every subscription.
    pub fn clear_subscriptions(&mut self) {
        self.subscriptions.clear();
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("groups", &self.tree.group_count())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivotal_core::schema::SchemaBuilder;
    use pivotal_core::{ErrorKind, Value};
    use pivotal_incremental::MemorySource;
    use std::sync::{Arc, Mutex};

    fn schema() -> TableSchema {
        SchemaBuilder::new("t")
            .add_column("x", DataType::Int64)
            .unwrap()
            .add_column("y", DataType::String)
            .unwrap()
            .build()
            .unwrap()
    }

    fn source() -> MemorySource {
        MemorySource::new(vec![
            vec![Value::Int64(1), Value::from("a")],
            vec![Value::Int64(2), Value::from("b")],
            vec![Value::Int64(3), Value::from("a")],
        ])
    }

    fn identity(columns: &[ColumnId]) -> BTreeSet<ColumnId> {
        columns.iter().copied().collect()
    }

    #[test]
    fn test_default_columns_and_aggregates() {
        let src = source();
        let view = View::new(1, ViewConfig::new().row_pivots(["y"]), &schema(), &src, &identity).unwrap();
        assert_eq!(
            view.schema(),
            vec![("x".to_string(), DataType::Int64), ("y".to_string(), DataType::Int64)]
        );
        assert_eq!(view.columns()[0].aggregate, Aggregate::Sum);
        assert_eq!(view.columns()[1].aggregate, Aggregate::Count);
        assert_eq!(view.num_rows(&src), 3);
    }

    #[test]
    fn test_flat_schema_keeps_column_types() {
        let src = source();
        let view = View::new(1, ViewConfig::new(), &schema(), &src, &identity).unwrap();
        assert!(view.is_flat());
        assert_eq!(view.schema()[1], ("y".to_string(), DataType::String));
        assert_eq!(view.num_rows(&src), 3);
    }

    #[test]
    fn test_unknown_pivot() {
        let src = source();
        let err = View::new(1, ViewConfig::new().row_pivots(["z"]), &schema(), &src, &identity).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_incompatible_aggregate() {
        let src = source();
        let config = ViewConfig::new().row_pivots(["x"]).aggregate("y", "sum");
        let err = View::new(1, config, &schema(), &src, &identity).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_on_table_change_notifies() {
        let mut src = source();
        let mut view = View::new(7, ViewConfig::new().row_pivots(["y"]), &schema(), &src, &identity).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        view.on_update(move |u| sink.lock().unwrap().push(u.clone()));

        src.set(1, 1, Value::from("a"), 2);
        let mut changes = ChangeSet::new(2);
        changes.record_cell(1, 1);

        let update = view.on_table_change(&changes, &src).unwrap();
        assert_eq!(update.view, 7);
        assert_eq!(update.groups_removed, 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unrelated_change_is_ignored() {
        let src = source();
        let mut view = View::new(1, ViewConfig::new().columns(["x"]), &schema(), &src, &identity).unwrap();
        let mut changes = ChangeSet::new(2);
        changes.record_cell(0, 1);
        assert!(view.on_table_change(&changes, &src).is_none());
    }
}
