//! The synchronous table engine.
//!
//! `TableEngine` owns one table: its column store, computed columns and
//! views. Every update batch runs one cycle: apply the payloads, re-evaluate
//! the computed columns they affect, commit, then refresh dependent views
//! against the committed state. A batch that fails anywhere is rolled back
//! before any view sees it.

use crate::config::TableOptions;
use crate::convert;
use log::debug;
use pivotal_computed::{ComputedColumnDef, ComputedColumnInfo, ComputedEngine};
use pivotal_core::schema::TableSchema;
use pivotal_core::{DataType, Epoch, Error, Payload, Result, RowIndex};
use pivotal_reactive::{
    Record, SerializeOptions, SubscriptionId, View, ViewConfig, ViewId, ViewRegistry, ViewUpdate,
};
use pivotal_storage::{ColumnStore, Transaction};
use std::collections::BTreeMap;

/// What one committed batch did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateSummary {
    /// Epoch the batch committed under.
    pub epoch: Epoch,
    /// Row each payload landed on, in payload order.
    pub rows: Vec<RowIndex>,
    /// Cells changed, computed cells included.
    pub cells: usize,
    /// Views refreshed by the batch.
    pub views: Vec<ViewUpdate>,
}

/// A table with its computed columns and views.
pub struct TableEngine {
    store: ColumnStore,
    computed: ComputedEngine,
    views: ViewRegistry,
    epoch: Epoch,
}

impl TableEngine {
    /// Creates an empty table.
    pub fn new(schema: TableSchema) -> Self {
        Self {
            store: ColumnStore::new(schema),
            computed: ComputedEngine::new(),
            views: ViewRegistry::new(),
            epoch: 0,
        }
    }

    /// Creates a table whose schema is inferred from `rows`, then loads them
    /// as the first batch.
    pub fn from_rows(name: &str, mut rows: Vec<Payload>, options: &TableOptions) -> Result<Self> {
        let schema = convert::infer_schema(name, &rows, options)?;
        convert::stringify_mixed(&mut rows, &schema);
        let mut engine = Self::new(schema);
        engine.update(&rows)?;
        Ok(engine)
    }

    /// Creates a table from a JSON document of rows.
    pub fn from_json(name: &str, data: &serde_json::Value, options: &TableOptions) -> Result<Self> {
        Self::from_rows(name, convert::json_to_payloads(data)?, options)
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.store.name()
    }

    /// Epoch of the last committed batch.
    #[inline]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Number of rows.
    #[inline]
    pub fn size(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn store(&self) -> &ColumnStore {
        &self.store
    }

    /// Column names and types in schema order, computed columns included.
    pub fn schema(&self) -> Vec<(String, DataType)> {
        self.store
            .schema()
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), c.data_type()))
            .collect()
    }

    /// Applies one batch atomically.
    ///
    /// On error the column store is left exactly as it was and no view is
    /// notified.
    pub fn update(&mut self, payloads: &[Payload]) -> Result<UpdateSummary> {
        if payloads.is_empty() {
            return Ok(UpdateSummary {
                epoch: self.epoch,
                ..UpdateSummary::default()
            });
        }

        let epoch = self.epoch + 1;
        let mut tx = Transaction::begin(&mut self.store, epoch);
        let applied = tx
            .apply_all(payloads)
            .and_then(|rows| self.computed.on_update(&mut tx).map(|_| rows));
        let rows = match applied {
            Ok(rows) => rows,
            Err(e) => {
                tx.rollback()?;
                debug!("batch on {} rolled back: {}", self.store.name(), e);
                return Err(e);
            }
        };
        let changes = tx.commit()?;
        self.epoch = epoch;

        let views = self.views.on_table_change(&changes, &self.store);
        debug!(
            "epoch {} on {}: {} payloads, {} rows changed, {} cells, {} views refreshed",
            epoch,
            self.store.name(),
            payloads.len(),
            changes.len(),
            changes.cell_count(),
            views.len()
        );
        Ok(UpdateSummary {
            epoch,
            rows,
            cells: changes.cell_count(),
            views,
        })
    }

    /// Registers computed columns and fills them over every existing row.
    ///
    /// Existing views are unaffected; new columns are visible to views
    /// created afterwards.
    pub fn add_computed(&mut self, defs: Vec<ComputedColumnDef>) -> Result<()> {
        let count = defs.len();
        self.computed.register(&mut self.store, defs, self.epoch)?;
        debug!(
            "registered {} computed columns on {} ({} total)",
            count,
            self.store.name(),
            self.computed.len()
        );
        Ok(())
    }

    /// Registration metadata of every computed column, by name.
    pub fn computed_schema(&self) -> BTreeMap<String, ComputedColumnInfo> {
        self.computed.describe()
    }

    /// Creates a view over the current state.
    pub fn create_view(&mut self, config: ViewConfig) -> Result<ViewId> {
        let computed = &self.computed;
        self.views.create(
            config,
            self.store.schema(),
            &self.store,
            &|columns| computed.upstream(columns),
        )
    }

    /// Looks up a live view.
    pub fn view(&self, id: ViewId) -> Result<&View> {
        self.views.get(id).ok_or_else(|| view_disposed(id))
    }

    fn view_mut(&mut self, id: ViewId) -> Result<&mut View> {
        self.views.get_mut(id).ok_or_else(|| view_disposed(id))
    }

    /// Flattens a view into records.
    pub fn to_records(&self, id: ViewId, options: &SerializeOptions) -> Result<Vec<Record>> {
        Ok(self.view(id)?.to_records(&self.store, options))
    }

    /// Flattens a view into a JSON array.
    pub fn to_json(&self, id: ViewId, options: &SerializeOptions) -> Result<serde_json::Value> {
        pivotal_reactive::to_json(&self.to_records(id, options)?)
    }

    /// Number of records the view flattens to.
    pub fn num_rows(&self, id: ViewId) -> Result<usize> {
        Ok(self.view(id)?.num_rows(&self.store))
    }

    /// Output column names and result types of a view.
    pub fn view_schema(&self, id: ViewId) -> Result<Vec<(String, DataType)>> {
        Ok(self.view(id)?.schema())
    }

    /// Registers a callback run after every batch that refreshes the view.
    pub fn on_update<F>(&mut self, id: ViewId, callback: F) -> Result<SubscriptionId>
    where
        F: Fn(&ViewUpdate) + Send + 'static,
    {
        Ok(self.view_mut(id)?.on_update(callback))
    }

    /// Removes a view. Returns false if it was already gone.
    pub fn delete_view(&mut self, id: ViewId) -> bool {
        match self.views.remove(id) {
            Some(mut view) => {
                view.clear_subscriptions();
                debug!("removed view {} from {}", id, self.store.name());
                true
            }
            None => false,
        }
    }

    /// Number of live views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }
}

pub(crate) fn view_disposed(id: ViewId) -> Error {
    Error::disposed(format!("View {}", id))
}
