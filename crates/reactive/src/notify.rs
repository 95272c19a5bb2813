//! View registry and change routing.
//!
//! `ViewRegistry` owns the views of one table and routes every committed
//! change-set to the views that depend on a changed column.

use crate::config::ViewConfig;
use crate::update::{ViewId, ViewUpdate};
use crate::view::View;
use log::debug;
use pivotal_core::schema::TableSchema;
use pivotal_core::{ColumnId, Result};
use pivotal_incremental::{ChangeSet, RowSource};
use std::collections::{BTreeMap, BTreeSet};

/// The views of one table, by id.
pub struct ViewRegistry {
    views: BTreeMap<ViewId, View>,
    next_id: ViewId,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Creates and registers a view. On error nothing is registered.
    pub fn create(
        &mut self,
        config: ViewConfig,
        schema: &TableSchema,
        source: &dyn RowSource,
        upstream: &dyn Fn(&[ColumnId]) -> BTreeSet<ColumnId>,
    ) -> Result<ViewId> {
        let id = self.next_id;
        let view = View::new(id, config, schema, source, upstream)?;
        debug!(
            "registered view {} on {} ({} groups)",
            id,
            schema.name(),
            view.tree().group_count()
        );
        self.next_id += 1;
        self.views.insert(id, view);
        Ok(id)
    }

    pub fn get(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut View> {
        self.views.get_mut(&id)
    }

    /// Removes a view. Returns it if it was registered.
    pub fn remove(&mut self, id: ViewId) -> Option<View> {
        self.views.remove(&id)
    }

    /// Routes a committed change-set to every dependent view, in view order.
    pub fn on_table_change(&mut self, changes: &ChangeSet, source: &dyn RowSource) -> Vec<ViewUpdate> {
        if changes.is_empty() {
            return Vec::new();
        }
        self.views
            .values_mut()
            .filter_map(|view| view.on_table_change(changes, source))
            .collect()
    }

    /// Number of views depending on `column`.
    pub fn views_for_column(&self, column: ColumnId) -> usize {
        self.views.values().filter(|v| v.depends_on(column)).count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn ids(&self) -> Vec<ViewId> {
        self.views.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }
}
