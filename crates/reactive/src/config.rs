//! View configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a view groups and aggregates a table.
///
/// Deserializes from the JSON shape
/// `{"row_pivots": [...], "columns": [...], "aggregates": {"col": "sum"}}`;
/// every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Grouping columns, outermost first. Empty for a flat view.
    pub row_pivots: Vec<String>,
    /// Output columns. `None` selects every table column in schema order.
    pub columns: Option<Vec<String>>,
    /// Aggregate name per output column. Unlisted columns use the default
    /// aggregate for their type.
    pub aggregates: BTreeMap<String, String>,
}

impl ViewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_pivots<I, S>(mut self, pivots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.row_pivots = pivots.into_iter().map(Into::into).collect();
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn aggregate(mut self, column: impl Into<String>, aggregate: impl Into<String>) -> Self {
        self.aggregates.insert(column.into(), aggregate.into());
        self
    }

    /// Returns true if the view has no row pivots.
    pub fn is_flat(&self) -> bool {
        self.row_pivots.is_empty()
    }
}
