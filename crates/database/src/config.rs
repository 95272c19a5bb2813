//! Table construction options.

use serde::{Deserialize, Serialize};

/// Options accepted when a table is constructed.
///
/// Deserializes from `{"index": "id"}`; every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Primary key column. Updates carrying an existing key overwrite that
    /// row; all other rows append.
    pub index: Option<String>,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Designates `column` as the primary key.
    pub fn with_index(column: impl Into<String>) -> Self {
        Self {
            index: Some(column.into()),
        }
    }
}
