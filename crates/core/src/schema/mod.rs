//! Schema module for the Pivotal table engine.
//!
//! This module contains the column and table schema definitions.

mod column;
mod table;

pub use column::{Column, ColumnKind};
pub use table::{SchemaBuilder, TableSchema};
