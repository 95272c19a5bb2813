//! Pivotal Database - tables, computed columns and live pivoted views.
//!
//! This crate ties the engine together:
//!
//! - `TableEngine`: one table with its computed columns and views, driven
//!   synchronously through the update cycle
//! - `Table` / `View`: async handles served by a per-table tokio worker
//! - `TableOptions`: construction options (primary key)
//! - `convert`: JSON rows to payloads, and schema inference
//!
//! # Example
//!
//! ```rust
//! use pivotal_database::{SerializeOptions, Table, TableOptions, ViewConfig};
//! use pivotal_database::{ComputedColumnDef, ComputedMethod, DataType};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> pivotal_database::Result<()> {
//! let table = Table::from_json(
//!     "prices",
//!     &json!([{"w": 1.5, "x": 1}, {"w": 2.5, "x": 2}]),
//!     &TableOptions::default(),
//! )
//! .await?;
//!
//! table
//!     .add_computed(vec![ComputedColumnDef::new("ratio", DataType::Float64, ["w", "x"])
//!         .with_func_name(ComputedMethod::Divide.name())])
//!     .await?;
//!
//! let view = table.view(ViewConfig::new().columns(["ratio"])).await?;
//! let records = view.to_json(SerializeOptions::default()).await?;
//! assert_eq!(records, json!([{"ratio": 1.5}, {"ratio": 1.25}]));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod engine;
pub mod table;

pub use config::TableOptions;
pub use engine::{TableEngine, UpdateSummary};
pub use table::{Table, View};

pub use pivotal_computed::{Combiner, ComputedColumnDef, ComputedColumnInfo, ComputedMethod, FnCombiner};
pub use pivotal_core::{DataType, Error, ErrorKind, Payload, Result, Value};
pub use pivotal_reactive::{Record, SerializeOptions, ViewConfig, ViewUpdate};
