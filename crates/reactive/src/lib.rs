//! Pivotal Reactive - views over Pivotal tables.
//!
//! This crate turns a table into views that stay current as the table is
//! updated, and renders them as flat records.
//!
//! # Core Concepts
//!
//! - `ViewConfig`: row pivots, output columns and aggregates of a view
//! - `View`: a resolved config plus its incrementally maintained pivot tree
//! - `ViewRegistry`: routes committed change-sets to dependent views
//! - `SubscriptionManager`: per-view `on_update` callbacks
//! - `Record`: one flattened row, with reserved `__ROW_PATH__` and `__INDEX__` fields
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use pivotal_core::schema::SchemaBuilder;
//! use pivotal_core::{DataType, Value};
//! use pivotal_incremental::MemorySource;
//! use pivotal_reactive::{SerializeOptions, ViewConfig, ViewRegistry};
//!
//! let schema = SchemaBuilder::new("t")
//!     .add_column("k", DataType::String)
//!     .unwrap()
//!     .add_column("v", DataType::Int64)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let source = MemorySource::new(vec![
//!     vec![Value::from("a"), Value::Int64(1)],
//!     vec![Value::from("a"), Value::Int64(2)],
//! ]);
//!
//! let mut registry = ViewRegistry::new();
//! let upstream = |c: &[usize]| c.iter().copied().collect::<BTreeSet<_>>();
//! let id = registry
//!     .create(ViewConfig::new().row_pivots(["k"]).columns(["v"]), &schema, &source, &upstream)
//!     .unwrap();
//!
//! let records = registry.get(id).unwrap().to_records(&source, &SerializeOptions::default());
//! assert_eq!(records[0].get("v"), Some(&Value::Int64(3)));
//! ```

pub mod config;
pub mod notify;
pub mod records;
pub mod subscription;
pub mod update;
pub mod view;

pub use config::ViewConfig;
pub use notify::ViewRegistry;
pub use records::{to_json, to_records, Record, SerializeOptions};
pub use subscription::{Subscription, SubscriptionId, SubscriptionManager, UpdateCallback};
pub use update::{ViewId, ViewUpdate};
pub use view::{View, ViewColumn};
