//! Pivotal Computed - derived columns for the Pivotal table engine.
//!
//! A computed column is filled by a `Combiner` of arity 0, 1 or 2 reading
//! other columns of the same row. Computed columns may read each other; the
//! `ComputedEngine` keeps them in dependency order and re-evaluates only the
//! cells an update batch invalidated.
//!
//! # Example
//!
//! ```
//! use pivotal_computed::{ComputedColumnDef, ComputedEngine};
//! use pivotal_core::schema::SchemaBuilder;
//! use pivotal_core::{DataType, Payload, Value};
//! use pivotal_storage::{ColumnStore, Transaction};
//!
//! let schema = SchemaBuilder::new("t")
//!     .add_column("x", DataType::Int64)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let mut store = ColumnStore::new(schema);
//! let mut tx = Transaction::begin(&mut store, 1);
//! tx.apply_payload(&Payload::new().with("x", 3i64)).unwrap();
//! tx.commit().unwrap();
//!
//! let mut engine = ComputedEngine::new();
//! engine
//!     .register(
//!         &mut store,
//!         vec![ComputedColumnDef::new("x2", DataType::Int64, ["x"]).with_func_name("x^2")],
//!         2,
//!     )
//!     .unwrap();
//! assert_eq!(store.get(1, 0), Value::Int64(9));
//! ```

pub mod combiner;
pub mod definition;
pub mod engine;
pub mod methods;

pub use combiner::{Combiner, FnCombiner};
pub use definition::{ComputedColumnDef, ComputedColumnInfo};
pub use engine::ComputedEngine;
pub use methods::ComputedMethod;
