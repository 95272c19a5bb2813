//! Pivotal Storage - typed column storage for the Pivotal table engine.
//!
//! This crate provides the storage layer including:
//!
//! - `ColumnData`: a typed, nullable column buffer
//! - `ColumnStore`: one table's columns, row epochs and primary-key index
//! - `Journal`: the undo log of an update batch
//! - `Transaction`: applies an update batch and produces its change-set
//!
//! # Example
//!
//! ```rust
//! use pivotal_core::schema::SchemaBuilder;
//! use pivotal_core::{DataType, Payload, Value};
//! use pivotal_storage::{ColumnStore, Transaction};
//!
//! let schema = SchemaBuilder::new("prices")
//!     .add_column("symbol", DataType::String)
//!     .unwrap()
//!     .add_column("price", DataType::Float64)
//!     .unwrap()
//!     .add_primary_key("symbol")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let mut store = ColumnStore::new(schema);
//!
//! let mut tx = Transaction::begin(&mut store, 1);
//! tx.apply_payload(&Payload::new().with("symbol", "ABC").with("price", 10i64)).unwrap();
//! let changes = tx.commit().unwrap();
//!
//! assert_eq!(changes.inserted_rows(), vec![0]);
//! assert_eq!(store.get(1, 0), Value::Float64(10.0));
//! ```

#![no_std]

extern crate alloc;

pub mod column;
pub mod column_store;
pub mod journal;
pub mod transaction;

pub use column::ColumnData;
pub use column_store::ColumnStore;
pub use journal::{Journal, JournalEntry};
pub use transaction::{Transaction, TransactionState};
