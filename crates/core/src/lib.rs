//! Pivotal Core - Core types and schema definitions for the Pivotal table engine.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - `DataType`: Column types (integer, float, string, boolean, date, datetime)
//! - `Value`: Runtime values stored in column slots, with coercion rules
//! - `Payload`: One partial row of an update batch
//! - `schema`: Schema definitions (Column, TableSchema, SchemaBuilder)
//! - `Error`: Error types and their kinds
//!
//! # Example
//!
//! ```rust
//! use pivotal_core::{DataType, Payload, Value};
//! use pivotal_core::schema::SchemaBuilder;
//!
//! let schema = SchemaBuilder::new("trades")
//!     .add_column("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("price", DataType::Float64)
//!     .unwrap()
//!     .add_primary_key("id")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let payload = Payload::new().with("id", 1i64).with("price", 9.5);
//!
//! assert_eq!(schema.primary_key().unwrap().name(), "id");
//! assert_eq!(payload.get("price"), Some(&Value::Float64(9.5)));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, ErrorKind, Result};
pub use row::{ColumnId, Epoch, Payload, RowIndex, INDEX_FIELD, ROW_PATH_FIELD};
pub use types::DataType;
pub use value::{Value, MILLIS_PER_DAY};
