//! Pivotal Incremental - incremental pivot maintenance for the Pivotal table engine.
//!
//! Views over a table group rows into a pivot tree and aggregate each group.
//! Rather than rebuilding the tree after every update batch, the tree consumes
//! the batch's `ChangeSet` and only revisits the rows it names.
//!
//! # Core Concepts
//!
//! - `ChangeSet`: the `(row, column)` cells one batch changed, plus appended rows
//! - `RowSource`: read access to the current table state
//! - `AggregateState`: a running aggregate that accepts insertions and retractions
//! - `PivotTree`: the grouped, aggregated rows of one view
//!
//! # Example
//!
//! ```
//! use pivotal_core::{DataType, Value};
//! use pivotal_incremental::{Aggregate, ChangeSet, MemorySource, OutputColumn, PivotTree};
//!
//! let mut source = MemorySource::new(vec![
//!     vec![Value::from("a"), Value::Int64(1)],
//!     vec![Value::from("b"), Value::Int64(2)],
//! ]);
//! let outputs = vec![OutputColumn::new(1, Aggregate::Sum, DataType::Int64)];
//! let mut tree = PivotTree::build(vec![0], outputs, &source);
//!
//! source.set(1, 0, Value::Int64(10), 2);
//! let mut changes = ChangeSet::new(2);
//! changes.record_cell(0, 1);
//! tree.apply(&changes, &source);
//!
//! assert_eq!(tree.root().aggregate_values(), vec![Value::Int64(12)]);
//! ```

#![no_std]

extern crate alloc;

pub mod delta;
pub mod operators;
pub mod pivot;
pub mod source;

pub use delta::{ChangeSet, RowChange};
pub use operators::{Aggregate, AggregateState};
pub use pivot::{GroupSnapshot, NodeId, OutputColumn, PivotNode, PivotTree, TreeDelta, ROOT};
pub use source::{MemorySource, RowSource};
