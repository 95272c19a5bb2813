//! Aggregate operators maintained by pivot trees.

mod aggregate;

pub use aggregate::{Aggregate, AggregateState};
