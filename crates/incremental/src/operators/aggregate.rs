//! Incremental aggregate states.
//!
//! Count and integer sum are maintained with exact deltas. Every other
//! aggregate keeps an ordered multiset of its inputs, so the reported value
//! depends only on which rows are in the group and never on the order in
//! which they arrived.

use alloc::collections::BTreeMap;
use alloc::format;
use core::fmt;
use core::str::FromStr;
use pivotal_core::{DataType, Error, Result, Value};

/// Aggregate function applied to one output column of a pivoted view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aggregate {
    /// Number of non-null values.
    Count,
    /// Sum of values (numeric columns only).
    Sum,
    /// Arithmetic mean (numeric columns only).
    Mean,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Number of distinct non-null values.
    DistinctCount,
    /// The single value shared by every row, or null when rows disagree.
    Unique,
}

impl Aggregate {
    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Mean => "mean",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::DistinctCount => "distinct count",
            Aggregate::Unique => "unique",
        }
    }

    /// Default aggregate for a column of the given type.
    pub fn default_for(data_type: DataType) -> Self {
        if data_type.is_numeric() {
            Aggregate::Sum
        } else {
            Aggregate::Count
        }
    }

    /// Validates the aggregate against the type of the column it reads.
    pub fn check(&self, column: &str, data_type: DataType) -> Result<()> {
        match self {
            Aggregate::Sum | Aggregate::Mean if !data_type.is_numeric() => Err(
                Error::incompatible_aggregate(column, self.name(), data_type),
            ),
            _ => Ok(()),
        }
    }

    /// Type of the values this aggregate produces.
    pub fn result_type(&self, input: DataType) -> DataType {
        match self {
            Aggregate::Count | Aggregate::DistinctCount => DataType::Int64,
            Aggregate::Mean => DataType::Float64,
            Aggregate::Sum | Aggregate::Min | Aggregate::Max | Aggregate::Unique => input,
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(Aggregate::Count),
            "sum" => Ok(Aggregate::Sum),
            "avg" | "mean" => Ok(Aggregate::Mean),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            "distinct count" | "distinct_count" | "distinctcount" => Ok(Aggregate::DistinctCount),
            "unique" => Ok(Aggregate::Unique),
            other => Err(Error::invalid_operation(format!("unknown aggregate: {}", other))),
        }
    }
}

/// Running state of one aggregate over one group.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateState {
    /// Non-null count.
    Count(i64),
    /// Exact integer sum.
    IntSum(i64),
    /// Ordered multiset of non-null inputs with multiplicities.
    Values {
        aggregate: Aggregate,
        data_type: DataType,
        values: BTreeMap<Value, i64>,
    },
}

impl AggregateState {
    /// Creates an empty state for `aggregate` over a column of `data_type`.
    pub fn new(aggregate: Aggregate, data_type: DataType) -> Self {
        match (aggregate, data_type) {
            (Aggregate::Count, _) => AggregateState::Count(0),
            (Aggregate::Sum, DataType::Int64) => AggregateState::IntSum(0),
            _ => AggregateState::Values {
                aggregate,
                data_type,
                values: BTreeMap::new(),
            },
        }
    }

    /// Adds (`diff > 0`) or retracts (`diff < 0`) one input value.
    /// Null inputs are ignored.
    pub fn apply(&mut self, value: &Value, diff: i64) {
        if value.is_null() {
            return;
        }
        match self {
            AggregateState::Count(count) => *count += diff,
            AggregateState::IntSum(sum) => {
                if let Some(v) = value.as_i64() {
                    *sum = sum.wrapping_add(v.wrapping_mul(diff));
                }
            }
            AggregateState::Values { values, .. } => {
                let n = values.entry(value.clone()).or_insert(0);
                *n += diff;
                if *n <= 0 {
                    values.remove(value);
                }
            }
        }
    }

    /// Returns the current aggregate value.
    pub fn value(&self) -> Value {
        match self {
            AggregateState::Count(count) => Value::Int64(*count),
            AggregateState::IntSum(sum) => Value::Int64(*sum),
            AggregateState::Values {
                aggregate,
                data_type,
                values,
            } => match aggregate {
                Aggregate::Count => Value::Int64(values.values().sum()),
                Aggregate::Sum => match data_type {
                    DataType::Int64 => Value::Int64(int_sum(values)),
                    _ => Value::Float64(float_sum(values)),
                },
                Aggregate::Mean => {
                    let n: i64 = values.values().sum();
                    if n == 0 {
                        Value::Null
                    } else {
                        Value::Float64(float_sum(values) / n as f64)
                    }
                }
                Aggregate::Min => values.keys().next().cloned().unwrap_or(Value::Null),
                Aggregate::Max => values.keys().next_back().cloned().unwrap_or(Value::Null),
                Aggregate::DistinctCount => Value::Int64(values.len() as i64),
                Aggregate::Unique => {
                    if values.len() == 1 {
                        values.keys().next().cloned().unwrap_or(Value::Null)
                    } else {
                        Value::Null
                    }
                }
            },
        }
    }
}

fn int_sum(values: &BTreeMap<Value, i64>) -> i64 {
    values.iter().fold(0i64, |acc, (v, n)| {
        acc.wrapping_add(v.as_i64().unwrap_or(0).wrapping_mul(*n))
    })
}

fn float_sum(values: &BTreeMap<Value, i64>) -> f64 {
    values
        .iter()
        .map(|(v, n)| v.to_f64().unwrap_or(0.0) * *n as f64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregate() {
        assert_eq!("sum".parse::<Aggregate>().unwrap(), Aggregate::Sum);
        assert_eq!("avg".parse::<Aggregate>().unwrap(), Aggregate::Mean);
        assert_eq!("Distinct Count".parse::<Aggregate>().unwrap(), Aggregate::DistinctCount);
        assert!("median".parse::<Aggregate>().is_err());
    }

    #[test]
    fn test_default_for() {
        assert_eq!(Aggregate::default_for(DataType::Int64), Aggregate::Sum);
        assert_eq!(Aggregate::default_for(DataType::Float64), Aggregate::Sum);
        assert_eq!(Aggregate::default_for(DataType::String), Aggregate::Count);
        assert_eq!(Aggregate::default_for(DataType::Date), Aggregate::Count);
    }

    #[test]
    fn test_check_rejects_sum_of_strings() {
        let err = Aggregate::Sum.check("name", DataType::String).unwrap_err();
        assert_eq!(err.kind(), pivotal_core::ErrorKind::Type);
        assert!(Aggregate::Max.check("name", DataType::String).is_ok());
    }

    #[test]
    fn test_count() {
        let mut state = AggregateState::new(Aggregate::Count, DataType::String);
        state.apply(&Value::from("a"), 1);
        state.apply(&Value::Null, 1);
        state.apply(&Value::from("b"), 1);
        assert_eq!(state.value(), Value::Int64(2));

        state.apply(&Value::from("a"), -1);
        assert_eq!(state.value(), Value::Int64(1));
    }

    #[test]
    fn test_int_sum() {
        let mut state = AggregateState::new(Aggregate::Sum, DataType::Int64);
        for v in [1, 2, 3, 4] {
            state.apply(&Value::Int64(v), 1);
        }
        assert_eq!(state.value(), Value::Int64(10));

        state.apply(&Value::Int64(2), -1);
        state.apply(&Value::Int64(5), 1);
        assert_eq!(state.value(), Value::Int64(13));
    }

    #[test]
    fn test_float_sum_is_order_independent() {
        let inputs = [0.1, 0.2, 0.3, 1e16, -1e16];

        let mut forward = AggregateState::new(Aggregate::Sum, DataType::Float64);
        for v in inputs {
            forward.apply(&Value::Float64(v), 1);
        }

        let mut backward = AggregateState::new(Aggregate::Sum, DataType::Float64);
        for v in inputs.iter().rev() {
            backward.apply(&Value::Float64(*v), 1);
        }

        assert_eq!(forward.value(), backward.value());
    }

    #[test]
    fn test_mean() {
        let mut state = AggregateState::new(Aggregate::Mean, DataType::Int64);
        assert_eq!(state.value(), Value::Null);

        state.apply(&Value::Int64(1), 1);
        state.apply(&Value::Int64(4), 1);
        assert_eq!(state.value(), Value::Float64(2.5));
    }

    #[test]
    fn test_min_max_after_retraction() {
        let mut min = AggregateState::new(Aggregate::Min, DataType::Int64);
        let mut max = AggregateState::new(Aggregate::Max, DataType::Int64);
        for v in [5, 1, 9] {
            min.apply(&Value::Int64(v), 1);
            max.apply(&Value::Int64(v), 1);
        }
        assert_eq!(min.value(), Value::Int64(1));
        assert_eq!(max.value(), Value::Int64(9));

        min.apply(&Value::Int64(1), -1);
        max.apply(&Value::Int64(9), -1);
        assert_eq!(min.value(), Value::Int64(5));
        assert_eq!(max.value(), Value::Int64(5));
    }

    #[test]
    fn test_distinct_and_unique() {
        let mut distinct = AggregateState::new(Aggregate::DistinctCount, DataType::String);
        let mut unique = AggregateState::new(Aggregate::Unique, DataType::String);
        for v in ["x", "x"] {
            distinct.apply(&Value::from(v), 1);
            unique.apply(&Value::from(v), 1);
        }
        assert_eq!(distinct.value(), Value::Int64(1));
        assert_eq!(unique.value(), Value::from("x"));

        distinct.apply(&Value::from("y"), 1);
        unique.apply(&Value::from("y"), 1);
        assert_eq!(distinct.value(), Value::Int64(2));
        assert_eq!(unique.value(), Value::Null);
    }
}
