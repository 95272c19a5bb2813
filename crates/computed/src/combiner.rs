//! Combining functions.
//!
//! A computed column derives each slot from up to two input slots of the same
//! row. Whatever produces the value, a closure or a built-in method, is a
//! `Combiner`.

use core::fmt;
use pivotal_core::Value;

/// A pure function of a fixed number of inputs.
pub trait Combiner: Send + Sync {
    /// Number of inputs the function takes.
    fn arity(&self) -> usize;

    /// Evaluates the function. `inputs.len()` always equals `arity()`.
    fn evaluate(&self, inputs: &[Value]) -> Value;
}

type BoxedFn = Box<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// A combiner backed by a closure.
pub struct FnCombiner {
    arity: usize,
    f: BoxedFn,
}

impl FnCombiner {
    /// Wraps a closure over a slice of `arity` inputs.
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            arity,
            f: Box::new(f),
        }
    }

    /// Arity-0 combiner stamping the same value into every row.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(0, move |_| value.clone())
    }

    /// Arity-0 combiner calling `f` once per row.
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::new(0, move |_| f())
    }

    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::new(1, move |inputs| f(&inputs[0]))
    }

    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Self::new(2, move |inputs| f(&inputs[0], &inputs[1]))
    }
}

impl Combiner for FnCombiner {
    fn arity(&self) -> usize {
        self.arity
    }

    fn evaluate(&self, inputs: &[Value]) -> Value {
        (self.f)(inputs)
    }
}

impl fmt::Debug for FnCombiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCombiner")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for dyn Combiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combiner")
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

/// Evaluates a combiner for one row.
///
/// Any null input short-circuits to null without invoking the function.
pub fn apply(combiner: &dyn Combiner, inputs: &[Value]) -> Value {
    if inputs.iter().any(Value::is_null) {
        return Value::Null;
    }
    combiner.evaluate(inputs)
}
