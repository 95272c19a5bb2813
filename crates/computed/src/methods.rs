//! Built-in computed column methods, addressed by their `func_name`.

use crate::combiner::Combiner;
use core::fmt;
use core::str::FromStr;
use pivotal_core::{Error, Result, Value};

/// A named built-in combining function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComputedMethod {
    Add,
    Subtract,
    Multiply,
    Divide,
    /// `x` as a percentage of `y`.
    PercentOf,
    Abs,
    Sqrt,
    Pow2,
    Invert,
    Uppercase,
    Lowercase,
    Length,
    ConcatSpace,
    ConcatComma,
}

impl ComputedMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ComputedMethod::Add => "+",
            ComputedMethod::Subtract => "-",
            ComputedMethod::Multiply => "*",
            ComputedMethod::Divide => "/",
            ComputedMethod::PercentOf => "%",
            ComputedMethod::Abs => "abs",
            ComputedMethod::Sqrt => "sqrt",
            ComputedMethod::Pow2 => "x^2",
            ComputedMethod::Invert => "1/x",
            ComputedMethod::Uppercase => "Uppercase",
            ComputedMethod::Lowercase => "Lowercase",
            ComputedMethod::Length => "length",
            ComputedMethod::ConcatSpace => "concat_space",
            ComputedMethod::ConcatComma => "concat_comma",
        }
    }
}

impl fmt::Display for ComputedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComputedMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let method = match s.to_ascii_lowercase().as_str() {
            "+" | "add" => ComputedMethod::Add,
            "-" | "subtract" => ComputedMethod::Subtract,
            "*" | "multiply" => ComputedMethod::Multiply,
            "/" | "divide" => ComputedMethod::Divide,
            "%" | "percent_of" => ComputedMethod::PercentOf,
            "abs" => ComputedMethod::Abs,
            "sqrt" => ComputedMethod::Sqrt,
            "x^2" | "pow2" => ComputedMethod::Pow2,
            "1/x" | "invert" => ComputedMethod::Invert,
            "uppercase" => ComputedMethod::Uppercase,
            "lowercase" => ComputedMethod::Lowercase,
            "length" => ComputedMethod::Length,
            "concat_space" => ComputedMethod::ConcatSpace,
            "concat_comma" => ComputedMethod::ConcatComma,
            other => {
                return Err(Error::invalid_schema(format!(
                    "unknown computed function: {}",
                    other
                )))
            }
        };
        Ok(method)
    }
}

impl Combiner for ComputedMethod {
    fn arity(&self) -> usize {
        match self {
            ComputedMethod::Add
            | ComputedMethod::Subtract
            | ComputedMethod::Multiply
            | ComputedMethod::Divide
            | ComputedMethod::PercentOf
            | ComputedMethod::ConcatSpace
            | ComputedMethod::ConcatComma => 2,
            _ => 1,
        }
    }

    fn evaluate(&self, inputs: &[Value]) -> Value {
        match (self, inputs) {
            (ComputedMethod::Add, [x, y]) => arithmetic(x, y, i64::checked_add, |a, b| a + b),
            (ComputedMethod::Subtract, [x, y]) => arithmetic(x, y, i64::checked_sub, |a, b| a - b),
            (ComputedMethod::Multiply, [x, y]) => arithmetic(x, y, i64::checked_mul, |a, b| a * b),
            (ComputedMethod::Divide, [x, y]) => ratio(x, y, 1.0),
            (ComputedMethod::PercentOf, [x, y]) => ratio(x, y, 100.0),
            (ComputedMethod::Abs, [x]) => match x {
                Value::Int64(v) => v.checked_abs().map(Value::Int64).unwrap_or(Value::Null),
                Value::Float64(v) => Value::Float64(v.abs()),
                _ => Value::Null,
            },
            (ComputedMethod::Sqrt, [x]) => match x.to_f64() {
                Some(v) if v >= 0.0 => Value::Float64(v.sqrt()),
                _ => Value::Null,
            },
            (ComputedMethod::Pow2, [x]) => arithmetic(x, x, i64::checked_mul, |a, b| a * b),
            (ComputedMethod::Invert, [x]) => ratio(&Value::Float64(1.0), x, 1.0),
            (ComputedMethod::Uppercase, [Value::String(s)]) => Value::String(s.to_uppercase()),
            (ComputedMethod::Lowercase, [Value::String(s)]) => Value::String(s.to_lowercase()),
            (ComputedMethod::Length, [Value::String(s)]) => Value::Int64(s.chars().count() as i64),
            (ComputedMethod::ConcatSpace, [x, y]) => Value::String(format!("{} {}", x, y)),
            (ComputedMethod::ConcatComma, [x, y]) => Value::String(format!("{}, {}", x, y)),
            _ => Value::Null,
        }
    }
}

/// Integer op integer stays integer (null on overflow); any float operand
/// promotes both sides to float.
fn arithmetic(
    x: &Value,
    y: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    match (x, y) {
        (Value::Int64(a), Value::Int64(b)) => int_op(*a, *b).map(Value::Int64).unwrap_or(Value::Null),
        _ => match (x.to_f64(), y.to_f64()) {
            (Some(a), Some(b)) => Value::Float64(float_op(a, b)),
            _ => Value::Null,
        },
    }
}

fn ratio(x: &Value, y: &Value, scale: f64) -> Value {
    match (x.to_f64(), y.to_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Value::Null,
        (Some(a), Some(b)) => Value::Float64(a / b * scale),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(method: &str, inputs: &[Value]) -> Value {
        method.parse::<ComputedMethod>().unwrap().evaluate(inputs)
    }

    #[test]
    fn test_parse() {
        assert_eq!("+".parse::<ComputedMethod>().unwrap(), ComputedMethod::Add);
        assert_eq!("UPPERCASE".parse::<ComputedMethod>().unwrap(), ComputedMethod::Uppercase);
        let err = "median".parse::<ComputedMethod>().unwrap_err();
        assert_eq!(err.kind(), pivotal_core::ErrorKind::Schema);
    }

    #[test]
    fn test_arity() {
        assert_eq!(ComputedMethod::Add.arity(), 2);
        assert_eq!(ComputedMethod::Sqrt.arity(), 1);
        assert_eq!(ComputedMethod::ConcatComma.arity(), 2);
    }

    #[test]
    fn test_add_promotes_mixed() {
        assert_eq!(eval("+", &[Value::Int64(1), Value::Int64(1)]), Value::Int64(2));
        assert_eq!(eval("+", &[Value::Int64(1), Value::Float64(1.5)]), Value::Float64(2.5));
        assert_eq!(eval("-", &[Value::Float64(4.5), Value::Int64(4)]), Value::Float64(0.5));
        assert_eq!(eval("*", &[Value::Int64(3), Value::Int64(-2)]), Value::Int64(-6));
    }

    #[test]
    fn test_overflow_is_null() {
        assert_eq!(eval("+", &[Value::Int64(i64::MAX), Value::Int64(1)]), Value::Null);
    }

    #[test]
    fn test_divide() {
        assert_eq!(eval("/", &[Value::Int64(3), Value::Int64(2)]), Value::Float64(1.5));
        assert_eq!(eval("/", &[Value::Int64(3), Value::Int64(0)]), Value::Null);
        assert_eq!(eval("%", &[Value::Int64(1), Value::Int64(4)]), Value::Float64(25.0));
        assert_eq!(eval("1/x", &[Value::Int64(4)]), Value::Float64(0.25));
    }

    #[test]
    fn test_unary_numeric() {
        assert_eq!(eval("abs", &[Value::Int64(-3)]), Value::Int64(3));
        assert_eq!(eval("sqrt", &[Value::Int64(9)]), Value::Float64(3.0));
        assert_eq!(eval("sqrt", &[Value::Int64(-9)]), Value::Null);
        assert_eq!(eval("x^2", &[Value::Float64(1.5)]), Value::Float64(2.25));
    }

    #[test]
    fn test_strings() {
        assert_eq!(eval("Uppercase", &[Value::from("abc")]), Value::from("ABC"));
        assert_eq!(eval("Lowercase", &[Value::from("AbC")]), Value::from("abc"));
        assert_eq!(eval("length", &[Value::from("héllo")]), Value::Int64(5));
        assert_eq!(eval("length", &[Value::Int64(5)]), Value::Null);
        assert_eq!(
            eval("concat_space", &[Value::from("a"), Value::from("b")]),
            Value::from("a b")
        );
        assert_eq!(
            eval("concat_comma", &[Value::from("a"), Value::Int64(1)]),
            Value::from("a, 1")
        );
    }
}
