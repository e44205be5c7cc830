// ABOUTME: Binary comparison and equality built-ins (spec.md §4.6)

use crate::error::{EvalError, ARITY_TWO};
use crate::value::{value_eq, value_numeq, Value};

fn as_f64(name: &'static str, v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        _ => Err(EvalError::invalid_argument(
            name,
            format!("expected a number, got {}", v.type_name()),
        )),
    }
}

fn require_binary(name: &'static str, args: &[Value]) -> Result<(&Value, &Value), EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity(name, ARITY_TWO, args.len()));
    }
    Ok((&args[0], &args[1]))
}

pub fn lt(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".<", args)?;
    Ok(Value::Bool(as_f64(".<", a)? < as_f64(".<", b)?))
}

pub fn le(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".<=", args)?;
    Ok(Value::Bool(as_f64(".<=", a)? <= as_f64(".<=", b)?))
}

pub fn gt(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".>", args)?;
    Ok(Value::Bool(as_f64(".>", a)? > as_f64(".>", b)?))
}

pub fn ge(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".>=", args)?;
    Ok(Value::Bool(as_f64(".>=", a)? >= as_f64(".>=", b)?))
}

/// `.=`: structural equality, type-sensitive for scalars.
pub fn structural_eq(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".=", args)?;
    Ok(Value::Bool(value_eq(a, b)))
}

/// `.==`: numeric equality with Int/Float cross-promotion.
pub fn numeric_eq(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".==", args)?;
    Ok(Value::Bool(value_numeq(a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_eq_is_type_sensitive() {
        assert!(matches!(
            structural_eq(&[Value::Int(1), Value::Float(1.0)]),
            Ok(Value::Bool(false))
        ));
    }

    #[test]
    fn numeric_eq_promotes() {
        assert!(matches!(
            numeric_eq(&[Value::Int(1), Value::Float(1.0)]),
            Ok(Value::Bool(true))
        ));
    }

    #[test]
    fn ordering_across_int_and_float() {
        assert!(matches!(
            lt(&[Value::Int(1), Value::Float(1.5)]),
            Ok(Value::Bool(true))
        ));
        assert!(matches!(
            ge(&[Value::Float(3.0), Value::Int(3)]),
            Ok(Value::Bool(true))
        ));
    }
}
