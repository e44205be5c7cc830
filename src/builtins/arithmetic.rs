// ABOUTME: Binary arithmetic built-ins with Int/Float promotion (spec.md §4.6)

use crate::error::{EvalError, ARITY_TWO};
use crate::value::Value;

fn require_binary(name: &'static str, args: &[Value]) -> Result<(&Value, &Value), EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity(name, ARITY_TWO, args.len()));
    }
    Ok((&args[0], &args[1]))
}

enum Promoted {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn promote(name: &'static str, a: &Value, b: &Value) -> Result<Promoted, EvalError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Promoted::Ints(*x, *y)),
        (Value::Int(x), Value::Float(y)) => Ok(Promoted::Floats(*x as f64, *y)),
        (Value::Float(x), Value::Int(y)) => Ok(Promoted::Floats(*x, *y as f64)),
        (Value::Float(x), Value::Float(y)) => Ok(Promoted::Floats(*x, *y)),
        _ => Err(EvalError::invalid_argument(
            name,
            format!(
                "expected two numbers, got {} and {}",
                a.type_name(),
                b.type_name()
            ),
        )),
    }
}

pub fn add(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".+", args)?;
    Ok(match promote(".+", a, b)? {
        Promoted::Ints(x, y) => Value::Int(x.wrapping_add(y)),
        Promoted::Floats(x, y) => Value::Float(x + y),
    })
}

pub fn sub(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".-", args)?;
    Ok(match promote(".-", a, b)? {
        Promoted::Ints(x, y) => Value::Int(x.wrapping_sub(y)),
        Promoted::Floats(x, y) => Value::Float(x - y),
    })
}

pub fn mul(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary(".*", args)?;
    Ok(match promote(".*", a, b)? {
        Promoted::Ints(x, y) => Value::Int(x.wrapping_mul(y)),
        Promoted::Floats(x, y) => Value::Float(x * y),
    })
}

pub fn div(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = require_binary("./", args)?;
    match promote("./", a, b)? {
        Promoted::Ints(_, 0) => Err(EvalError::DivideByZero),
        // Rust's integer division already truncates toward zero.
        Promoted::Ints(x, y) => Ok(Value::Int(x / y)),
        Promoted::Floats(_, y) if y == 0.0 => Err(EvalError::DivideByZero),
        Promoted::Floats(x, y) => Ok(Value::Float(x / y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_plus_int_stays_int() {
        assert!(matches!(
            add(&[Value::Int(2), Value::Int(3)]),
            Ok(Value::Int(5))
        ));
    }

    #[test]
    fn mixed_promotes_to_float() {
        let r = add(&[Value::Int(2), Value::Float(0.5)]).unwrap();
        assert!(matches!(r, Value::Float(f) if f == 2.5));
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        let r = div(&[Value::Int(-7), Value::Int(2)]).unwrap();
        assert!(matches!(r, Value::Int(-3)));
    }

    #[test]
    fn division_by_zero_errors() {
        assert!(matches!(
            div(&[Value::Int(1), Value::Int(0)]),
            Err(EvalError::DivideByZero)
        ));
        assert!(matches!(
            div(&[Value::Float(1.0), Value::Float(0.0)]),
            Err(EvalError::DivideByZero)
        ));
    }

    #[test]
    fn wrong_arity_is_arity_error() {
        assert!(matches!(
            add(&[Value::Int(1)]),
            Err(EvalError::ArityError { .. })
        ));
    }
}
