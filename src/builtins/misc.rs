// ABOUTME: .rand and .print built-ins (spec.md §4.6)

use crate::error::{EvalError, ARITY_ONE};
use crate::value::{Printer, Value};
use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

thread_local! {
    static RNG_STATE: Cell<u64> = Cell::new(seed());
}

fn seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E3779B97F4A7C15)
        | 1
}

/// xorshift64*: small, dependency-free, good enough for `.rand`'s uniform
/// double in [0, 1) — this interpreter has no reproducibility requirement
/// on randomness (spec.md §4.6).
fn next_u64() -> u64 {
    RNG_STATE.with(|state| {
        let mut x = state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        state.set(x);
        x
    })
}

/// `.rand`: uniform double in [0, 1).
pub fn rand(args: &[Value]) -> Result<Value, EvalError> {
    if !args.is_empty() {
        return Err(EvalError::arity(".rand", "0", args.len()));
    }
    // Keep the top 53 bits so the result is exactly representable as an f64.
    let bits = next_u64() >> 11;
    Ok(Value::Float(bits as f64 / (1u64 << 53) as f64))
}

/// `.print`: appends the argument's printed form to the interpreter's
/// output sink.
pub fn print(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(".print", ARITY_ONE, args.len()));
    }
    let text = crate::builtins::with_current_context(|ctx| {
        format!(
            "{}",
            Printer {
                value: &args[0],
                ctx
            }
        )
    })
    .unwrap_or_default();
    crate::builtins::write_output(&text);
    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_is_in_unit_interval() {
        for _ in 0..100 {
            let r = rand(&[]).unwrap();
            match r {
                Value::Float(f) => assert!((0.0..1.0).contains(&f)),
                _ => panic!("expected float"),
            }
        }
    }

    #[test]
    fn print_writes_to_sink() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let captured = Rc::new(RefCell::new(String::new()));
        let sink_target = captured.clone();
        crate::builtins::set_output_sink(Box::new(move |s| sink_target.borrow_mut().push_str(s)));
        crate::builtins::set_current_context(crate::context::Context::new_root());

        print(&[Value::Int(42)]).unwrap();
        assert_eq!(captured.borrow().as_str(), "42");
    }
}
