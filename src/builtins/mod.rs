//! Built-ins required to bootstrap the standard-library source file.
//!
//! Each is a dotted name (`.+`, `.seq`, ...) resolved directly by the lexer's
//! classification pass rather than bound through `Context` — a program never
//! shadows one of these by `def`ing a dotted symbol, since the reader turns
//! the token straight into a `Value::BuiltIn` before evaluation ever starts.

use crate::context::Context;
use crate::value::{BuiltinFn, Value};
use std::cell::RefCell;

pub mod arithmetic;
pub mod comparison;
pub mod misc;
pub mod sequences;

const TABLE: &[(&str, fn(&[Value]) -> Result<Value, crate::error::EvalError>)] = &[
    (".+", arithmetic::add),
    (".-", arithmetic::sub),
    (".*", arithmetic::mul),
    ("./", arithmetic::div),
    (".<", comparison::lt),
    (".<=", comparison::le),
    (".>", comparison::gt),
    (".>=", comparison::ge),
    (".=", comparison::structural_eq),
    (".==", comparison::numeric_eq),
    (".list", sequences::list),
    (".concat", sequences::concat),
    (".seq", sequences::seq),
    (".first", sequences::first),
    (".next", sequences::next),
    (".rest", sequences::rest),
    (".conj", sequences::conj),
    (".reduce", sequences::reduce),
    (".rand", misc::rand),
    (".print", misc::print),
];

/// Resolves a dotted built-in name to its function pointer, for the lexer's
/// classification pass and the parser's token-to-Value conversion.
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(name, func)| BuiltinFn { name, func })
}

thread_local! {
    static OUTPUT_SINK: RefCell<Box<dyn FnMut(&str)>> = RefCell::new(Box::new(|s: &str| print!("{s}")));
    static CURRENT_CTX: RefCell<Option<Context>> = RefCell::new(None);
}

/// Installs the interpreter's output sink, used by `.print`. Mirrors the
/// teacher's thread-local sandbox-storage pattern for giving built-ins
/// access to ambient interpreter state without threading it through every
/// `fn(&[Value]) -> Result<Value, EvalError>` call.
pub fn set_output_sink(sink: Box<dyn FnMut(&str)>) {
    OUTPUT_SINK.with(|s| *s.borrow_mut() = sink);
}

pub fn write_output(text: &str) {
    OUTPUT_SINK.with(|sink| (sink.borrow_mut())(text));
}

/// Stashes the context active for the current top-level evaluation, so that
/// `.print` can resolve interned symbols/keywords and `.reduce` can call
/// back into the evaluator to apply its function argument.
pub fn set_current_context(ctx: Context) {
    CURRENT_CTX.with(|c| *c.borrow_mut() = Some(ctx));
}

pub fn with_current_context<R>(f: impl FnOnce(&Context) -> R) -> Option<R> {
    CURRENT_CTX.with(|c| c.borrow().as_ref().map(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_resolves_every_table_entry() {
        for (name, _) in TABLE {
            assert!(lookup(name).is_some(), "missing lookup for {name}");
        }
        assert!(lookup(".nonexistent").is_none());
    }
}
