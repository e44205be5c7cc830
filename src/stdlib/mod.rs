// ABOUTME: Loads the bundled bootstrap Lisp source into a Context at startup, spec.md §4.7

use crate::context::Context;
use crate::error::EvalOutcome;
use crate::parser::parse_all;

const CORE: &str = include_str!("lisp/core.lisp");

/// Evaluates every top-level form of the bundled bootstrap library against
/// `ctx`, in order. Mirrors the teacher's `include_str!`-embedded
/// `load_stdlib` loop (src/main.rs), generalized to run the
/// lex/parse/reader-macro-expand/eval pipeline instead of a single
/// hand-rolled parse step.
pub fn bootstrap(ctx: &Context) -> Result<(), EvalOutcome> {
    let tokens = crate::lexer::lex(CORE).map_err(EvalOutcome::ReadFailure)?;
    let forms = parse_all(&tokens, ctx).map_err(EvalOutcome::ReadFailure)?;
    for form in &forms {
        let expanded = crate::reader_macro::expand(form, ctx).map_err(EvalOutcome::ReadFailure)?;
        crate::eval::eval(&expanded, ctx).map_err(EvalOutcome::EvalFailure)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;
    use crate::value::Value;

    fn run(src: &str, ctx: &Context) -> Value {
        let parsed = parse_one(src, ctx).unwrap();
        let expanded = crate::reader_macro::expand(&parsed, ctx).unwrap();
        crate::eval::eval(&expanded, ctx).unwrap()
    }

    #[test]
    fn bootstrap_loads_without_error() {
        let ctx = Context::new_root();
        bootstrap(&ctx).unwrap();
    }

    #[test]
    fn variadic_plus_and_minus() {
        let ctx = Context::new_root();
        bootstrap(&ctx).unwrap();
        assert!(matches!(run("(+ 1 2 3 4)", &ctx), Value::Int(10)));
        assert!(matches!(run("(- 10 1 2)", &ctx), Value::Int(7)));
        assert!(matches!(run("(- 5)", &ctx), Value::Int(-5)));
    }

    #[test]
    fn chained_comparison() {
        let ctx = Context::new_root();
        bootstrap(&ctx).unwrap();
        assert!(matches!(run("(< 1 2 3)", &ctx), Value::Bool(true)));
        assert!(matches!(run("(< 1 3 2)", &ctx), Value::Bool(false)));
    }

    #[test]
    fn and_or_short_circuit_semantics() {
        let ctx = Context::new_root();
        bootstrap(&ctx).unwrap();
        assert!(matches!(run("(and true 1 2)", &ctx), Value::Int(2)));
        assert!(matches!(run("(and true false 2)", &ctx), Value::Bool(false)));
        assert!(matches!(run("(or false nil 3)", &ctx), Value::Int(3)));
    }

    #[test]
    fn cond_picks_first_truthy_clause() {
        let ctx = Context::new_root();
        bootstrap(&ctx).unwrap();
        let result = run("(cond false 1 true 2 true 3)", &ctx);
        assert!(matches!(result, Value::Int(2)));
    }

    #[test]
    fn map_and_filter_over_a_list() {
        let ctx = Context::new_root();
        bootstrap(&ctx).unwrap();
        run("(defn inc [x] (+ x 1))", &ctx);
        let result = run("(map inc '(1 2 3))", &ctx);
        match result {
            Value::Vector(items) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(items[0], Value::Int(2)));
            }
            _ => panic!("expected vector"),
        }

        let result = run("(filter (fn [x] (> x 2)) '(1 2 3 4))", &ctx);
        match result {
            Value::Vector(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected vector"),
        }
    }

    #[test]
    fn multi_arity_reduce_wrapper() {
        let ctx = Context::new_root();
        bootstrap(&ctx).unwrap();
        let result = run("(reduce + '(1 2 3 4))", &ctx);
        assert!(matches!(result, Value::Int(10)));
        let result = run("(reduce + 100 '(1 2 3))", &ctx);
        assert!(matches!(result, Value::Int(106)));
    }
}
