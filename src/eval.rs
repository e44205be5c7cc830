// ABOUTME: Tree-walking evaluator with a recur trampoline for loop/fn, spec.md §4.4-4.5

use crate::context::{Binding, Context};
use crate::error::{
    EvalError, ARITY_AT_LEAST_ONE, ARITY_ONE, ARITY_ONE_OR_TWO, ARITY_TWO, ARITY_TWO_OR_THREE,
};
use crate::special_form::SpecialForm;
use crate::value::{value_eq, Arity, FunctionValue, MacroValue, Value};
use std::rc::Rc;

/// Evaluates one form against `ctx`. Scalars, functions, built-ins, special
/// forms, and macros self-evaluate; symbols resolve through the context;
/// vectors/maps rebuild with each element evaluated; lists dispatch on the
/// evaluated head (spec.md §4.4).
pub fn eval(value: &Value, ctx: &Context) -> Result<Value, EvalError> {
    match value {
        Value::Symbol(sym) => resolve_symbol(*sym, ctx),
        Value::Vector(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                out.push(eval(item, ctx)?);
            }
            Ok(Value::Vector(Rc::new(out)))
        }
        Value::Map(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs.iter() {
                out.push((eval(k, ctx)?, eval(v, ctx)?));
            }
            Ok(Value::Map(Rc::new(out)))
        }
        Value::List(items) => eval_list(items, ctx),
        other => Ok(other.clone()),
    }
}

fn resolve_symbol(sym: u32, ctx: &Context) -> Result<Value, EvalError> {
    match ctx.lookup(sym) {
        Some(Binding::Literal(v)) => Ok(v),
        Some(Binding::BoundMacro(m)) => Ok(Value::Macro(m)),
        Some(Binding::Unbound) => Err(EvalError::Unbound(ctx.resolve_symbol(sym))),
        None => Err(EvalError::InvalidSymbol(ctx.resolve_symbol(sym))),
    }
}

fn eval_args(items: &[Value], ctx: &Context) -> Result<Vec<Value>, EvalError> {
    items.iter().map(|v| eval(v, ctx)).collect()
}

/// Evaluates an implicit `do`: every non-last form must not be a `recur`
/// result (spec.md §3 invariant); the last form's value (possibly itself a
/// `Recur` sentinel, for a surrounding loop/fn to catch) is returned as-is.
fn eval_do(forms: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if forms.is_empty() {
        return Ok(Value::Nil);
    }
    for form in &forms[..forms.len() - 1] {
        if matches!(eval(form, ctx)?, Value::Recur(_)) {
            return Err(EvalError::RecurMisuse);
        }
    }
    eval(&forms[forms.len() - 1], ctx)
}

fn eval_list(items: &Rc<Vec<Value>>, ctx: &Context) -> Result<Value, EvalError> {
    if items.is_empty() {
        return Ok(Value::List(items.clone()));
    }
    let head = eval(&items[0], ctx)?;
    let rest = &items[1..];

    match &head {
        Value::Special(sf) => eval_special(*sf, rest, ctx),
        Value::BuiltIn(b) => {
            let args = eval_args(rest, ctx)?;
            crate::builtins::set_current_context(ctx.clone());
            (b.func)(&args)
        }
        Value::Function(f) => {
            let args = eval_args(rest, ctx)?;
            apply_function(f, &args)
        }
        Value::Macro(m) => {
            let expansion = expand_macro(m, rest, ctx)?;
            eval(&expansion, ctx)
        }
        Value::Vector(v) => {
            let args = eval_args(rest, ctx)?;
            if args.len() != 1 {
                return Err(EvalError::arity("vector-index", ARITY_ONE, args.len()));
            }
            let idx = match &args[0] {
                Value::Int(n) => *n,
                other => {
                    return Err(EvalError::invalid_argument(
                        "vector-index",
                        format!("index must be an int, got {}", other.type_name()),
                    ))
                }
            };
            if idx < 0 || idx as usize >= v.len() {
                return Err(EvalError::OutOfBounds {
                    index: idx,
                    length: v.len(),
                });
            }
            Ok(v[idx as usize].clone())
        }
        Value::Map(pairs) => {
            let args = eval_args(rest, ctx)?;
            if args.is_empty() || args.len() > 2 {
                return Err(EvalError::arity("map-lookup", ARITY_ONE_OR_TWO, args.len()));
            }
            Ok(lookup_in_map(pairs, &args[0], args.get(1)))
        }
        Value::Symbol(_) | Value::Keyword(_) => {
            let args = eval_args(rest, ctx)?;
            if args.is_empty() || args.len() > 2 {
                return Err(EvalError::arity("key-lookup", ARITY_ONE_OR_TWO, args.len()));
            }
            Ok(match &args[0] {
                Value::Map(pairs) => lookup_in_map(pairs, &head, args.get(1)),
                _ => args.get(1).cloned().unwrap_or(Value::Nil),
            })
        }
        other => Err(EvalError::NotEvalable(other.type_name().to_string())),
    }
}

fn lookup_in_map(pairs: &[(Value, Value)], key: &Value, default: Option<&Value>) -> Value {
    pairs
        .iter()
        .find(|(k, _)| value_eq(k, key))
        .map(|(_, v)| v.clone())
        .or_else(|| default.cloned())
        .unwrap_or(Value::Nil)
}

fn eval_special(sf: SpecialForm, args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    match sf {
        SpecialForm::Quote => {
            if args.len() != 1 {
                return Err(EvalError::arity("quote", ARITY_ONE, args.len()));
            }
            Ok(args[0].clone())
        }
        SpecialForm::If => eval_if(args, ctx),
        SpecialForm::Do => eval_do(args, ctx),
        SpecialForm::Def => eval_def(args, ctx),
        SpecialForm::Let => eval_let(args, ctx),
        SpecialForm::Fn => eval_fn(args, ctx),
        SpecialForm::Defmacro => eval_defmacro(args, ctx),
        SpecialForm::Loop => eval_loop(args, ctx),
        SpecialForm::Recur => eval_recur(args, ctx),
        SpecialForm::Cons => eval_cons(args, ctx),
        SpecialForm::First => eval_first(args, ctx),
        SpecialForm::Rest => eval_rest(args, ctx),
    }
}

fn eval_if(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::arity("if", ARITY_TWO_OR_THREE, args.len()));
    }
    let test = eval(&args[0], ctx)?;
    if test.truthy() {
        eval(&args[1], ctx)
    } else if args.len() == 3 {
        eval(&args[2], ctx)
    } else {
        Ok(Value::Nil)
    }
}

fn expect_symbol(name: &'static str, v: &Value) -> Result<u32, EvalError> {
    match v {
        Value::Symbol(s) => Ok(*s),
        other => Err(EvalError::invalid_argument(
            name,
            format!("expected a symbol, got {}", other.type_name()),
        )),
    }
}

fn eval_def(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    match args.len() {
        1 => {
            let sym = expect_symbol("def", &args[0])?;
            ctx.def(sym, Binding::Unbound);
            Ok(Value::Symbol(sym))
        }
        2 => {
            let sym = expect_symbol("def", &args[0])?;
            let val = eval(&args[1], ctx)?;
            ctx.def(sym, Binding::Literal(val));
            Ok(Value::Symbol(sym))
        }
        n => Err(EvalError::arity("def", ARITY_ONE_OR_TWO, n)),
    }
}

fn expect_bindings_vector<'a>(name: &'static str, v: &'a Value) -> Result<&'a Rc<Vec<Value>>, EvalError> {
    match v {
        Value::Vector(items) => {
            if items.len() % 2 != 0 {
                Err(EvalError::invalid_argument(
                    name,
                    "bindings vector must have an even number of forms",
                ))
            } else {
                Ok(items)
            }
        }
        other => Err(EvalError::invalid_argument(
            name,
            format!("expected a bindings vector, got {}", other.type_name()),
        )),
    }
}

fn eval_let(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("let", ARITY_AT_LEAST_ONE, 0));
    }
    let bindings = expect_bindings_vector("let", &args[0])?;
    let frame = ctx.child();
    let mut i = 0;
    while i < bindings.len() {
        let sym = expect_symbol("let", &bindings[i])?;
        let val = eval(&bindings[i + 1], &frame)?;
        frame.bind_local(sym, val);
        i += 2;
    }
    eval_do(&args[1..], &frame)
}

/// Splits a parameter vector into fixed params and an optional `&rest`
/// variadic tail name.
fn split_params(params_vec: &[Value], ctx: &Context) -> Result<(Vec<u32>, Option<u32>), EvalError> {
    let amp = ctx.intern_symbol("&");
    let mut params = Vec::new();
    let mut variadic = None;
    let mut i = 0;
    while i < params_vec.len() {
        match &params_vec[i] {
            Value::Symbol(s) if *s == amp => {
                let tail = params_vec.get(i + 1).ok_or_else(|| {
                    EvalError::invalid_argument("fn", "expected a binding name after &")
                })?;
                variadic = Some(expect_symbol("fn", tail)?);
                if i + 2 != params_vec.len() {
                    return Err(EvalError::invalid_argument(
                        "fn",
                        "no parameters allowed after the variadic binding",
                    ));
                }
                i += 2;
            }
            Value::Symbol(s) => {
                params.push(*s);
                i += 1;
            }
            other => {
                return Err(EvalError::invalid_argument(
                    "fn",
                    format!("parameter must be a symbol, got {}", other.type_name()),
                ))
            }
        }
    }
    Ok((params, variadic))
}

fn parse_arity(params_form: &Value, body: &[Value], ctx: &Context) -> Result<Arity, EvalError> {
    let params_vec = match params_form {
        Value::Vector(v) => v.clone(),
        other => {
            return Err(EvalError::invalid_argument(
                "fn",
                format!("expected a parameter vector, got {}", other.type_name()),
            ))
        }
    };
    let (params, variadic) = split_params(&params_vec, ctx)?;
    Ok(Arity {
        params,
        variadic,
        body: body.to_vec(),
    })
}

fn eval_fn(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    let mut idx = 0;
    let name = if let Some(Value::Symbol(s)) = args.first() {
        idx = 1;
        Some(*s)
    } else {
        None
    };
    if args.len() <= idx {
        return Err(EvalError::arity("fn", ARITY_AT_LEAST_ONE, args.len()));
    }

    let arities = if matches!(args[idx], Value::Vector(_)) {
        vec![parse_arity(&args[idx], &args[idx + 1..], ctx)?]
    } else {
        let mut out = Vec::new();
        for form in &args[idx..] {
            match form {
                Value::List(items) if !items.is_empty() => {
                    out.push(parse_arity(&items[0], &items[1..], ctx)?);
                }
                _ => {
                    return Err(EvalError::invalid_argument(
                        "fn",
                        "expected a ([params] body...) arity form",
                    ))
                }
            }
        }
        out
    };

    Ok(Value::Function(Rc::new(FunctionValue {
        name,
        arities,
        env: ctx.clone(),
    })))
}

fn eval_defmacro(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity("defmacro", "at least 2", args.len()));
    }
    let name = expect_symbol("defmacro", &args[0])?;
    let params_vec = match &args[1] {
        Value::Vector(v) => v.clone(),
        other => {
            return Err(EvalError::invalid_argument(
                "defmacro",
                format!("expected a parameter vector, got {}", other.type_name()),
            ))
        }
    };
    let (params, variadic) = split_params(&params_vec, ctx)?;
    let body = args[2..].to_vec();
    let macro_val = Rc::new(MacroValue {
        name,
        params,
        variadic,
        body,
    });
    ctx.def(name, Binding::BoundMacro(macro_val.clone()));
    Ok(Value::Macro(macro_val))
}

fn eval_loop(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("loop", ARITY_AT_LEAST_ONE, 0));
    }
    let bindings = expect_bindings_vector("loop", &args[0])?.clone();
    let body = args[1..].to_vec();

    let mut frame = ctx.child();
    let mut syms = Vec::with_capacity(bindings.len() / 2);
    let mut i = 0;
    while i < bindings.len() {
        let sym = expect_symbol("loop", &bindings[i])?;
        let val = eval(&bindings[i + 1], &frame)?;
        frame.bind_local(sym, val);
        syms.push(sym);
        i += 2;
    }

    loop {
        match eval_do(&body, &frame)? {
            Value::Recur(new_vals) => {
                if new_vals.len() != syms.len() {
                    return Err(EvalError::arity("recur", syms.len().to_string(), new_vals.len()));
                }
                let next = ctx.child();
                for (sym, val) in syms.iter().zip(new_vals.iter()) {
                    next.bind_local(*sym, val.clone());
                }
                frame = next;
            }
            other => return Ok(other),
        }
    }
}

fn eval_recur(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    let vals = eval_args(args, ctx)?;
    Ok(Value::Recur(Rc::new(vals)))
}

fn eval_cons(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("cons", ARITY_TWO, args.len()));
    }
    let x = eval(&args[0], ctx)?;
    let coll = eval(&args[1], ctx)?;
    let mut items = match &coll {
        Value::Nil => Vec::new(),
        Value::List(v) | Value::Vector(v) => v.as_ref().clone(),
        other => {
            return Err(EvalError::invalid_argument(
                "cons",
                format!("expected a sequence, got {}", other.type_name()),
            ))
        }
    };
    items.insert(0, x);
    Ok(Value::List(Rc::new(items)))
}

fn eval_first(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("first", ARITY_ONE, args.len()));
    }
    let v = eval(&args[0], ctx)?;
    crate::builtins::sequences::first(&[v])
}

fn eval_rest(args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("rest", ARITY_ONE, args.len()));
    }
    let v = eval(&args[0], ctx)?;
    crate::builtins::sequences::rest(&[v])
}

/// Unhygienic macro expansion (spec.md §4.5): params bind to the caller's
/// *unevaluated* argument forms in a frame whose parent is the caller's own
/// context (a macro captures no context of its own).
fn expand_macro(m: &Rc<MacroValue>, unevaluated_args: &[Value], ctx: &Context) -> Result<Value, EvalError> {
    let accepts = if m.variadic.is_some() {
        unevaluated_args.len() >= m.params.len()
    } else {
        unevaluated_args.len() == m.params.len()
    };
    if !accepts {
        return Err(EvalError::arity(
            "macro",
            m.params.len().to_string(),
            unevaluated_args.len(),
        ));
    }
    let frame = ctx.child();
    for (i, &p) in m.params.iter().enumerate() {
        frame.bind_local(p, unevaluated_args[i].clone());
    }
    if let Some(v) = m.variadic {
        frame.bind_local(v, Value::List(Rc::new(unevaluated_args[m.params.len()..].to_vec())));
    }
    eval_do(&m.body, &frame)
}

fn bind_params(frame: &Context, params: &[u32], variadic: Option<u32>, args: &[Value]) {
    for (i, &p) in params.iter().enumerate() {
        frame.bind_local(p, args[i].clone());
    }
    if let Some(v) = variadic {
        frame.bind_local(v, Value::List(Rc::new(args[params.len()..].to_vec())));
    }
}

fn describe_arities(arities: &[Arity]) -> String {
    arities
        .iter()
        .map(|a| {
            if a.variadic.is_some() {
                format!("at least {}", a.params.len())
            } else {
                a.params.len().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Selects the matching arity, builds a child frame from the closure's
/// *captured* context, and trampolines on `recur`: a `Recur` result whose
/// arity matches rebinds parameters from the closure's own context again
/// (spec.md §9's resolution of the open rebinding-frame question) rather
/// than recursing.
fn apply_function(func: &Rc<FunctionValue>, args: &[Value]) -> Result<Value, EvalError> {
    let arity = func
        .find_arity(args.len())
        .ok_or_else(|| EvalError::arity("fn", describe_arities(&func.arities), args.len()))?;

    let mut frame = func.env.child();
    bind_params(&frame, &arity.params, arity.variadic, args);
    let params = arity.params.clone();
    let variadic = arity.variadic;
    let body = arity.body.clone();

    loop {
        match eval_do(&body, &frame)? {
            Value::Recur(new_args) => {
                let accepts = if variadic.is_some() {
                    new_args.len() >= params.len()
                } else {
                    new_args.len() == params.len()
                };
                if !accepts {
                    return Err(EvalError::arity("recur", params.len().to_string(), new_args.len()));
                }
                frame = func.env.child();
                bind_params(&frame, &params, variadic, &new_args);
            }
            other => return Ok(other),
        }
    }
}

/// Applies a callable `Value` directly, without needing a surrounding
/// `Context` — used by `.reduce` to invoke its function argument. A
/// `Function`'s own captured environment supplies everything it needs.
pub fn apply(f: &Value, args: &[Value]) -> Result<Value, EvalError> {
    match f {
        Value::Function(func) => apply_function(func, args),
        Value::BuiltIn(b) => (b.func)(args),
        other => Err(EvalError::NotEvalable(other.type_name().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;
    use crate::reader_macro::expand;

    fn run(src: &str, ctx: &Context) -> Result<Value, EvalError> {
        let parsed = parse_one(src, ctx).unwrap();
        let expanded = expand(&parsed, ctx).unwrap();
        eval(&expanded, ctx)
    }

    #[test]
    fn nested_arithmetic() {
        let ctx = Context::new_root();
        let result = run("(.+ (.* 2 4) (.- 8 6) (.+ (.+ 1 3) 4))", &ctx).unwrap();
        assert!(matches!(result, Value::Int(18)));
    }

    #[test]
    fn cons_and_rest() {
        let ctx = Context::new_root();
        let result = run("(cons 1 '(2 3 4))", &ctx).unwrap();
        match result {
            Value::List(items) => assert_eq!(items.len(), 4),
            _ => panic!("expected list"),
        }
        let result = run("(rest '(1 2 3 4 5))", &ctx).unwrap();
        match result {
            Value::List(items) => assert_eq!(items.len(), 4),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn self_recursive_function_counts_down() {
        let ctx = Context::new_root();
        run("(def r (fn [a] (if (.> a 0) (r (.- a 1)) a)))", &ctx).unwrap();
        let result = run("(r 10)", &ctx).unwrap();
        assert!(matches!(result, Value::Int(0)));
    }

    #[test]
    fn loop_recur_sums_to_fifty_five() {
        let ctx = Context::new_root();
        let result = run(
            "(loop [a 10 b 0] (if (.= a 0) b (recur (.- a 1) (.+ b a))))",
            &ctx,
        )
        .unwrap();
        assert!(matches!(result, Value::Int(55)));
    }

    #[test]
    fn map_as_function_head_with_default() {
        let ctx = Context::new_root();
        let result = run("({:a 1 :b 2 :c 3} :d 99)", &ctx).unwrap();
        assert!(matches!(result, Value::Int(99)));
    }

    #[test]
    fn keyword_as_function_head() {
        let ctx = Context::new_root();
        let result = run("(:a {:a 1 :b 2 :c 3})", &ctx).unwrap();
        assert!(matches!(result, Value::Int(1)));
    }

    #[test]
    fn vector_indexing_and_out_of_bounds() {
        let ctx = Context::new_root();
        let result = run("([100 200 300 400.0] 3)", &ctx).unwrap();
        assert!(matches!(result, Value::Float(f) if f == 400.0));

        let err = run("([100 200 300 400.0] -1)", &ctx).unwrap_err();
        assert!(matches!(err, EvalError::OutOfBounds { .. }));
    }

    #[test]
    fn rest_and_next_of_nil() {
        let ctx = Context::new_root();
        let result = run("(.rest nil)", &ctx).unwrap();
        assert!(matches!(result, Value::List(items) if items.is_empty()));
        let result = run("(.next nil)", &ctx).unwrap();
        assert!(matches!(result, Value::Nil));
    }

    #[test]
    fn def_after_closure_creation_is_visible_through_the_shared_root_frame() {
        let ctx = Context::new_root();
        run("(def x 1)", &ctx).unwrap();
        run("(def f (fn [] x))", &ctx).unwrap();
        run("(def x 2)", &ctx).unwrap();
        let result = run("(f)", &ctx).unwrap();
        assert!(matches!(result, Value::Int(2)));
    }

    #[test]
    fn let_bound_name_is_frozen_by_child_frame_shadowing() {
        let ctx = Context::new_root();
        run("(def f (let [x 1] (fn [] x)))", &ctx).unwrap();
        run("(def x 2)", &ctx).unwrap();
        let result = run("(f)", &ctx).unwrap();
        assert!(matches!(result, Value::Int(1)));
    }

    #[test]
    fn defmacro_builds_and_evaluates_expansion() {
        let ctx = Context::new_root();
        run("(defmacro my-if [c t e] `(if ~c ~t ~e))", &ctx).unwrap();
        let result = run("(my-if true 1 2)", &ctx).unwrap();
        assert!(matches!(result, Value::Int(1)));
    }

    #[test]
    fn recur_outside_loop_or_fn_is_misuse() {
        let ctx = Context::new_root();
        let err = run("(do (recur 1) 2)", &ctx).unwrap_err();
        assert!(matches!(err, EvalError::RecurMisuse));
    }

    #[test]
    fn variadic_function_collects_tail_as_list() {
        let ctx = Context::new_root();
        run("(def f (fn [a & rest] rest))", &ctx).unwrap();
        let result = run("(f 1 2 3)", &ctx).unwrap();
        match result {
            Value::List(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn multi_arity_function_dispatches_on_argument_count() {
        let ctx = Context::new_root();
        run("(def f (fn ([a] a) ([a b] (.+ a b))))", &ctx).unwrap();
        assert!(matches!(run("(f 5)", &ctx).unwrap(), Value::Int(5)));
        assert!(matches!(run("(f 5 6)", &ctx).unwrap(), Value::Int(11)));
    }
}
