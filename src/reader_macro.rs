// ABOUTME: Expands parsed ReaderMacro nodes (' ` ~ ~@) into plain evaluable forms, spec.md §4.3

use crate::context::Context;
use crate::error::ReadError;
use crate::special_form::SpecialForm;
use crate::value::{ReaderMacroKind, Value};
use std::rc::Rc;

fn quote_form(x: Value) -> Value {
    Value::List(Rc::new(vec![Value::Special(SpecialForm::Quote), x]))
}

fn builtin_call(name: &str, args: Vec<Value>) -> Value {
    let builtin = crate::builtins::lookup(name).expect("reader-macro builtin name must be registered");
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::BuiltIn(builtin));
    items.extend(args);
    Value::List(Rc::new(items))
}

/// Turns every `ReaderMacro` node in `value` into a plain expression. After
/// this pass no `ReaderMacro` variant remains (spec.md §3 invariant).
pub fn expand(value: &Value, ctx: &Context) -> Result<Value, ReadError> {
    match value {
        Value::ReaderMacro(ReaderMacroKind::Quote, inner) => Ok(quote_form(expand(inner, ctx)?)),
        Value::ReaderMacro(ReaderMacroKind::SyntaxQuote, inner) => expand_syntax_quote(inner, 1, ctx),
        Value::ReaderMacro(ReaderMacroKind::Unquote, _)
        | Value::ReaderMacro(ReaderMacroKind::UnquoteSplice, _) => {
            Err(ReadError::MismatchedReaderMacro)
        }
        Value::List(items) => Ok(Value::List(Rc::new(expand_each(items, ctx)?))),
        Value::Vector(items) => Ok(Value::Vector(Rc::new(expand_each(items, ctx)?))),
        Value::Map(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs.iter() {
                out.push((expand(k, ctx)?, expand(v, ctx)?));
            }
            Ok(Value::Map(Rc::new(out)))
        }
        other => Ok(other.clone()),
    }
}

fn expand_each(items: &[Value], ctx: &Context) -> Result<Vec<Value>, ReadError> {
    items.iter().map(|v| expand(v, ctx)).collect()
}

/// Computes the replacement for `x`, the direct body of a syntax-quote at
/// nesting `depth` (number of enclosing, not-yet-cancelled syntax-quotes
/// including this one). Only `depth == 1` is exercised by the spec's test
/// suite; deeper nesting falls back to symmetrically decrementing/
/// incrementing depth per spec.md §9's design note.
fn expand_syntax_quote(x: &Value, depth: i32, ctx: &Context) -> Result<Value, ReadError> {
    match x {
        Value::Symbol(_) => Ok(quote_form(x.clone())),
        Value::List(items) => build_seq_concat(items, depth, ctx),
        Value::Vector(items) => build_seq_concat(items, depth, ctx),
        Value::ReaderMacro(ReaderMacroKind::Unquote, y) => {
            if depth <= 1 {
                expand(y, ctx)
            } else {
                expand_syntax_quote(y, depth - 1, ctx)
            }
        }
        Value::ReaderMacro(ReaderMacroKind::UnquoteSplice, y) => {
            if depth <= 1 {
                Err(ReadError::MismatchedReaderMacro)
            } else {
                expand_syntax_quote(y, depth - 1, ctx)
            }
        }
        Value::ReaderMacro(ReaderMacroKind::SyntaxQuote, y) => expand_syntax_quote(y, depth + 1, ctx),
        Value::ReaderMacro(ReaderMacroKind::Quote, y) => Ok(quote_form(expand(y, ctx)?)),
        other => Ok(other.clone()),
    }
}

/// Builds `(.seq (.concat <slot-a1> <slot-a2> ...))` for a List/Vector body
/// of a syntax-quote, per spec.md §4.3's per-element slot rule.
fn build_seq_concat(items: &[Value], depth: i32, ctx: &Context) -> Result<Value, ReadError> {
    let mut slots = Vec::with_capacity(items.len());
    for item in items {
        let slot = match item {
            Value::ReaderMacro(ReaderMacroKind::Unquote, y) if depth <= 1 => {
                builtin_call(".list", vec![expand(y, ctx)?])
            }
            Value::ReaderMacro(ReaderMacroKind::UnquoteSplice, y) if depth <= 1 => expand(y, ctx)?,
            _ => builtin_call(".list", vec![expand_syntax_quote(item, depth, ctx)?]),
        };
        slots.push(slot);
    }
    Ok(builtin_call(".seq", vec![builtin_call(".concat", slots)]))
}
