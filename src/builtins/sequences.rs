// ABOUTME: Sequence built-ins (.list .concat .seq .first .next .rest .conj .reduce), spec.md §4.6

use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

fn elements_of(v: &Value) -> Option<Vec<Value>> {
    match v {
        Value::Nil => Some(Vec::new()),
        Value::List(items) | Value::Vector(items) => Some(items.as_ref().clone()),
        Value::Str(s) => Some(s.chars().map(Value::Char).collect()),
        Value::Map(pairs) => Some(
            pairs
                .iter()
                .map(|(k, v)| Value::Vector(Rc::new(vec![k.clone(), v.clone()])))
                .collect(),
        ),
        _ => None,
    }
}

/// `.list`: variadic constructor, collects its arguments into a List.
pub fn list(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::List(Rc::new(args.to_vec())))
}

/// `.concat`: flattens a heterogeneous mix of sequences into a single list.
pub fn concat(args: &[Value]) -> Result<Value, EvalError> {
    let mut out = Vec::new();
    for arg in args {
        match elements_of(arg) {
            Some(mut items) => out.append(&mut items),
            None => {
                return Err(EvalError::invalid_argument(
                    ".concat",
                    format!("cannot concat a {}", arg.type_name()),
                ))
            }
        }
    }
    Ok(Value::List(Rc::new(out)))
}

/// `.seq`: nil/empty collection → nil; else a list view.
pub fn seq(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(".seq", "1", args.len()));
    }
    match elements_of(&args[0]) {
        Some(items) if items.is_empty() => Ok(Value::Nil),
        Some(items) => Ok(Value::List(Rc::new(items))),
        None => Err(EvalError::invalid_argument(
            ".seq",
            format!("cannot seq a {}", args[0].type_name()),
        )),
    }
}

/// `.first`: nil/empty → nil; else first element (maps give a 2-vector).
pub fn first(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(".first", "1", args.len()));
    }
    match elements_of(&args[0]) {
        Some(items) => Ok(items.into_iter().next().unwrap_or(Value::Nil)),
        None => Err(EvalError::invalid_argument(
            ".first",
            format!("cannot take first of a {}", args[0].type_name()),
        )),
    }
}

/// `.rest`: always returns a (possibly empty) list; nil → empty list.
pub fn rest(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(".rest", "1", args.len()));
    }
    match elements_of(&args[0]) {
        Some(items) => {
            let tail = if items.is_empty() { Vec::new() } else { items[1..].to_vec() };
            Ok(Value::List(Rc::new(tail)))
        }
        None => Err(EvalError::invalid_argument(
            ".rest",
            format!("cannot take rest of a {}", args[0].type_name()),
        )),
    }
}

/// `.next`: like `(.seq (.rest x))` — nil (not empty list) when exhausted.
pub fn next(args: &[Value]) -> Result<Value, EvalError> {
    let tail = rest(args)?;
    seq(std::slice::from_ref(&tail))
}

/// `.conj`: polymorphic — list prepends, vector appends, map merges a
/// 2-vector entry; strings and nil conj as a list.
pub fn conj(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity(".conj", "2", args.len()));
    }
    let (coll, item) = (&args[0], &args[1]);
    match coll {
        Value::Vector(items) => {
            let mut v = items.as_ref().clone();
            v.push(item.clone());
            Ok(Value::Vector(Rc::new(v)))
        }
        Value::Map(pairs) => {
            let (k, v) = match item {
                Value::Vector(kv) if kv.len() == 2 => (kv[0].clone(), kv[1].clone()),
                _ => {
                    return Err(EvalError::invalid_argument(
                        ".conj",
                        "conj onto a map requires a 2-vector [key value]",
                    ))
                }
            };
            let mut out: Vec<(Value, Value)> = pairs
                .iter()
                .filter(|(ek, _)| !crate::value::value_eq(ek, &k))
                .cloned()
                .collect();
            out.push((k, v));
            Ok(Value::Map(Rc::new(out)))
        }
        Value::List(items) => {
            let mut v = vec![item.clone()];
            v.extend(items.iter().cloned());
            Ok(Value::List(Rc::new(v)))
        }
        Value::Nil | Value::Str(_) => {
            let mut v = vec![item.clone()];
            if let Value::Str(s) = coll {
                v.extend(s.chars().map(Value::Char));
            }
            Ok(Value::List(Rc::new(v)))
        }
        _ => Err(EvalError::invalid_argument(
            ".conj",
            format!("cannot conj onto a {}", coll.type_name()),
        )),
    }
}

/// `.reduce`: two- or three-argument left fold. `(reduce f coll)` seeds the
/// accumulator from the collection's first element; `(reduce f init coll)`
/// seeds it explicitly.
pub fn reduce(args: &[Value]) -> Result<Value, EvalError> {
    let (f, init, coll) = match args.len() {
        2 => {
            let items = elements_of(&args[1]).ok_or_else(|| {
                EvalError::invalid_argument(".reduce", format!("cannot reduce a {}", args[1].type_name()))
            })?;
            let mut iter = items.into_iter();
            let init = iter.next().unwrap_or(Value::Nil);
            (args[0].clone(), init, iter.collect::<Vec<_>>())
        }
        3 => {
            let items = elements_of(&args[2]).ok_or_else(|| {
                EvalError::invalid_argument(".reduce", format!("cannot reduce a {}", args[2].type_name()))
            })?;
            (args[0].clone(), args[1].clone(), items)
        }
        n => return Err(EvalError::arity(".reduce", "2-3", n)),
    };

    let mut acc = init;
    for item in coll {
        acc = crate::eval::apply(&f, &[acc, item])?;
    }
    Ok(acc)
}
