// ABOUTME: The runtime value type and its supporting function/macro representations

use crate::context::Context;
use crate::error::EvalError;
use crate::special_form::SpecialForm;
use std::fmt;
use std::rc::Rc;

/// A built-in function: a name (for error messages and `#<builtin:...>`
/// printing) plus a plain `fn` pointer. Built-ins never capture state, so
/// there is no environment to carry around.
#[derive(Clone, Copy)]
pub struct BuiltinFn {
    pub name: &'static str,
    pub func: fn(&[Value]) -> Result<Value, EvalError>,
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFn({})", self.name)
    }
}

/// One arity branch of a multi-arity `fn` (spec.md §4.4 "Fn").
#[derive(Debug, Clone)]
pub struct Arity {
    pub params: Vec<u32>,
    pub variadic: Option<u32>,
    pub body: Vec<Value>,
}

impl Arity {
    pub fn accepts(&self, argc: usize) -> bool {
        if self.variadic.is_some() {
            argc >= self.params.len()
        } else {
            argc == self.params.len()
        }
    }
}

/// A user-defined function: its name (if bound via `def`/`defn`, used in
/// error messages), its arity branches, and the `Context` it closes over
/// at the point of definition.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub name: Option<u32>,
    pub arities: Vec<Arity>,
    pub env: Context,
}

impl FunctionValue {
    pub fn find_arity(&self, argc: usize) -> Option<&Arity> {
        self.arities.iter().find(|a| a.accepts(argc))
    }
}

/// A user-defined macro: unlike `FunctionValue`, it carries no captured
/// `Context` (macro expansion is unhygienic, spec.md §4.5) and its params
/// are bound to unevaluated argument forms.
#[derive(Debug, Clone)]
pub struct MacroValue {
    pub name: u32,
    pub params: Vec<u32>,
    pub variadic: Option<u32>,
    pub body: Vec<Value>,
}

/// Which reader macro a `Value::ReaderMacro` node came from. These nodes
/// only exist between the parser and the reader-macro expansion pass
/// (spec.md §4.3); a fully-expanded tree never contains one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderMacroKind {
    Quote,
    SyntaxQuote,
    Unquote,
    UnquoteSplice,
}

/// A value in the running program. Numbers are split into `Int`/`Float`
/// deliberately: `.=` treats them as distinct types even when numerically
/// equal (spec.md §4.6), while `.==` promotes across the split.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(Rc<str>),
    Keyword(u32),
    Symbol(u32),
    List(Rc<Vec<Value>>),
    Vector(Rc<Vec<Value>>),
    Map(Rc<Vec<(Value, Value)>>),
    Function(Rc<FunctionValue>),
    BuiltIn(BuiltinFn),
    Special(SpecialForm),
    Macro(Rc<MacroValue>),
    ReaderMacro(ReaderMacroKind, Rc<Value>),
    Regex(Rc<str>),
    /// The sentinel produced by `(recur ...)`. Must only ever appear in
    /// tail position of a `loop` or `fn` body; surfacing anywhere else is
    /// `EvalError::RecurMisuse`.
    Recur(Rc<Vec<Value>>),
}

impl Value {
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::BuiltIn(_) => "builtin",
            Value::Special(_) => "special-form",
            Value::Macro(_) => "macro",
            Value::ReaderMacro(..) => "reader-macro",
            Value::Regex(_) => "regex",
            Value::Recur(_) => "recur",
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) | Value::Vector(v) => Some(v),
            Value::Nil => Some(&[]),
            _ => None,
        }
    }
}

/// Structural equality per spec.md §4.6's `.=`: type-sensitive for scalars
/// (an `Int` is never `.=` a `Float`, even `1` vs `1.0`), but `List` and
/// `Vector` compare equal to each other when their elements do — matching
/// the reference Clojure semantics this dialect imitates.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Keyword(x), Value::Keyword(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Regex(x), Value::Regex(y)) => x == y,
        (Value::List(x) | Value::Vector(x), Value::List(y) | Value::Vector(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| value_eq(p, q))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| {
                    y.iter()
                        .any(|(k2, v2)| value_eq(k, k2) && value_eq(v, v2))
                })
        }
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Macro(x), Value::Macro(y)) => Rc::ptr_eq(x, y),
        (Value::BuiltIn(x), Value::BuiltIn(y)) => x.name == y.name,
        (Value::Special(x), Value::Special(y)) => x == y,
        _ => false,
    }
}

/// Numeric equality per spec.md §4.6's `.==`: promotes across the
/// `Int`/`Float` split instead of treating them as distinct types.
pub fn value_numeq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        _ => false,
    }
}

/// Pairs a `Value` with the `Context` that owns its symbol/keyword tables,
/// since printing a `Symbol`/`Keyword` requires resolving an interned id
/// back to source text.
pub struct Printer<'a> {
    pub value: &'a Value,
    pub ctx: &'a Context,
}

impl fmt::Display for Printer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_value(self.value, self.ctx, f)
    }
}

fn print_value(value: &Value, ctx: &Context, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Nil => write!(f, "nil"),
        Value::Bool(true) => write!(f, "true"),
        Value::Bool(false) => write!(f, "false"),
        Value::Int(n) => write!(f, "{n}"),
        Value::Float(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                write!(f, "{n:.1}")
            } else {
                write!(f, "{n}")
            }
        }
        Value::Char(c) => write!(f, "\\{c}"),
        Value::Str(s) => write!(f, "{s:?}"),
        Value::Keyword(id) => write!(f, ":{}", ctx.resolve_keyword(*id)),
        Value::Symbol(id) => write!(f, "{}", ctx.resolve_symbol(*id)),
        Value::List(items) => print_seq(items, '(', ')', ctx, f),
        Value::Vector(items) => print_seq(items, '[', ']', ctx, f),
        Value::Map(pairs) => {
            write!(f, "{{")?;
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                print_value(k, ctx, f)?;
                write!(f, " ")?;
                print_value(v, ctx, f)?;
            }
            write!(f, "}}")
        }
        Value::Function(func) => match func.name {
            Some(id) => write!(f, "#<fn:{}>", ctx.resolve_symbol(id)),
            None => write!(f, "#<fn>"),
        },
        Value::BuiltIn(b) => write!(f, "#<builtin:{}>", b.name),
        Value::Special(sf) => write!(f, "#<special:{}>", sf.name()),
        Value::Macro(m) => write!(f, "#<macro:{}>", ctx.resolve_symbol(m.name)),
        Value::ReaderMacro(kind, inner) => {
            let prefix = match kind {
                ReaderMacroKind::Quote => "'",
                ReaderMacroKind::SyntaxQuote => "`",
                ReaderMacroKind::Unquote => "~",
                ReaderMacroKind::UnquoteSplice => "~@",
            };
            write!(f, "{prefix}")?;
            print_value(inner, ctx, f)
        }
        Value::Regex(pattern) => write!(f, "#\"{pattern}\""),
        Value::Recur(_) => write!(f, "#<recur>"),
    }
}

fn print_seq(
    items: &[Value],
    open: char,
    close: char,
    ctx: &Context,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        print_value(v, ctx, f)?;
    }
    write!(f, "{close}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new_root()
    }

    #[test]
    fn ints_and_floats_are_not_value_eq() {
        assert!(!value_eq(&Value::Int(1), &Value::Float(1.0)));
        assert!(value_numeq(&Value::Int(1), &Value::Float(1.0)));
    }

    #[test]
    fn list_and_vector_compare_elementwise() {
        let l = Value::List(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        let v = Value::Vector(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        assert!(value_eq(&l, &v));
    }

    #[test]
    fn float_prints_with_trailing_point_zero() {
        let c = ctx();
        let s = format!(
            "{}",
            Printer {
                value: &Value::Float(400.0),
                ctx: &c
            }
        );
        assert_eq!(s, "400.0");
    }

    #[test]
    fn nested_list_prints_round_trippable() {
        let c = ctx();
        let inner = Value::List(Rc::new(vec![Value::Int(2), Value::Int(3)]));
        let outer = Value::List(Rc::new(vec![Value::Int(1), inner]));
        let s = format!("{}", Printer { value: &outer, ctx: &c });
        assert_eq!(s, "(1 (2 3))");
    }

    #[test]
    fn keyword_and_symbol_print_by_resolved_name() {
        let c = ctx();
        let kw = c.intern_keyword("foo");
        let sym = c.intern_symbol("bar");
        assert_eq!(
            format!(
                "{}",
                Printer {
                    value: &Value::Keyword(kw),
                    ctx: &c
                }
            ),
            ":foo"
        );
        assert_eq!(
            format!(
                "{}",
                Printer {
                    value: &Value::Symbol(sym),
                    ctx: &c
                }
            ),
            "bar"
        );
    }
}
