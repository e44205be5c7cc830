// ABOUTME: Lexical environment (a tree of frames) plus the interned symbol/keyword tables

use crate::interner::Interner;
use crate::value::{MacroValue, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// What a symbol resolves to in a frame.
#[derive(Debug, Clone)]
pub enum Binding {
    Unbound,
    Literal(Value),
    BoundMacro(Rc<MacroValue>),
}

struct FrameData {
    bindings: RefCell<HashMap<u32, Binding>>,
    parent: Option<Rc<FrameData>>,
}

/// A lexical frame plus its parent chain. Contexts are created by `let`,
/// `loop`, `fn`, and `defmacro`'s parameter binding, and are searched
/// child-first on symbol lookup (spec.md §3, §4.4).
///
/// Cloning a `Context` is an `Rc` clone: cheap, and shares the same
/// underlying frame (this is how closures capture their defining scope).
#[derive(Clone)]
pub struct Context {
    frame: Rc<FrameData>,
    root: Rc<FrameData>,
    interners: Rc<RefCell<Interners>>,
}

#[derive(Default)]
struct Interners {
    symbols: Interner,
    keywords: Interner,
}

impl Context {
    /// Creates a fresh root context with no parent and empty intern tables.
    pub fn new_root() -> Self {
        let frame = Rc::new(FrameData {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        });
        Context {
            frame: frame.clone(),
            root: frame,
            interners: Rc::new(RefCell::new(Interners::default())),
        }
    }

    /// Creates a child frame whose parent is `self`. Lookups in the child
    /// see its own bindings first, then fall through to `self`'s chain.
    pub fn child(&self) -> Self {
        let frame = Rc::new(FrameData {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(self.frame.clone()),
        });
        Context {
            frame,
            root: self.root.clone(),
            interners: self.interners.clone(),
        }
    }

    /// `def` always writes to the root frame, regardless of which frame
    /// `self` is.
    pub fn def(&self, sym: u32, binding: Binding) {
        self.root.bindings.borrow_mut().insert(sym, binding);
    }

    /// Binds a name in *this* frame only (used by `let`/`loop`/`fn` param
    /// binding) — never walks to root.
    pub fn bind_local(&self, sym: u32, value: Value) {
        self.frame
            .bindings
            .borrow_mut()
            .insert(sym, Binding::Literal(value));
    }

    /// Walks child -> parent -> ... -> root looking for `sym`.
    pub fn lookup(&self, sym: u32) -> Option<Binding> {
        let mut current = self.frame.clone();
        loop {
            if let Some(b) = current.bindings.borrow().get(&sym) {
                return Some(b.clone());
            }
            match current.parent.clone() {
                Some(p) => current = p,
                None => return None,
            }
        }
    }

    pub fn intern_symbol(&self, s: &str) -> u32 {
        self.interners.borrow_mut().symbols.intern(s)
    }

    pub fn intern_keyword(&self, s: &str) -> u32 {
        self.interners.borrow_mut().keywords.intern(s)
    }

    pub fn resolve_symbol(&self, id: u32) -> String {
        self.interners.borrow().symbols.resolve(id).to_string()
    }

    pub fn resolve_keyword(&self, id: u32) -> String {
        self.interners.borrow().keywords.resolve(id).to_string()
    }
}
