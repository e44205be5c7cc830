// ABOUTME: Bijective string interning for symbols and keywords

use std::collections::HashMap;

/// Interns strings to small integer ids so `Value::Symbol`/`Value::Keyword`
/// equality and hashing are O(1) id comparisons rather than string compares.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    strings: Vec<String>,
    ids: HashMap<String, u32>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `s`, returning its id. Repeated interning of the same string
    /// always returns the same id.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.ids.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.ids.insert(s.to_string(), id);
        id
    }

    /// Resolves an id back to its source text. Panics on an id this interner
    /// never produced, which would indicate a cross-interpreter Value leak.
    pub fn resolve(&self, id: u32) -> &str {
        &self.strings[id as usize]
    }
}
