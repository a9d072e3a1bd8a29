//! The `HASHMAP` payload: an insertion-order-independent mapping keyed by
//! the content hash of the key expression.
//!
//! `hset`/`hset-in` copy before writing, so a map wrapped in an expression
//! is never mutated again; lookups on a missing key yield `nil` at the
//! primitive layer. Setting a key to `nil` removes it, which is also how
//! the original behaves.

use rustc_hash::FxHashMap;
use std::fmt;

use crate::expr::Expression;

#[derive(Debug, Clone, Default)]
pub struct HakiMap {
    entries: FxHashMap<u32, (Expression, Expression)>,
}

impl HakiMap {
    pub fn new() -> Self {
        Self { entries: FxHashMap::default() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds `key` to `value`; a `nil` value deletes the binding.
    pub fn set(&mut self, key: Expression, value: Expression) {
        if value.is_nil() {
            self.entries.remove(&key.hash());
            return;
        }
        self.entries.insert(key.hash(), (key, value));
    }

    pub fn get(&self, key: &Expression) -> Option<&Expression> {
        self.entries.get(&key.hash()).map(|(_, value)| value)
    }

    pub fn contains(&self, key: &Expression) -> bool {
        self.entries.contains_key(&key.hash())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Expression> {
        self.entries_sorted().into_iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Expression> {
        self.entries_sorted().into_iter().map(|(_, value)| value)
    }

    /// Entries ordered by key hash. This is the canonical order for
    /// printing and for folding the map's own content hash, which is what
    /// makes the hash independent of insertion order.
    pub fn entries_sorted(&self) -> Vec<(&Expression, &Expression)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(hash, (key, value))| (*hash, key, value))
            .collect();
        entries.sort_by_key(|(hash, _, _)| *hash);
        entries.into_iter().map(|(_, key, value)| (key, value)).collect()
    }
}

impl fmt::Display for HakiMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sections: Vec<String> = self
            .entries_sorted()
            .into_iter()
            .map(|(key, value)| format!("{} {}", key, value))
            .collect();
        write!(f, "(hmap {})", sections.join(", "))
    }
}
