use crate::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts of the symbols currently visible on one field.
///
/// The pool is a plain counter: it is updated incrementally as cards are placed
/// and is never recomputed. Callers must only `remove` a symbol they previously
/// added; nothing here checks that a count stays non-negative.
///
/// Symbols whose count drops back to zero are forgotten, so two pools compare
/// equal whenever every symbol has the same count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPool {
    counts: BTreeMap<Symbol, i32>,
}

impl SymbolPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: Symbol) {
        self.adjust(symbol, 1);
    }

    pub fn remove(&mut self, symbol: Symbol) {
        self.adjust(symbol, -1);
    }

    /// Returns 0 for symbols that were never added.
    pub fn count(&self, symbol: Symbol) -> i32 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> i32 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, i32)> + '_ {
        self.counts.iter().map(|(symbol, count)| (*symbol, *count))
    }

    /// True when every `(symbol, minimum)` pair is satisfied.
    pub fn satisfies(&self, requirement: &[(Symbol, u32)]) -> bool {
        requirement
            .iter()
            .all(|(symbol, minimum)| self.count(*symbol) >= *minimum as i32)
    }

    fn adjust(&mut self, symbol: Symbol, delta: i32) {
        let count = self.counts.entry(symbol).or_insert(0);
        *count += delta;
        if *count == 0 {
            self.counts.remove(&symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_symbol_counts_zero() {
        let pool = SymbolPool::new();
        assert_eq!(pool.count(Symbol::Quill), 0);
        assert_eq!(pool.total(), 0);
    }

    #[test]
    fn test_add_and_remove() {
        let mut pool = SymbolPool::new();
        pool.add(Symbol::Fungi);
        pool.add(Symbol::Fungi);
        pool.add(Symbol::Quill);
        pool.remove(Symbol::Fungi);

        assert_eq!(pool.count(Symbol::Fungi), 1);
        assert_eq!(pool.count(Symbol::Quill), 1);
        assert_eq!(pool.total(), 2);
    }

    #[test]
    fn test_zero_counts_do_not_affect_equality() {
        let mut touched = SymbolPool::new();
        touched.add(Symbol::Plant);
        touched.remove(Symbol::Plant);
        assert_eq!(touched, SymbolPool::new());
    }

    #[test]
    fn test_removal_is_unchecked() {
        let mut pool = SymbolPool::new();
        pool.remove(Symbol::Insect);
        assert_eq!(pool.count(Symbol::Insect), -1);
    }

    #[test]
    fn test_satisfies_requirement() {
        let mut pool = SymbolPool::new();
        pool.add(Symbol::Animal);
        pool.add(Symbol::Animal);
        pool.add(Symbol::Plant);

        assert!(pool.satisfies(&[(Symbol::Animal, 2), (Symbol::Plant, 1)]));
        assert!(!pool.satisfies(&[(Symbol::Animal, 3)]));
        assert!(pool.satisfies(&[]));
    }
}
