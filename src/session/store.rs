// SPDX-License-Identifier: GPL-3.0-only

//! In-memory ordered set of confirmed ISBNs for the active session

use std::collections::HashSet;

/// One confirmed ISBN, immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedItem {
    /// Normalized ISBN digit string
    pub isbn: String,
    /// Strictly increasing sequence number assigned at insertion
    pub order: u64,
}

/// Ordered, deduplicated store of scanned items.
///
/// Uniqueness is keyed by ISBN; insertion order is preserved for display
/// and "first scanned" semantics.
#[derive(Debug, Default)]
pub struct SessionStore {
    items: Vec<ScannedItem>,
    seen: HashSet<String>,
    next_order: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an ISBN if not already present.
    ///
    /// Returns `false` without modifying anything when the ISBN is already
    /// in the store (idempotent).
    pub fn add(&mut self, isbn: String) -> bool {
        if self.seen.contains(&isbn) {
            return false;
        }
        let order = self.next_order;
        self.next_order += 1;
        self.seen.insert(isbn.clone());
        self.items.push(ScannedItem { isbn, order });
        true
    }

    /// Remove an ISBN if present; no-op otherwise. Returns whether an item
    /// was removed.
    pub fn remove(&mut self, isbn: &str) -> bool {
        if !self.seen.remove(isbn) {
            return false;
        }
        self.items.retain(|item| item.isbn != isbn);
        true
    }

    /// Items in insertion order
    pub fn list(&self) -> &[ScannedItem] {
        &self.items
    }

    /// Just the ISBN strings, in insertion order
    pub fn isbns(&self) -> Vec<String> {
        self.items.iter().map(|item| item.isbn.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut store = SessionStore::new();
        assert!(store.add("9780306406157".to_string()));
        assert!(!store.add("9780306406157".to_string()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.isbns(), vec!["9780306406157"]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = SessionStore::new();
        let codes = ["9780306406157", "9781593278281", "9780132350884"];
        for code in codes {
            store.add(code.to_string());
        }
        assert_eq!(store.isbns(), codes);

        let orders: Vec<u64> = store.list().iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_order_survives_removal() {
        let mut store = SessionStore::new();
        store.add("a".to_string());
        store.add("b".to_string());
        assert!(store.remove("a"));
        store.add("c".to_string());

        // Sequence numbers keep increasing even after removals
        let orders: Vec<u64> = store.list().iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(store.isbns(), vec!["b", "c"]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = SessionStore::new();
        store.add("a".to_string());
        assert!(!store.remove("b"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_readd_after_remove() {
        let mut store = SessionStore::new();
        store.add("a".to_string());
        store.remove("a");
        assert!(store.add("a".to_string()));
    }

    #[test]
    fn test_clear() {
        let mut store = SessionStore::new();
        store.add("a".to_string());
        store.clear();
        assert!(store.is_empty());
        assert!(store.add("a".to_string()));
    }
}
