use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// In-memory mapping from key to serialized (and possibly encrypted) value text.
///
/// Serializes as a plain object of key to text, which is exactly the shape of
/// the backing file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    entries: BTreeMap<String, String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert a value, replacing any existing entry for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key, returning the prior text if there was one.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_existing_entry() {
        let mut store = Store::new();
        store.set("k", "first");
        store.set("k", "second");

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k"), Some("second"));
    }

    #[test]
    fn remove_is_noop_for_missing_key() {
        let mut store = Store::new();
        store.set("k", "v");

        assert_eq!(store.remove("missing"), None);
        assert_eq!(store.remove("k").as_deref(), Some("v"));
        assert_eq!(store.remove("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn keys_are_sorted() {
        let mut store = Store::new();
        for key in ["pear", "apple", "Zebra", "banana"] {
            store.set(key, "x");
        }

        assert_eq!(store.keys(), vec!["Zebra", "apple", "banana", "pear"]);
        assert_eq!(store.keys().len(), store.len());
    }

    #[test]
    fn fresh_store_has_no_keys() {
        let store = Store::new();
        assert!(store.keys().is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut store = Store::new();
        store.set("b", "\"two\"");
        store.set("a", "1");

        let json = serde_json::to_string(&store).expect("serialize");
        assert_eq!(json, r#"{"a":"1","b":"\"two\""}"#);

        let parsed: Store = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, store);
    }

    #[test]
    fn clear_empties_everything() {
        let mut store = Store::new();
        store.set("a", "1");
        store.set("b", "2");
        store.clear();

        assert!(store.is_empty());
        assert!(!store.contains_key("a"));
    }
}
