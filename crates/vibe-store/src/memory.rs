//! In-memory document store.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::document::ID_FIELD;
use crate::{Document, DocumentId, DocumentStore, Filter, Result};

/// Thread-safe in-memory document store.
///
/// Collections are created on first insert. Documents keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, document: Value) -> Result<DocumentId> {
        let id = DocumentId::generate();
        let document = Document::from_value(id.clone(), collection, document)?;

        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document);

        tracing::trace!(collection, id = %id, "Document inserted");
        Ok(id)
    }

    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| &d.id == id).cloned()))
    }

    fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<bool> {
        let mut collections = self.collections.write();
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| &d.id == id))
        else {
            return Ok(false);
        };

        for (key, value) in fields {
            if key != ID_FIELD {
                document.fields.insert(key, value);
            }
        }
        Ok(true)
    }

    fn collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_insert_and_find() {
        let store = MemoryStore::new();
        let id = store.insert("user", json!({"username": "alice"})).unwrap();

        let found = store.find_by_id("user", &id).unwrap().unwrap();
        assert_eq!(found.get("username"), Some(&json!("alice")));

        let all = store.find("user", &Filter::all()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(store.count("user"), 1);
    }

    #[test]
    fn test_find_in_missing_collection() {
        let store = MemoryStore::new();
        assert!(store.find("nothing", &Filter::all()).unwrap().is_empty());
        assert!(store
            .find_by_id("nothing", &DocumentId::generate())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_preserves_insertion_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert("message", json!({"n": i, "chat_id": "c"})).unwrap();
        }

        let found = store.find("message", &Filter::all().eq("chat_id", "c")).unwrap();
        let order: Vec<_> = found.iter().map(|d| d.get("n").cloned()).collect();
        assert_eq!(
            order,
            (0..5).map(|i| Some(json!(i))).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_find_one() {
        let store = MemoryStore::new();
        store.insert("user", json!({"username": "alice"})).unwrap();
        store.insert("user", json!({"username": "bob"})).unwrap();

        let bob = store
            .find_one("user", &Filter::all().eq("username", "bob"))
            .unwrap()
            .unwrap();
        assert_eq!(bob.get("username"), Some(&json!("bob")));
        assert!(store
            .find_one("user", &Filter::all().eq("username", "carol"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_sets_fields() {
        let store = MemoryStore::new();
        let id = store
            .insert("chat", json!({"participants": [], "last_message_preview": null}))
            .unwrap();

        let mut fields = Map::new();
        fields.insert("last_message_preview".into(), json!("hi"));
        fields.insert("_id".into(), json!("hijack"));
        assert!(store.update("chat", &id, fields).unwrap());

        let chat = store.find_by_id("chat", &id).unwrap().unwrap();
        assert_eq!(chat.get("last_message_preview"), Some(&json!("hi")));
        assert_eq!(chat.id, id);
    }

    #[test]
    fn test_update_missing_document() {
        let store = MemoryStore::new();
        assert!(!store
            .update("chat", &DocumentId::generate(), Map::new())
            .unwrap());
    }

    #[test]
    fn test_collections_listed() {
        let store = MemoryStore::new();
        store.insert("user", json!({})).unwrap();
        store.insert("chat", json!({})).unwrap();

        assert_eq!(store.collections().unwrap(), vec!["chat", "user"]);
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.insert("message", json!({"t": t, "i": i})).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count("message"), 400);
    }
}
