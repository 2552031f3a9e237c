//! Storage backend traits.
//!
//! The backing stores are external collaborators; these traits are the
//! whole surface the rest of the system relies on.

use bytes::Bytes;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{Blob, Document, DocumentId, Filter, Result};

/// Minimal document CRUD contract.
pub trait DocumentStore: Send + Sync {
    /// Inserts a JSON object and returns its new id.
    fn insert(&self, collection: &str, document: Value) -> Result<DocumentId>;

    /// Finds all documents matching a filter, in insertion order.
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// Finds the first document matching a filter.
    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }

    /// Finds a document by id.
    fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>>;

    /// Sets the given fields on a document. Returns false if no document matched.
    fn update(&self, collection: &str, id: &DocumentId, fields: Map<String, Value>)
        -> Result<bool>;

    /// Lists collection names.
    fn collections(&self) -> Result<Vec<String>>;
}

impl<T: DocumentStore> DocumentStore for Arc<T> {
    fn insert(&self, collection: &str, document: Value) -> Result<DocumentId> {
        (**self).insert(collection, document)
    }

    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        (**self).find(collection, filter)
    }

    fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        (**self).find_by_id(collection, id)
    }

    fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Map<String, Value>,
    ) -> Result<bool> {
        (**self).update(collection, id, fields)
    }

    fn collections(&self) -> Result<Vec<String>> {
        (**self).collections()
    }
}

/// Storage for uploaded media bytes.
pub trait BlobStore: Send + Sync {
    /// Stores bytes and returns their id.
    fn put(&self, data: Bytes, content_type: &str) -> Result<DocumentId>;

    /// Retrieves a blob by id.
    fn get(&self, id: &DocumentId) -> Result<Option<Blob>>;

    /// Number of stored blobs.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
