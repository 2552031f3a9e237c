//! Media blobs.

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::{BlobStore, DocumentId, Result};

/// Stored media bytes with their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: String,
    pub data: Bytes,
    /// Unix timestamp of the upload.
    pub created_at: u64,
}

/// Thread-safe in-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<DocumentId, Blob>>,
}

impl MemoryBlobStore {
    /// Creates a new empty blob store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, data: Bytes, content_type: &str) -> Result<DocumentId> {
        let id = DocumentId::generate();
        let blob = Blob {
            content_type: content_type.to_string(),
            data,
            created_at: vibe_types::unix_now(),
        };
        self.blobs.write().insert(id.clone(), blob);
        Ok(id)
    }

    fn get(&self, id: &DocumentId) -> Result<Option<Blob>> {
        Ok(self.blobs.read().get(id).cloned())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.blobs.read().len())
    }
}
