//! Storage for Vibe chat.
//!
//! The realtime core and the HTTP layer only need a minimal CRUD contract
//! from storage: insert a document, find documents by filter, update fields.
//! [`DocumentStore`] is that contract and [`MemoryStore`] an in-process
//! implementation of it. [`ChatStore`] layers typed access to users, chats and
//! messages on top. Media bytes go through the separate [`BlobStore`].

mod blob;
mod chat_store;
mod document;
mod error;
mod memory;
mod traits;

pub use blob::{Blob, MemoryBlobStore};
pub use chat_store::{ChatStore, Record};
pub use document::{Condition, Document, DocumentId, Filter};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use traits::{BlobStore, DocumentStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
