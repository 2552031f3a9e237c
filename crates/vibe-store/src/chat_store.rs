//! Typed access to users, chats and messages.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use vibe_types::{collections, Chat, Message, User};

use crate::{Document, DocumentId, DocumentStore, Filter, Result};

/// A typed document together with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub value: T,
}

impl<T: DeserializeOwned> Record<T> {
    fn from_document(document: Document) -> Result<Self> {
        Ok(Self {
            id: document.id,
            value: serde_json::from_value(Value::Object(document.fields))?,
        })
    }
}

fn records<T: DeserializeOwned>(documents: Vec<Document>) -> Result<Vec<Record<T>>> {
    documents.into_iter().map(Record::from_document).collect()
}

/// Chat-domain facade over a [`DocumentStore`].
#[derive(Clone)]
pub struct ChatStore {
    documents: Arc<dyn DocumentStore>,
}

impl ChatStore {
    /// Wraps a document store.
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// The underlying document store.
    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    fn insert<T: Serialize>(&self, collection: &str, value: &T) -> Result<DocumentId> {
        self.documents
            .insert(collection, serde_json::to_value(value)?)
    }

    // ==================== Users ====================

    /// Inserts a user.
    pub fn create_user(&self, user: &User) -> Result<DocumentId> {
        self.insert(collections::USER, user)
    }

    /// Finds a user by username.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<Record<User>>> {
        self.documents
            .find_one(collections::USER, &Filter::all().eq("username", username))?
            .map(Record::from_document)
            .transpose()
    }

    /// Lists all users.
    pub fn list_users(&self) -> Result<Vec<Record<User>>> {
        records(self.documents.find(collections::USER, &Filter::all())?)
    }

    // ==================== Chats ====================

    /// Inserts a chat.
    pub fn create_chat(&self, chat: &Chat) -> Result<DocumentId> {
        self.insert(collections::CHAT, chat)
    }

    /// Finds a chat by id.
    pub fn find_chat(&self, id: &DocumentId) -> Result<Option<Record<Chat>>> {
        self.documents
            .find_by_id(collections::CHAT, id)?
            .map(Record::from_document)
            .transpose()
    }

    /// Lists chats, optionally only those a user takes part in.
    pub fn list_chats(&self, participant: Option<&DocumentId>) -> Result<Vec<Record<Chat>>> {
        let filter = match participant {
            Some(user_id) => Filter::all().contains("participants", user_id.as_str()),
            None => Filter::all(),
        };
        records(self.documents.find(collections::CHAT, &filter)?)
    }

    /// Sets a chat's latest message preview.
    pub fn set_last_message_preview(&self, chat_id: &DocumentId, preview: &str) -> Result<bool> {
        let mut fields = Map::new();
        fields.insert(
            "last_message_preview".to_string(),
            Value::String(preview.to_string()),
        );
        self.documents.update(collections::CHAT, chat_id, fields)
    }

    // ==================== Messages ====================

    /// Inserts a message.
    pub fn create_message(&self, message: &Message) -> Result<DocumentId> {
        self.insert(collections::MESSAGE, message)
    }

    /// Lists the messages of a chat in insertion order.
    pub fn list_messages(&self, chat_id: &DocumentId) -> Result<Vec<Record<Message>>> {
        records(self.documents.find(
            collections::MESSAGE,
            &Filter::all().eq("chat_id", chat_id.as_str()),
        )?)
    }

    /// Lists collection names.
    pub fn collections(&self) -> Result<Vec<String>> {
        self.documents.collections()
    }
}
