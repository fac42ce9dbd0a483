//! The document-store driver boundary.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::StoreResult;
use crate::query::{Filter, FindOptions, Projection};
use crate::types::{CollectionStats, Document, IndexSpec};

use super::ConnectionState;

/// A record identifier as the store understands it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    /// A store-native identifier, as its 24-character lowercase hex form.
    Native(String),
    /// Any other value, matched verbatim against the stored `_id`.
    Raw(String),
}

impl DocumentId {
    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        match self {
            DocumentId::Native(hex) => hex,
            DocumentId::Raw(raw) => raw,
        }
    }

    /// Returns `true` for a native identifier.
    pub fn is_native(&self) -> bool {
        matches!(self, DocumentId::Native(_))
    }

    /// Returns the identifier as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Number of documents the filter matched.
    pub matched: u64,
    /// Number of documents actually changed.
    pub modified: u64,
}

/// A document-store driver.
///
/// Collections are addressed by their physical name; tenant naming is
/// applied by the gateway before a store is ever called. Documents cross
/// this boundary as JSON objects, with native identifiers rendered as hex
/// strings in `_id`.
///
/// Implementations must be safe for concurrent use: the gateway holds one
/// store for its whole lifetime and fans out over it.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Returns a short name for logs (`memory`, `mongodb`).
    fn backend_name(&self) -> &'static str;

    /// Returns the name of the connected database.
    fn database_name(&self) -> &str;

    /// Subscribes to connection state changes.
    fn connection_state(&self) -> watch::Receiver<ConnectionState>;

    /// Parses a native identifier from its hex form.
    ///
    /// Fails with `StoreError::InvalidId` when the text is not a native id.
    fn parse_id(&self, value: &str) -> StoreResult<DocumentId>;

    /// Inserts documents, assigning `_id` where absent, and returns them as
    /// stored.
    async fn insert(&self, collection: &str, documents: Vec<Document>)
    -> StoreResult<Vec<Document>>;

    /// Returns the documents matching a filter.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    /// Returns the document with the given identifier.
    async fn find_one(
        &self,
        collection: &str,
        id: &DocumentId,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Document>>;

    /// Merges `fields` into the document with the given identifier.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> StoreResult<UpdateResult>;

    /// Removes the document with the given identifier; returns the number
    /// removed.
    async fn remove(&self, collection: &str, id: &DocumentId) -> StoreResult<u64>;

    /// Removes every document of a collection; returns the number removed.
    async fn remove_all(&self, collection: &str) -> StoreResult<u64>;

    /// Drops a collection and returns the store's result descriptor.
    async fn drop_collection(&self, collection: &str) -> StoreResult<Value>;

    /// Lists physical collection names. Names may carry a `"<database>."`
    /// namespace prefix.
    async fn collection_names(&self) -> StoreResult<Vec<String>>;

    /// Returns size and count statistics for a collection.
    async fn collection_stats(&self, collection: &str) -> StoreResult<CollectionStats>;

    /// Creates an index and returns its name.
    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> StoreResult<String>;

    /// Health check; returns the store's status document.
    async fn check_status(&self) -> StoreResult<Value>;

    /// Closes the connection.
    async fn close(&self) -> StoreResult<()>;
}
