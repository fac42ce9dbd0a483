//! In-process document store.
//!
//! [`MemoryStore`] keeps every collection in memory and evaluates the same
//! native filter language the MongoDB driver receives, so the whole gateway
//! can run (and be tested) without a database server.

mod matcher;

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value, json};
use tokio::sync::watch;
use tracing::debug;

use crate::core::{ConnectionState, DocumentId, DocumentStore, UpdateResult};
use crate::error::{StoreError, StoreResult};
use crate::query::{Filter, FindOptions, Projection};
use crate::types::{CollectionStats, Document, ID_FIELD, IndexSpec};

use matcher::CompiledFilter;

const DEFAULT_DATABASE: &str = "fh-db";

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Document>,
    indexes: Vec<String>,
}

/// A [`DocumentStore`] held entirely in memory.
pub struct MemoryStore {
    database: String,
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
    state: watch::Sender<ConnectionState>,
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("database", &self.database)
            .field("collections", &self.collections.read().len())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store named `fh-db`, already [`ConnectionState::Ready`].
    pub fn new() -> Self {
        Self::with_database(DEFAULT_DATABASE)
    }

    /// Creates an empty store with the given database name.
    pub fn with_database(name: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Ready);
        Self {
            database: name.into(),
            collections: RwLock::new(BTreeMap::new()),
            state,
        }
    }

    /// Publishes a connection state, as a driver would on a network event.
    pub fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    /// Returns the number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }

    fn ensure_open(&self) -> StoreResult<()> {
        match &*self.state.borrow() {
            ConnectionState::Ready => Ok(()),
            other => Err(StoreError::Unavailable {
                message: format!("connection is {}", other),
            }),
        }
    }

    fn duplicate_key(&self, collection: &str, id: &Value) -> StoreError {
        StoreError::DuplicateKey {
            message: format!(
                "E11000 duplicate key error collection: {}.{} index: _id_ dup key: {{ _id: {} }}",
                self.database, collection, id
            ),
        }
    }
}

fn generate_id() -> String {
    let bytes: [u8; 12] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn id_matches(document: &Document, id: &DocumentId) -> bool {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .is_some_and(|stored| stored == id.as_str())
}

fn serialized_size(documents: &[Document]) -> u64 {
    documents
        .iter()
        .map(|d| serde_json::to_vec(d).map_or(0, |bytes| bytes.len() as u64))
        .sum()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn parse_id(&self, value: &str) -> StoreResult<DocumentId> {
        if value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(DocumentId::Native(value.to_ascii_lowercase()))
        } else {
            Err(StoreError::InvalidId {
                value: value.to_string(),
            })
        }
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        let target = collections.entry(collection.to_string()).or_default();

        let mut stored = Vec::with_capacity(documents.len());
        for document in documents {
            let mut with_id = Map::new();
            let id = match document.get(ID_FIELD) {
                Some(id) => id.clone(),
                None => Value::String(generate_id()),
            };
            let taken = target
                .documents
                .iter()
                .chain(stored.iter())
                .any(|existing: &Document| existing.get(ID_FIELD) == Some(&id));
            if taken {
                return Err(self.duplicate_key(collection, &id));
            }
            with_id.insert(ID_FIELD.to_string(), id);
            with_id.extend(document.into_iter().filter(|(key, _)| key != ID_FIELD));
            stored.push(with_id);
        }

        target.documents.extend(stored.iter().cloned());
        debug!(collection = %collection, count = stored.len(), "memory insert");
        Ok(stored)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        self.ensure_open()?;
        let compiled = CompiledFilter::compile(filter.as_map())?;
        let mut matched: Vec<Document> = {
            let collections = self.collections.read();
            let Some(source) = collections.get(collection) else {
                return Ok(Vec::new());
            };
            source
                .documents
                .iter()
                .filter(|d| compiled.matches(d))
                .cloned()
                .collect()
        };

        if let Some(sort) = options.sort.as_ref() {
            matcher::sort(&mut matched, sort);
        }
        let skip = options.skip.map_or(0, |s| s as usize);
        let limit = options.limit.map_or(usize::MAX, |l| l as usize);
        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|d| match options.projection.as_ref() {
                Some(projection) => matcher::project(&d, projection),
                None => d,
            })
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        id: &DocumentId,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Document>> {
        self.ensure_open()?;
        let collections = self.collections.read();
        let found = collections
            .get(collection)
            .and_then(|c| c.documents.iter().find(|d| id_matches(d, id)));
        Ok(found.map(|d| match projection {
            Some(projection) => matcher::project(d, projection),
            None => d.clone(),
        }))
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> StoreResult<UpdateResult> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|c| c.documents.iter_mut().find(|d| id_matches(d, id)))
        else {
            return Ok(UpdateResult::default());
        };

        if let Some(new_id) = fields.get(ID_FIELD) {
            if document.get(ID_FIELD) != Some(new_id) {
                return Err(StoreError::Query {
                    message: "Performing an update on the path '_id' would modify the immutable field '_id'"
                        .to_string(),
                });
            }
        }

        let mut modified = false;
        for (key, value) in fields {
            if document.get(&key) != Some(&value) {
                document.insert(key, value);
                modified = true;
            }
        }
        Ok(UpdateResult {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn remove(&self, collection: &str, id: &DocumentId) -> StoreResult<u64> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        let Some(target) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match target.documents.iter().position(|d| id_matches(d, id)) {
            Some(index) => {
                target.documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn remove_all(&self, collection: &str) -> StoreResult<u64> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        Ok(collections
            .get_mut(collection)
            .map_or(0, |c| std::mem::take(&mut c.documents).len() as u64))
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<Value> {
        self.ensure_open()?;
        let existed = self.collections.write().remove(collection).is_some();
        Ok(json!({"ns": format!("{}.{}", self.database, collection), "dropped": existed}))
    }

    async fn collection_names(&self) -> StoreResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.collections.read().keys().cloned().collect())
    }

    async fn collection_stats(&self, collection: &str) -> StoreResult<CollectionStats> {
        self.ensure_open()?;
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|c| CollectionStats {
                size: serialized_size(&c.documents),
                count: c.documents.len() as u64,
            })
            .unwrap_or_default())
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> StoreResult<String> {
        self.ensure_open()?;
        let name = spec.default_name();
        let mut collections = self.collections.write();
        let target = collections.entry(collection.to_string()).or_default();
        if !target.indexes.contains(&name) {
            target.indexes.push(name.clone());
        }
        Ok(name)
    }

    async fn check_status(&self) -> StoreResult<Value> {
        self.ensure_open()?;
        Ok(json!({
            "ok": 1,
            "backend": "memory",
            "database": self.database,
            "collections": self.collections.read().len(),
        }))
    }

    async fn close(&self) -> StoreResult<()> {
        self.state.send_replace(ConnectionState::Closed);
        Ok(())
    }
}
