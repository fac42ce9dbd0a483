//! A fault-injecting store wrapper.
//!
//! Wraps a [`MemoryStore`] and can fail or delay individual operations,
//! report namespaced collection names, inject extra collection names, and
//! count every store call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use helios_gateway::MemoryStore;
use helios_gateway::core::{ConnectionState, DocumentId, DocumentStore, UpdateResult};
use helios_gateway::error::{StoreError, StoreResult};
use helios_gateway::query::{Filter, FindOptions, Projection};
use helios_gateway::types::{CollectionStats, Document, IndexSpec};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

/// A [`DocumentStore`] that misbehaves on request.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    fail_remove: AtomicBool,
    fail_find_one: AtomicBool,
    skip_updates: AtomicBool,
    fail_update: AtomicBool,
    namespaced_names: AtomicBool,
    extra_names: Mutex<Vec<String>>,
    insert_failures: Mutex<Vec<(String, String)>>,
    insert_delays: Mutex<Vec<(String, Duration)>>,
}

impl FaultyStore {
    /// Wraps a fresh in-memory store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every `remove` fail.
    pub fn fail_removes(&self) {
        self.fail_remove.store(true, Ordering::SeqCst);
    }

    /// Makes every `find_one` fail.
    pub fn fail_reads(&self) {
        self.fail_find_one.store(true, Ordering::SeqCst);
    }

    /// Makes every `update` report zero matches without writing.
    pub fn skip_updates(&self) {
        self.skip_updates.store(true, Ordering::SeqCst);
    }

    /// Makes every `update` fail.
    pub fn fail_updates(&self) {
        self.fail_update.store(true, Ordering::SeqCst);
    }

    /// Reports collection names as `<database>.<name>`.
    pub fn namespace_names(&self) {
        self.namespaced_names.store(true, Ordering::SeqCst);
    }

    /// Adds a name to every collection listing.
    pub fn add_name(&self, name: &str) {
        self.extra_names.lock().push(name.to_string());
    }

    /// Fails inserts into the collection with the given message.
    pub fn fail_insert(&self, collection: &str, message: &str) {
        self.insert_failures
            .lock()
            .push((collection.to_string(), message.to_string()));
    }

    /// Delays inserts into the collection.
    pub fn delay_insert(&self, collection: &str, delay: Duration) {
        self.insert_delays.lock().push((collection.to_string(), delay));
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn injected(message: &str) -> StoreError {
        StoreError::Query {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    fn backend_name(&self) -> &'static str {
        "faulty"
    }

    fn database_name(&self) -> &str {
        self.inner.database_name()
    }

    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state()
    }

    fn parse_id(&self, value: &str) -> StoreResult<DocumentId> {
        self.inner.parse_id(value)
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        self.record_call();
        let delay = self
            .insert_delays
            .lock()
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .insert_failures
            .lock()
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, message)| message.clone());
        if let Some(message) = failure {
            return Err(Self::injected(&message));
        }
        self.inner.insert(collection, documents).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        self.record_call();
        self.inner.find(collection, filter, options).await
    }

    async fn find_one(
        &self,
        collection: &str,
        id: &DocumentId,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Document>> {
        self.record_call();
        if self.fail_find_one.load(Ordering::SeqCst) {
            return Err(Self::injected("read failed"));
        }
        self.inner.find_one(collection, id, projection).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> StoreResult<UpdateResult> {
        self.record_call();
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Self::injected("update failed"));
        }
        if self.skip_updates.load(Ordering::SeqCst) {
            return Ok(UpdateResult::default());
        }
        self.inner.update(collection, id, fields).await
    }

    async fn remove(&self, collection: &str, id: &DocumentId) -> StoreResult<u64> {
        self.record_call();
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(Self::injected("remove failed"));
        }
        self.inner.remove(collection, id).await
    }

    async fn remove_all(&self, collection: &str) -> StoreResult<u64> {
        self.record_call();
        self.inner.remove_all(collection).await
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<Value> {
        self.record_call();
        self.inner.drop_collection(collection).await
    }

    async fn collection_names(&self) -> StoreResult<Vec<String>> {
        self.record_call();
        let mut names = self.inner.collection_names().await?;
        names.extend(self.extra_names.lock().iter().cloned());
        if self.namespaced_names.load(Ordering::SeqCst) {
            let database = self.inner.database_name().to_string();
            names = names
                .into_iter()
                .map(|name| format!("{}.{}", database, name))
                .collect();
        }
        Ok(names)
    }

    async fn collection_stats(&self, collection: &str) -> StoreResult<CollectionStats> {
        self.record_call();
        self.inner.collection_stats(collection).await
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> StoreResult<String> {
        self.record_call();
        self.inner.create_index(collection, spec).await
    }

    async fn check_status(&self) -> StoreResult<Value> {
        self.record_call();
        self.inner.check_status().await
    }

    async fn close(&self) -> StoreResult<()> {
        self.inner.close().await
    }
}
