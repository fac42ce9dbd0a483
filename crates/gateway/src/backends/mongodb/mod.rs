//! MongoDB document store.
//!
//! Thin adapter from [`DocumentStore`] onto the official `mongodb` driver.
//! The driver owns pooling and concurrency limits; the adapter only converts
//! documents and publishes connection state.

mod convert;

use std::fmt::{self, Debug};
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, doc, oid::ObjectId};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::core::{ConnectionState, DocumentId, DocumentStore, UpdateResult};
use crate::error::{StoreError, StoreResult};
use crate::query::{Filter, FindOptions, Projection};
use crate::types::{CollectionStats, Document, ID_FIELD, IndexSpec};

use convert::{id_filter, number, to_bson_document, to_insertable, to_json_document};

/// A [`DocumentStore`] backed by a MongoDB database.
pub struct MongoStore {
    client: Client,
    database: Database,
    name: String,
    state: watch::Sender<ConnectionState>,
}

impl Debug for MongoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStore")
            .field("database", &self.name)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl MongoStore {
    /// Connects to the configured database.
    ///
    /// A malformed URI is an error. An unreachable server is not: the store
    /// is returned in [`ConnectionState::Failed`] so the gateway reports it
    /// through the connection state.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.name);
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let store = Self {
            client,
            database,
            name: config.name.clone(),
            state,
        };

        match store.ping().await {
            Ok(_) => {
                info!(database = %store.name, "connected to MongoDB");
                store.state.send_replace(ConnectionState::Ready);
            }
            Err(e) => {
                error!(database = %store.name, error = %e, "MongoDB connection error");
                store.state.send_replace(ConnectionState::Failed(e.to_string()));
            }
        }
        Ok(store)
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.database.collection(name)
    }

    async fn ping(&self) -> StoreResult<bson::Document> {
        Ok(self.database.run_command(doc! { "ping": 1 }).await?)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    fn database_name(&self) -> &str {
        &self.name
    }

    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn parse_id(&self, value: &str) -> StoreResult<DocumentId> {
        ObjectId::parse_str(value)
            .map(|oid| DocumentId::Native(oid.to_hex()))
            .map_err(|_| StoreError::InvalidId {
                value: value.to_string(),
            })
    }

    async fn insert(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        let mut converted = documents
            .iter()
            .map(to_insertable)
            .collect::<StoreResult<Vec<_>>>()?;
        let target = self.collection(collection);

        if converted.len() == 1 {
            let result = target.insert_one(&converted[0]).await?;
            converted[0].insert(ID_FIELD, result.inserted_id);
        } else {
            let result = target.insert_many(&converted).await?;
            for (index, id) in result.inserted_ids {
                if let Some(document) = converted.get_mut(index) {
                    document.insert(ID_FIELD, id);
                }
            }
        }

        debug!(collection = %collection, count = converted.len(), "mongodb insert");
        Ok(converted.into_iter().map(to_json_document).collect())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let target = self.collection(collection);
        let mut find = target.find(to_bson_document(filter.as_map())?);
        if let Some(projection) = options.projection.as_ref() {
            find = find.projection(to_bson_document(&projection.to_document())?);
        }
        if let Some(skip) = options.skip {
            find = find.skip(skip);
        }
        if let Some(limit) = options.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(sort) = options.sort.as_ref() {
            find = find.sort(to_bson_document(&sort.to_document())?);
        }

        let documents: Vec<bson::Document> = find.await?.try_collect().await?;
        Ok(documents.into_iter().map(to_json_document).collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        id: &DocumentId,
        projection: Option<&Projection>,
    ) -> StoreResult<Option<Document>> {
        let target = self.collection(collection);
        let mut find = target.find_one(id_filter(id)?);
        if let Some(projection) = projection {
            find = find.projection(to_bson_document(&projection.to_document())?);
        }
        Ok(find.await?.map(to_json_document))
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> StoreResult<UpdateResult> {
        let set = to_bson_document(&fields)?;
        let result = self
            .collection(collection)
            .update_one(id_filter(id)?, doc! { "$set": set })
            .await?;
        Ok(UpdateResult {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn remove(&self, collection: &str, id: &DocumentId) -> StoreResult<u64> {
        let result = self.collection(collection).delete_one(id_filter(id)?).await?;
        Ok(result.deleted_count)
    }

    async fn remove_all(&self, collection: &str) -> StoreResult<u64> {
        let result = self.collection(collection).delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<Value> {
        self.collection(collection).drop().await?;
        Ok(Value::Bool(true))
    }

    async fn collection_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.database.list_collection_names().await?)
    }

    async fn collection_stats(&self, collection: &str) -> StoreResult<CollectionStats> {
        let reply = self
            .database
            .run_command(doc! { "collStats": collection })
            .await?;
        Ok(CollectionStats {
            size: number(&reply, "size"),
            count: number(&reply, "count"),
        })
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> StoreResult<String> {
        let model = IndexModel::builder()
            .keys(to_bson_document(&spec.to_document())?)
            .build();
        let result = self.collection(collection).create_index(model).await?;
        Ok(result.index_name)
    }

    async fn check_status(&self) -> StoreResult<Value> {
        match self.ping().await {
            Ok(reply) => {
                if !self.state.borrow().is_ready() {
                    self.state.send_replace(ConnectionState::Ready);
                }
                Ok(Bson::Document(reply).into_relaxed_extjson())
            }
            Err(e) => {
                self.state.send_replace(ConnectionState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn close(&self) -> StoreResult<()> {
        self.client.clone().shutdown().await;
        self.state.send_replace(ConnectionState::Closed);
        Ok(())
    }
}
