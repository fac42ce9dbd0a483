//! Tenants, documents and gateway construction helpers.

use std::sync::Arc;

use helios_gateway::config::GatewayConfig;
use helios_gateway::core::DocumentStore;
use helios_gateway::types::{Document, Params};
use helios_gateway::{Gateway, MemoryStore};
use serde_json::Value;

/// A tenant with the shared-database shape.
pub const TENANT_A: &str = "acme-1234567890abcdef12345678-";

/// A second, unrelated tenant.
pub const TENANT_B: &str = "globex-abcdefghijklmnopqrstuvwx-";

/// Converts a `json!` object into a document.
pub fn doc(value: Value) -> Document {
    value
        .as_object()
        .cloned()
        .expect("fixture must be a JSON object")
}

/// Physical shared-mode collection name for a tenant and entity type.
pub fn physical(tenant: &str, entity_type: &str) -> String {
    format!("fh_{}_{}", tenant, entity_type)
}

/// Parameters addressing an entity type of a tenant.
pub fn params(tenant: &str, entity_type: &str) -> Params {
    Params::new(tenant).with_type(entity_type)
}

/// Opens a gateway over a fresh in-memory store.
pub async fn memory_gateway() -> (Gateway, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let gateway = open_gateway(store.clone()).await;
    (gateway, store)
}

/// Opens a gateway over any store with the default configuration.
pub async fn open_gateway<S: DocumentStore + 'static>(store: Arc<S>) -> Gateway {
    Gateway::open(store, GatewayConfig::default())
        .await
        .expect("gateway should open over a ready store")
}
