//! Collection listing tests.

mod common;

use common::*;
use helios_gateway::error::{ErrorKind, GatewayError, TenantError};
use helios_gateway::tenant::{TenancyMode, TenantId};
use helios_gateway::types::CollectionDescriptor;
use helios_gateway::{Gateway, Params};
use serde_json::json;

// ===== Helper Functions =====

async fn seed(gateway: &Gateway, tenant: &str, entity_type: &str, count: usize) {
    let documents: Vec<_> = (0..count).map(|i| json!({"n": i})).collect();
    gateway
        .create(&params(tenant, entity_type).with_fields(json!(documents)))
        .await
        .unwrap();
}

fn entity_types(collections: &[CollectionDescriptor]) -> Vec<&str> {
    let mut names: Vec<&str> = collections.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    names
}

// ===== Shared Mode =====

/// Test that listing without an entity type returns the tenant's collections.
#[tokio::test]
async fn test_list_collections_with_stats() {
    let (gateway, _store) = memory_gateway().await;
    seed(&gateway, TENANT_A, "orders", 3).await;
    seed(&gateway, TENANT_A, "customers", 1).await;

    let outcome = gateway.list(&Params::new(TENANT_A)).await.unwrap();
    let collections = outcome.collections().expect("collection listing");

    assert_eq!(entity_types(collections), vec!["customers", "orders"]);
    let orders = collections.iter().find(|c| c.name == "orders").unwrap();
    assert_eq!(orders.count, 3);
    assert!(orders.size > 0);
}

/// Test that other tenants' and system collections are never listed.
#[tokio::test]
async fn test_list_excludes_foreign_and_system_collections() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;
    seed(&gateway, TENANT_A, "orders", 1).await;
    seed(&gateway, TENANT_B, "orders", 2).await;
    seed(&gateway, TENANT_B, "invoices", 2).await;
    store.add_name("system.indexes");
    store.add_name(&format!("system.{}", physical(TENANT_A, "profile")));

    let collections = gateway
        .list_collections(&TenantId::new(TENANT_A), TenancyMode::Shared)
        .await
        .unwrap();

    assert_eq!(entity_types(&collections), vec!["orders"]);
    assert_eq!(collections[0].count, 1);
}

/// Test that database-qualified names are reduced to collection names.
#[tokio::test]
async fn test_list_strips_database_namespace() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;
    seed(&gateway, TENANT_A, "orders", 2).await;
    store.add_name("");
    store.namespace_names();

    let collections = gateway
        .list_collections(&TenantId::new(TENANT_A), TenancyMode::Shared)
        .await
        .unwrap();

    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].name, "orders");
    assert_eq!(collections[0].count, 2);
}

/// Test that a tenant without the shared shape cannot list collections.
#[tokio::test]
async fn test_list_rejects_malformed_tenant() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;

    let err = gateway.list(&Params::new("acme")).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Tenant(TenantError::InvalidShape { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::TenantIsolation);
    assert_eq!(store.calls(), 0);
}

/// Test that listing requires a tenant.
#[tokio::test]
async fn test_list_requires_tenant() {
    let (gateway, _store) = memory_gateway().await;

    let err = gateway.list(&Params::default()).await.unwrap_err();

    assert!(err.is_validation());
}
