//! Record-level operation tests against the in-memory store.

mod common;

use common::*;
use helios_gateway::Params;
use helios_gateway::core::ArchiveUpload;
use helios_gateway::error::{ErrorKind, GatewayError, ValidationError};
use helios_gateway::types::{IndexDirection, IndexSpec};
use serde_json::json;

// ============================================================================
// Create
// ============================================================================

/// Test that creating a single object returns the stored record with a guid.
#[tokio::test]
async fn test_create_single_returns_record() {
    let (gateway, store) = memory_gateway().await;

    let outcome = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open", "total": 7})))
        .await
        .unwrap();

    let record = outcome.record().expect("single insert returns the record");
    assert_eq!(record.entity_type, "orders");
    assert!(record.guid_str().is_some_and(|guid| guid.len() == 24));
    assert_eq!(record.field("status"), Some(&json!("open")));
    assert!(record.field("_id").is_none());
    assert_eq!(store.count(&physical(TENANT_A, "orders")), 1);
}

/// Test that creating a batch returns a status/count summary.
#[tokio::test]
async fn test_create_batch_returns_summary() {
    let (gateway, store) = memory_gateway().await;

    let outcome = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!([
            {"status": "open"},
            {"status": "closed"},
            {"status": "open"}
        ])))
        .await
        .unwrap();

    assert!(outcome.record().is_none());
    assert_eq!(outcome.count(), 3);
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"Status": "OK", "Count": 3})
    );
    assert_eq!(store.count(&physical(TENANT_A, "orders")), 3);
}

/// Test that creating without fields writes nothing.
#[tokio::test]
async fn test_create_without_fields_writes_nothing() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;

    let outcome = gateway.create(&params(TENANT_A, "orders")).await.unwrap();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"Status": "OK", "Count": 0})
    );
    assert_eq!(store.calls(), 0);
}

/// Test that a scalar payload is rejected as an invalid field type.
#[tokio::test]
async fn test_create_rejects_scalar_fields() {
    let (gateway, _store) = memory_gateway().await;

    let err = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!("open")))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::InvalidFieldsType { .. })
    ));
}

/// Test that an over-long entity type fails before any store call.
#[tokio::test]
async fn test_entity_type_too_long_makes_no_store_call() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;
    let entity_type = "x".repeat(71);

    let err = gateway
        .create(&params(TENANT_A, &entity_type).with_fields(json!({"a": 1})))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::EntityTypeTooLong { max: 70, .. })
    ));

    let target = params(TENANT_A, &entity_type);
    let with_guid = target.clone().with_guid("0123456789abcdef01234567");
    let index = IndexSpec::default().field("a", IndexDirection::Ascending);
    let failures = [
        gateway.list(&target).await.unwrap_err(),
        gateway.read(&with_guid).await.unwrap_err(),
        gateway.read_required(&with_guid).await.unwrap_err(),
        gateway
            .update(&with_guid.clone().with_fields(json!({"a": 2})))
            .await
            .unwrap_err(),
        gateway.index(&target.clone().with_index(index)).await.unwrap_err(),
        gateway.delete(&with_guid).await.unwrap_err(),
        gateway.delete_all(&target).await.unwrap_err(),
        gateway.drop_collection(&target).await.unwrap_err(),
        gateway.export(&target).await.unwrap_err(),
    ];
    for err in failures {
        assert!(
            matches!(
                err,
                GatewayError::Validation(ValidationError::EntityTypeTooLong { max: 70, .. })
            ),
            "unexpected error: {}",
            err
        );
    }

    let upload = ArchiveUpload::new(format!("{}.json", entity_type), b"[{\"a\": 1}]".to_vec());
    let err = gateway
        .import(&Params::new(TENANT_A).with_file(upload))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(store.calls(), 0);
}

/// Test that a seventy character entity type is accepted.
#[tokio::test]
async fn test_entity_type_at_limit_is_accepted() {
    let (gateway, _store) = memory_gateway().await;
    let entity_type = "x".repeat(70);

    let outcome = gateway
        .create(&params(TENANT_A, &entity_type).with_fields(json!({"a": 1})))
        .await
        .unwrap();

    assert_eq!(outcome.count(), 1);
}

// ============================================================================
// Read
// ============================================================================

/// Test that a created record can be read back by guid.
#[tokio::test]
async fn test_read_by_guid() {
    let (gateway, _store) = memory_gateway().await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open", "total": 7})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();

    let record = gateway
        .read(&params(TENANT_A, "orders").with_guid(&guid))
        .await
        .unwrap()
        .expect("record exists");

    assert_eq!(record.guid_str(), Some(guid.as_str()));
    assert_eq!(record.field("total"), Some(&json!(7)));
}

/// Test that a projection limits the returned fields.
#[tokio::test]
async fn test_read_with_projection() {
    let (gateway, _store) = memory_gateway().await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open", "total": 7})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();

    let mut read = params(TENANT_A, "orders").with_guid(&guid);
    read.fields = Some(json!(["total"]));
    let record = gateway.read(&read).await.unwrap().unwrap();

    assert_eq!(record.field("total"), Some(&json!(7)));
    assert!(record.field("status").is_none());
}

/// Test that reading a missing record yields nothing, or NotFound when required.
#[tokio::test]
async fn test_read_missing_record() {
    let (gateway, _store) = memory_gateway().await;
    let read = params(TENANT_A, "orders").with_guid("0123456789abcdef01234567");

    assert!(gateway.read(&read).await.unwrap().is_none());

    let err = gateway.read_required(&read).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Test that reading without a guid is a missing parameter error.
#[tokio::test]
async fn test_read_requires_guid() {
    let (gateway, _store) = memory_gateway().await;

    let err = gateway.read(&params(TENANT_A, "orders")).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::MissingParameter { ref name }) if name == "guid"
    ));
}

// ============================================================================
// Update
// ============================================================================

/// Test that update merges fields and returns the re-read record.
#[tokio::test]
async fn test_update_merges_fields() {
    let (gateway, _store) = memory_gateway().await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open", "total": 7})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();

    let updated = gateway
        .update(
            &params(TENANT_A, "orders")
                .with_guid(&guid)
                .with_fields(json!({"status": "closed"})),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.field("status"), Some(&json!("closed")));
    assert_eq!(updated.field("total"), Some(&json!(7)));
}

/// Test that update still re-reads the record when nothing matched.
#[tokio::test]
async fn test_update_without_match_returns_current_record() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open"})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();
    store.skip_updates();

    let updated = gateway
        .update(
            &params(TENANT_A, "orders")
                .with_guid(&guid)
                .with_fields(json!({"status": "closed"})),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.field("status"), Some(&json!("open")));
}

/// Test that a failed write is returned as the error and the record is
/// left untouched.
#[tokio::test]
async fn test_update_write_error_propagates() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open"})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();
    store.fail_updates();

    let err = gateway
        .update(
            &params(TENANT_A, "orders")
                .with_guid(&guid)
                .with_fields(json!({"status": "closed"})),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(err.to_string().contains("update failed"));
    let current = gateway
        .read(&params(TENANT_A, "orders").with_guid(&guid))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.field("status"), Some(&json!("open")));
}

/// Test that update requires an object payload.
#[tokio::test]
async fn test_update_requires_fields() {
    let (gateway, _store) = memory_gateway().await;
    let update = params(TENANT_A, "orders").with_guid("0123456789abcdef01234567");

    let err = gateway.update(&update).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::FieldsRequired)
    ));

    let err = gateway
        .update(&update.with_fields(json!([{"a": 1}])))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::InvalidFieldsType { .. })
    ));
}

// ============================================================================
// Delete
// ============================================================================

/// Test that delete returns the snapshot taken before removal.
#[tokio::test]
async fn test_delete_returns_snapshot() {
    let (gateway, store) = memory_gateway().await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open"})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();

    let outcome = gateway
        .delete(&params(TENANT_A, "orders").with_guid(&guid))
        .await
        .unwrap();

    assert!(outcome.is_complete());
    let snapshot = outcome.into_result().unwrap().unwrap();
    assert_eq!(snapshot.field("status"), Some(&json!("open")));
    assert_eq!(store.count(&physical(TENANT_A, "orders")), 0);
}

/// Test that a failed removal is reported next to the snapshot.
#[tokio::test]
async fn test_delete_reports_removal_error_with_snapshot() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open"})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();
    store.fail_removes();

    let outcome = gateway
        .delete(&params(TENANT_A, "orders").with_guid(&guid))
        .await
        .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(
        outcome.record.as_ref().and_then(|r| r.field("status")),
        Some(&json!("open"))
    );
    assert!(outcome.removal_error.unwrap().to_string().contains("remove failed"));
    assert_eq!(store.inner().count(&physical(TENANT_A, "orders")), 1);
}

/// Test that a failed snapshot read fails the delete and removes nothing.
#[tokio::test]
async fn test_delete_fails_when_snapshot_read_fails() {
    let store = FaultyStore::new();
    let gateway = open_gateway(store.clone()).await;
    let created = gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"status": "open"})))
        .await
        .unwrap();
    let guid = created.record().and_then(|r| r.guid_str()).unwrap().to_string();
    store.fail_reads();

    let err = gateway
        .delete(&params(TENANT_A, "orders").with_guid(&guid))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
    assert_eq!(store.inner().count(&physical(TENANT_A, "orders")), 1);
}

/// Test that delete-all counts removed records and rejects a guid.
#[tokio::test]
async fn test_delete_all() {
    let (gateway, store) = memory_gateway().await;
    gateway
        .create(&params(TENANT_A, "orders").with_fields(json!([{"a": 1}, {"a": 2}])))
        .await
        .unwrap();

    let err = gateway
        .delete_all(&params(TENANT_A, "orders").with_guid("0123456789abcdef01234567"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::GuidNotAllowed { ref operation }) if operation == "deleteAll"
    ));
    assert_eq!(store.count(&physical(TENANT_A, "orders")), 2);

    let outcome = gateway.delete_all(&params(TENANT_A, "orders")).await.unwrap();
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"status": "ok", "count": 2})
    );
    assert_eq!(store.count(&physical(TENANT_A, "orders")), 0);
}

/// Test that drop-collection removes the collection and rejects a guid.
#[tokio::test]
async fn test_drop_collection() {
    let (gateway, _store) = memory_gateway().await;
    gateway
        .create(&params(TENANT_A, "orders").with_fields(json!({"a": 1})))
        .await
        .unwrap();

    let err = gateway
        .drop_collection(&params(TENANT_A, "orders").with_guid("0123456789abcdef01234567"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("dropCollection"));

    let outcome = gateway
        .drop_collection(&params(TENANT_A, "orders"))
        .await
        .unwrap();
    assert_eq!(outcome.status, "ok");

    let listed = gateway.list(&Params::new(TENANT_A)).await.unwrap();
    assert!(listed.is_empty());
}

// ============================================================================
// Index
// ============================================================================

/// Test that index creation returns the store's index name.
#[tokio::test]
async fn test_create_index() {
    let (gateway, _store) = memory_gateway().await;
    let spec = IndexSpec::default()
        .field("status", IndexDirection::Ascending)
        .field("total", IndexDirection::Descending);

    let outcome = gateway
        .index(&params(TENANT_A, "orders").with_index(spec))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"status": "OK", "indexName": "status_1_total_-1"})
    );
}

/// Test that index creation requires a non-empty index specification.
#[tokio::test]
async fn test_create_index_requires_spec() {
    let (gateway, _store) = memory_gateway().await;

    let err = gateway.index(&params(TENANT_A, "orders")).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::IndexRequired)
    ));

    let err = gateway
        .index(&params(TENANT_A, "orders").with_index(IndexSpec::default()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::IndexRequired)
    ));
}
