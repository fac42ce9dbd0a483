//! JSON <-> BSON conversion at the driver boundary.
//!
//! Native ids leave the driver as their 24-hex string and come back in as
//! `ObjectId`s; everything else goes through relaxed extended JSON.

use mongodb::bson::{self, Bson, oid::ObjectId};
use serde_json::{Map, Value};

use crate::core::DocumentId;
use crate::error::{StoreError, StoreResult};
use crate::types::{Document, ID_FIELD};

/// Converts a JSON object into a BSON document.
pub(super) fn to_bson_document(map: &Map<String, Value>) -> StoreResult<bson::Document> {
    match Bson::try_from(Value::Object(map.clone())) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(StoreError::Serialization {
            message: format!("expected a document, found {:?}", other.element_type()),
        }),
        Err(e) => Err(StoreError::Serialization {
            message: e.to_string(),
        }),
    }
}

/// Converts a document for insertion, turning a hex `_id` into an `ObjectId`.
pub(super) fn to_insertable(document: &Document) -> StoreResult<bson::Document> {
    let mut converted = to_bson_document(document)?;
    let native = match converted.get(ID_FIELD) {
        Some(Bson::String(hex)) => ObjectId::parse_str(hex).ok(),
        _ => None,
    };
    if let Some(oid) = native {
        converted.insert(ID_FIELD, oid);
    }
    Ok(converted)
}

/// Converts a BSON document returned by the driver into JSON.
pub(super) fn to_json_document(document: bson::Document) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, to_json(value)))
        .collect()
}

fn to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(document) => Value::Object(to_json_document(document)),
        Bson::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Builds the `{_id: ...}` filter for an identifier.
pub(super) fn id_filter(id: &DocumentId) -> StoreResult<bson::Document> {
    let value = match id {
        DocumentId::Native(hex) => Bson::ObjectId(ObjectId::parse_str(hex).map_err(|_| {
            StoreError::InvalidId {
                value: hex.clone(),
            }
        })?),
        DocumentId::Raw(raw) => Bson::String(raw.clone()),
    };
    let mut filter = bson::Document::new();
    filter.insert(ID_FIELD, value);
    Ok(filter)
}

/// Reads a numeric field from a command reply.
pub(super) fn number(document: &bson::Document, key: &str) -> u64 {
    match document.get(key) {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}
