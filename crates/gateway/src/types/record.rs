//! Normalized records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw stored document.
pub type Document = Map<String, Value>;

/// The field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// A record as returned to callers: never the raw stored document.
///
/// The store identifier is lifted out into `guid`; every other stored key
/// goes into `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The entity type the record was read from.
    #[serde(rename = "type")]
    pub entity_type: String,

    /// The store identifier (24-hex string for native ids).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<Value>,

    /// The record's fields; absent when the document only holds its id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Document>,
}

impl Record {
    /// Normalizes a stored document.
    pub fn from_document(mut document: Document, entity_type: &str) -> Self {
        let guid = document.shift_remove(ID_FIELD);
        let fields = if document.is_empty() {
            None
        } else {
            Some(document)
        };
        Self {
            entity_type: entity_type.to_string(),
            guid,
            fields,
        }
    }

    /// Returns the guid as a string, if it is one.
    pub fn guid_str(&self) -> Option<&str> {
        self.guid.as_ref().and_then(Value::as_str)
    }

    /// Returns a field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|fields| fields.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_document_separates_id() {
        let record = Record::from_document(
            doc(json!({"_id": "5f1d7a3e9b1e8a0012345678", "total": 5})),
            "orders",
        );
        assert_eq!(record.entity_type, "orders");
        assert_eq!(record.guid_str(), Some("5f1d7a3e9b1e8a0012345678"));
        assert_eq!(record.field("total"), Some(&json!(5)));
        assert!(record.field("_id").is_none());
    }

    #[test]
    fn test_id_only_document_has_no_fields() {
        let record = Record::from_document(doc(json!({"_id": "abc"})), "orders");
        assert!(record.fields.is_none());
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"type": "orders", "guid": "abc"})
        );
    }

    #[test]
    fn test_serialized_shape() {
        let record = Record::from_document(doc(json!({"_id": 7, "a": true})), "flags");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"type": "flags", "guid": 7, "fields": {"a": true}})
        );
    }
}
