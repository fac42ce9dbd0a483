//! Result shapes of gateway operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, StoreError};

use super::{CollectionDescriptor, Record};

/// Status/count summary of a create that did not return a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSummary {
    /// Always `OK`.
    #[serde(rename = "Status")]
    pub status: String,
    /// Number of inserted documents.
    #[serde(rename = "Count")]
    pub count: u64,
}

impl CreateSummary {
    pub(crate) fn ok(count: u64) -> Self {
        Self {
            status: "OK".to_string(),
            count,
        }
    }
}

/// Result of create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateOutcome {
    /// Exactly one document was inserted.
    Record(Record),
    /// Nothing or a batch was inserted.
    Summary(CreateSummary),
}

impl CreateOutcome {
    /// Returns the inserted record, if exactly one was inserted.
    pub fn record(&self) -> Option<&Record> {
        match self {
            CreateOutcome::Record(record) => Some(record),
            CreateOutcome::Summary(_) => None,
        }
    }

    /// Returns the number of inserted documents.
    pub fn count(&self) -> u64 {
        match self {
            CreateOutcome::Record(_) => 1,
            CreateOutcome::Summary(summary) => summary.count,
        }
    }
}

/// Result of list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListOutcome {
    /// Records of one entity type.
    Records(Vec<Record>),
    /// The tenant's collections (no entity type given).
    Collections(Vec<CollectionDescriptor>),
}

impl ListOutcome {
    /// Returns the records, if this is a record listing.
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            ListOutcome::Records(records) => Some(records),
            ListOutcome::Collections(_) => None,
        }
    }

    /// Returns the collections, if this is a collection listing.
    pub fn collections(&self) -> Option<&[CollectionDescriptor]> {
        match self {
            ListOutcome::Records(_) => None,
            ListOutcome::Collections(collections) => Some(collections),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        match self {
            ListOutcome::Records(records) => records.len(),
            ListOutcome::Collections(collections) => collections.len(),
        }
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of delete.
///
/// The snapshot is captured before removal and is always returned; a failed
/// removal is carried alongside it rather than replacing it.
#[derive(Debug)]
pub struct DeleteOutcome {
    /// The record as it was before deletion (`None` if it did not exist).
    pub record: Option<Record>,
    /// The removal failure, if the store reported one.
    pub removal_error: Option<StoreError>,
}

impl DeleteOutcome {
    /// Returns `true` if the removal itself succeeded.
    pub fn is_complete(&self) -> bool {
        self.removal_error.is_none()
    }

    /// Returns the snapshot, or the removal error.
    pub fn into_result(self) -> Result<Option<Record>, GatewayError> {
        match self.removal_error {
            Some(err) => Err(err.into()),
            None => Ok(self.record),
        }
    }
}

/// Result of delete-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAllOutcome {
    /// Always `ok`.
    pub status: String,
    /// Number of removed documents.
    pub count: u64,
}

impl DeleteAllOutcome {
    pub(crate) fn ok(count: u64) -> Self {
        Self {
            status: "ok".to_string(),
            count,
        }
    }
}

/// Result of drop-collection: the store's raw result descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropOutcome {
    /// Always `ok`.
    pub status: String,
    /// What the store reported.
    pub result: Value,
}

impl DropOutcome {
    pub(crate) fn ok(result: Value) -> Self {
        Self {
            status: "ok".to_string(),
            result,
        }
    }
}

/// Result of index creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOutcome {
    /// Always `OK`.
    pub status: String,
    /// Name of the created index.
    #[serde(rename = "indexName")]
    pub index_name: String,
}

impl IndexOutcome {
    pub(crate) fn ok(index_name: String) -> Self {
        Self {
            status: "OK".to_string(),
            index_name,
        }
    }
}

/// Result of import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// `true` once every batch was written.
    pub ok: bool,
    /// Entity types that were imported, in archive order.
    pub imported: Vec<String>,
}
