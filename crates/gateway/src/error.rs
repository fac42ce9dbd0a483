//! Error types for the gateway.
//!
//! Errors are grouped by category so that callers (and any transport layer
//! sitting on top of the gateway) can tell a rejected request apart from a
//! tenant isolation failure or a driver failure:
//!
//! - [`ValidationError`] - bad or missing parameters; no store access happened
//! - [`TenantError`] - tenant shape or database mismatch on cross-collection work
//! - [`ResourceError`] - the addressed record does not exist
//! - [`StoreError`] - the document store driver failed
//! - [`ConnectionError`] - the store connection is not usable
//! - [`BulkError`] - export/import orchestration failures
//! - [`ArchiveError`] - archive encoding/decoding failures

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::tenant::TenantId;

/// The primary error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Request validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Tenant isolation errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Record state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Document store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Connection errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Bulk export/import errors
    #[error(transparent)]
    Bulk(#[from] BulkError),

    /// Archive codec errors
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Invalid gateway configuration
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

/// Coarse classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    TenantIsolation,
    NotFound,
    Store,
    Connection,
    Bulk,
    Archive,
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::TenantIsolation => "tenant-isolation",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Store => "store",
            ErrorKind::Connection => "connection",
            ErrorKind::Bulk => "bulk",
            ErrorKind::Archive => "archive",
            ErrorKind::Configuration => "configuration",
        };
        write!(f, "{}", name)
    }
}

impl GatewayError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation(_) => ErrorKind::Validation,
            GatewayError::Tenant(_) => ErrorKind::TenantIsolation,
            GatewayError::Resource(_) => ErrorKind::NotFound,
            GatewayError::Store(_) => ErrorKind::Store,
            GatewayError::Connection(_) => ErrorKind::Connection,
            GatewayError::Bulk(_) => ErrorKind::Bulk,
            GatewayError::Archive(_) => ErrorKind::Archive,
            GatewayError::Config { .. } => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if the request was rejected before touching the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }
}

/// Errors raised while validating request parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required parameter was absent.
    #[error("invalid params: missing required parameter '{name}'")]
    MissingParameter { name: String },

    /// The entity type exceeds the collection name budget.
    #[error(
        "'type' name too long: '{entity_type}'. Collection name cannot be greater than: {max}"
    )]
    EntityTypeTooLong { entity_type: String, max: usize },

    /// The `fields` payload is not an object or array of objects.
    #[error("invalid param field type: expected object, found {found}")]
    InvalidFieldsType { found: String },

    /// Update was called without a payload.
    #[error("invalid params: 'fields' object required")]
    FieldsRequired,

    /// Index was called without an index specification.
    #[error("invalid params: 'index' object required")]
    IndexRequired,

    /// A guid was supplied to a collection-wide operation.
    #[error("invalid params: no guid required for {operation}")]
    GuidNotAllowed { operation: String },

    /// `eq` was combined with another operator on the same field.
    #[error("conflicting operators on field '{field}': 'eq' cannot be combined with '{operator}'")]
    ConflictingOperators { field: String, operator: String },

    /// An operator group carried an operand of the wrong shape.
    #[error("invalid operand for '{operator}' on field '{field}': {message}")]
    InvalidOperand {
        operator: String,
        field: String,
        message: String,
    },

    /// The sort specification could not be interpreted.
    #[error("invalid sort specification: {message}")]
    InvalidSort { message: String },

    /// Import was called without any uploaded archive.
    #[error("invalid params: at least one archive file is required")]
    FilesRequired,
}

/// Errors raised by tenant isolation checks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TenantError {
    /// The tenant identifier does not have the shared-database shape.
    #[error("incorrect parameters for listing collections: tenant '{tenant_id}' is not a valid app name")]
    InvalidShape { tenant_id: TenantId },

    /// In dedicated mode the tenant must name the connected database.
    #[error("incorrect parameters for listing collections: tenant '{tenant_id}' does not own database '{database}'")]
    DatabaseMismatch { tenant_id: TenantId, database: String },
}

/// Errors related to record state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The requested record was not found.
    #[error("record not found: {entity_type}/{guid}")]
    NotFound { entity_type: String, guid: String },
}

/// Errors originating from the document store driver.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query execution failed.
    #[error("query execution failed: {message}")]
    Query { message: String },

    /// A write collided with an existing unique key.
    #[error("duplicate key error: {message}")]
    DuplicateKey { message: String },

    /// The value is not a native store identifier.
    #[error("invalid native id: {value}")]
    InvalidId { value: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// The store cannot currently serve requests.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Internal driver error.
    #[error("internal store error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Returns `true` if the store reported a duplicate key violation.
    ///
    /// Drivers do not agree on a structured code, so this matches the error
    /// text the way MongoDB reports it (`E11000 duplicate key error ...`).
    pub fn is_duplicate_key(&self) -> bool {
        if matches!(self, StoreError::DuplicateKey { .. }) {
            return true;
        }
        let text = self.to_string().to_ascii_lowercase();
        text.contains("duplicate key error") || text.contains("e11000")
    }
}

/// Errors related to the store connection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// The connection could not be established or was lost.
    #[error("database connection error: {message}")]
    Failed { message: String },

    /// The connection was closed before it became ready.
    #[error("database connection closed")]
    Closed,
}

/// Errors raised by bulk export/import orchestration.
#[derive(Error, Debug)]
pub enum BulkError {
    /// The tenant owns no collections.
    #[error("No collections to export")]
    NoCollectionsToExport,

    /// The uploaded archive decoded to nothing.
    #[error("No collections found to import")]
    NoCollectionsToImport,

    /// The import collided with data already in the target collections.
    #[error(
        "You're importing duplicate data - please ensure your collections are empty before importing"
    )]
    DuplicateData,

    /// A collection named for export could not be read.
    #[error("Could not find collection '{entity_type}'")]
    CollectionUnavailable { entity_type: String },

    /// A fan-out branch terminated abnormally.
    #[error("bulk branch failed: {message}")]
    BranchPanicked { message: String },
}

/// Errors raised by archive codecs.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The requested output format is not supported.
    #[error("unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    /// An archive entry could not be decoded.
    #[error("malformed archive entry '{entry}': {message}")]
    Malformed { entry: String, message: String },

    /// I/O failure while reading or writing an archive.
    #[error("archive i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type alias for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Store(err.into())
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind as MongoErrorKind, WriteFailure};

        let duplicate = match err.kind.as_ref() {
            MongoErrorKind::Write(WriteFailure::WriteError(write)) => write.code == 11000,
            MongoErrorKind::InsertMany(insert) => insert
                .write_errors
                .as_ref()
                .is_some_and(|errors| errors.iter().any(|e| e.code == 11000)),
            _ => false,
        };
        if duplicate {
            return StoreError::DuplicateKey {
                message: err.to_string(),
            };
        }
        StoreError::Internal {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for GatewayError {
    fn from(err: mongodb::error::Error) -> Self {
        GatewayError::Store(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_too_long_display() {
        let err = ValidationError::EntityTypeTooLong {
            entity_type: "x".repeat(71),
            max: 70,
        };
        assert!(err.to_string().contains("Collection name cannot be greater than: 70"));
    }

    #[test]
    fn test_error_kind() {
        let err: GatewayError = ValidationError::FieldsRequired.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.is_validation());

        let err: GatewayError = TenantError::InvalidShape {
            tenant_id: TenantId::new("nope"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::TenantIsolation);

        let err: GatewayError = BulkError::NoCollectionsToExport.into();
        assert_eq!(err.kind(), ErrorKind::Bulk);
        assert_eq!(err.to_string(), "No collections to export");
    }

    #[test]
    fn test_duplicate_key_detection() {
        let err = StoreError::Query {
            message: "E11000 duplicate key error collection: db.fh_app_orders index: _id_"
                .to_string(),
        };
        assert!(err.is_duplicate_key());

        let err = StoreError::DuplicateKey {
            message: "dup".to_string(),
        };
        assert!(err.is_duplicate_key());

        let err = StoreError::Query {
            message: "socket closed".to_string(),
        };
        assert!(!err.is_duplicate_key());
    }

    #[test]
    fn test_serde_error_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GatewayError = bad.into();
        assert_eq!(err.kind(), ErrorKind::Store);
    }
}
