//! Collection introspection types.

use serde::{Deserialize, Serialize};

/// Size and count statistics reported by the store for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Data size in bytes.
    pub size: u64,
    /// Number of documents.
    pub count: u64,
}

/// A collection as the owning tenant sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// The entity type (tenant naming prefix stripped).
    pub name: String,
    /// Data size in bytes.
    pub size: u64,
    /// Number of documents.
    pub count: u64,
}

impl CollectionDescriptor {
    /// Builds a descriptor from an entity type and its statistics.
    pub fn new(name: impl Into<String>, stats: CollectionStats) -> Self {
        Self {
            name: name.into(),
            size: stats.size,
            count: stats.count,
        }
    }
}
