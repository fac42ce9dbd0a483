//! The export/import archive boundary.

use std::fmt::{self, Debug};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;
use crate::tenant::TenantId;
use crate::types::Document;

/// Serialization of one collection inside an export archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One JSON array per entity type.
    #[default]
    Json,
    /// One JSON document per line.
    Ndjson,
}

impl ExportFormat {
    /// Returns the file extension used for entries in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Ndjson => "ndjson",
        }
    }

    /// Maps a file extension back to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "ndjson" | "jsonl" => Some(ExportFormat::Ndjson),
            _ => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "ndjson" => Ok(ExportFormat::Ndjson),
            _ => Err(ArchiveError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// The documents of one entity type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionExport {
    /// Tenant-visible entity type.
    pub entity_type: String,
    /// Every document of the collection, as stored.
    pub documents: Vec<Document>,
}

impl CollectionExport {
    /// Creates an export entry.
    pub fn new(entity_type: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            entity_type: entity_type.into(),
            documents,
        }
    }
}

/// An encoded export archive.
#[derive(Clone, PartialEq, Eq)]
pub struct Archive {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type of the bytes.
    pub content_type: String,
    /// Archive content.
    pub bytes: Vec<u8>,
}

impl Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Archive {
    /// Writes the archive into `dir` under its file name and returns the path.
    pub fn write_to(&self, dir: &Path) -> Result<std::path::PathBuf, ArchiveError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// An uploaded file handed to import.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveUpload {
    /// Original file name; its extension selects the decoder.
    pub file_name: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl Debug for ArchiveUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ArchiveUpload {
    /// Creates an upload from bytes.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads an upload from disk.
    pub fn read(path: &Path) -> Result<Self, ArchiveError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// Encodes exports into archives and decodes uploads back into documents.
pub trait ArchiveCodec: Send + Sync + Debug {
    /// Encodes the tenant's collections in the given format.
    fn encode(
        &self,
        tenant: &TenantId,
        collections: &[CollectionExport],
        format: ExportFormat,
    ) -> Result<Archive, ArchiveError>;

    /// Decodes uploaded files into per-entity-type document sets.
    fn decode(&self, uploads: &[ArchiveUpload]) -> Result<Vec<CollectionExport>, ArchiveError>;
}
