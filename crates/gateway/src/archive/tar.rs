//! Tar archive codec.

use std::io::{Cursor, Read};
use std::path::Path;

use chrono::Utc;
use serde_json::Value;
use tar::{Archive as TarReader, Builder, Header};
use tracing::{debug, warn};

use crate::core::{Archive, ArchiveCodec, ArchiveUpload, CollectionExport, ExportFormat};
use crate::error::ArchiveError;
use crate::tenant::TenantId;
use crate::types::Document;

const TAR_CONTENT_TYPE: &str = "application/x-tar";
const ZSTD_CONTENT_TYPE: &str = "application/zstd";

/// Encodes exports as tar archives and decodes tar, tar.zst and bare
/// JSON / NDJSON uploads.
#[derive(Debug, Clone)]
pub struct TarArchiveCodec {
    compress: bool,
    level: i32,
}

impl Default for TarArchiveCodec {
    fn default() -> Self {
        Self {
            compress: cfg!(feature = "zstd"),
            level: 3,
        }
    }
}

impl TarArchiveCodec {
    /// Creates a codec; exports are compressed when the `zstd` feature is on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes uncompressed tar archives.
    pub fn uncompressed() -> Self {
        Self {
            compress: false,
            level: 0,
        }
    }

    /// Sets the zstd compression level.
    #[cfg(feature = "zstd")]
    pub fn with_level(mut self, level: i32) -> Self {
        self.compress = true;
        self.level = level;
        self
    }

    fn decode_upload(
        &self,
        upload: &ArchiveUpload,
        into: &mut Vec<CollectionExport>,
    ) -> Result<(), ArchiveError> {
        let name = upload.file_name.to_ascii_lowercase();
        if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            let tar_bytes = decompress(&upload.file_name, &upload.bytes)?;
            read_tar(&tar_bytes, into)
        } else if name.ends_with(".tar") {
            read_tar(&upload.bytes, into)
        } else {
            let (entity_type, format) = entry_name(&upload.file_name).ok_or_else(|| {
                ArchiveError::Malformed {
                    entry: upload.file_name.clone(),
                    message: "expected a .tar, .tar.zst, .json or .ndjson file".to_string(),
                }
            })?;
            let documents = parse_documents(&upload.file_name, &upload.bytes, format)?;
            merge(into, entity_type, documents);
            Ok(())
        }
    }
}

impl ArchiveCodec for TarArchiveCodec {
    fn encode(
        &self,
        tenant: &TenantId,
        collections: &[CollectionExport],
        format: ExportFormat,
    ) -> Result<Archive, ArchiveError> {
        let mut builder = Builder::new(Vec::new());
        let mtime = u64::try_from(Utc::now().timestamp()).unwrap_or(0);

        for collection in collections {
            check_entry_stem(&collection.entity_type)?;
            let bytes = serialize_documents(&collection.documents, format)?;
            let mut header = Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(mtime);
            header.set_cksum();
            let path = format!("{}.{}", collection.entity_type, format.extension());
            builder.append_data(&mut header, &path, bytes.as_slice())?;
            debug!(entry = %path, documents = collection.documents.len(), "archived");
        }
        let tar_bytes = builder.into_inner()?;

        if self.compress {
            let bytes = compress(&tar_bytes, self.level)?;
            return Ok(Archive {
                file_name: format!("{}-export.tar.zst", tenant),
                content_type: ZSTD_CONTENT_TYPE.to_string(),
                bytes,
            });
        }
        Ok(Archive {
            file_name: format!("{}-export.tar", tenant),
            content_type: TAR_CONTENT_TYPE.to_string(),
            bytes: tar_bytes,
        })
    }

    fn decode(&self, uploads: &[ArchiveUpload]) -> Result<Vec<CollectionExport>, ArchiveError> {
        let mut collections = Vec::new();
        for upload in uploads {
            self.decode_upload(upload, &mut collections)?;
        }
        Ok(collections)
    }
}

fn read_tar(bytes: &[u8], into: &mut Vec<CollectionExport>) -> Result<(), ArchiveError> {
    let mut archive = TarReader::new(Cursor::new(bytes));
    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().into_owned();
        let Some((entity_type, format)) = entry_name(&path) else {
            warn!(entry = %path, "skipping unknown archive entry");
            continue;
        };

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        let documents = parse_documents(&path, &data, format)?;
        merge(into, entity_type, documents);
    }
    Ok(())
}

/// `orders.json` -> (`orders`, json). Directories inside the archive are
/// ignored; only the file name counts.
fn entry_name(path: &str) -> Option<(String, ExportFormat)> {
    let path = Path::new(path);
    let format = ExportFormat::from_extension(path.extension()?.to_str()?)?;
    let entity_type = path.file_stem()?.to_str()?;
    if entity_type.is_empty() || entity_type.starts_with('.') {
        return None;
    }
    Some((entity_type.to_string(), format))
}

/// Entity types become entry file stems and must read back unchanged.
fn check_entry_stem(entity_type: &str) -> Result<(), ArchiveError> {
    if entity_type.is_empty()
        || entity_type.starts_with('.')
        || entity_type.contains(['/', '\\'])
    {
        return Err(ArchiveError::Malformed {
            entry: entity_type.to_string(),
            message: "entity type cannot be stored as an archive entry name".to_string(),
        });
    }
    Ok(())
}

fn merge(into: &mut Vec<CollectionExport>, entity_type: String, documents: Vec<Document>) {
    match into.iter_mut().find(|c| c.entity_type == entity_type) {
        Some(existing) => existing.documents.extend(documents),
        None => into.push(CollectionExport::new(entity_type, documents)),
    }
}

fn serialize_documents(documents: &[Document], format: ExportFormat) -> Result<Vec<u8>, ArchiveError> {
    let encoding_error = |e: serde_json::Error| ArchiveError::Malformed {
        entry: format.to_string(),
        message: e.to_string(),
    };
    match format {
        ExportFormat::Json => serde_json::to_vec_pretty(documents).map_err(encoding_error),
        ExportFormat::Ndjson => {
            let mut out = Vec::new();
            for document in documents {
                serde_json::to_writer(&mut out, document).map_err(encoding_error)?;
                out.push(b'\n');
            }
            Ok(out)
        }
    }
}

fn parse_documents(entry: &str, bytes: &[u8], format: ExportFormat) -> Result<Vec<Document>, ArchiveError> {
    let malformed = |message: String| ArchiveError::Malformed {
        entry: entry.to_string(),
        message,
    };
    let values: Vec<Value> = match format {
        ExportFormat::Json => match serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))? {
            Value::Array(items) => items,
            single @ Value::Object(_) => vec![single],
            other => return Err(malformed(format!("expected an array of documents, found {}", other))),
        },
        ExportFormat::Ndjson => {
            let text = std::str::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).map_err(|e| malformed(e.to_string())))
                .collect::<Result<_, _>>()?
        }
    };

    values
        .into_iter()
        .map(|value| match value {
            Value::Object(document) => Ok(document),
            other => Err(malformed(format!("expected a document, found {}", other))),
        })
        .collect()
}

#[cfg(feature = "zstd")]
fn compress(bytes: &[u8], level: i32) -> Result<Vec<u8>, ArchiveError> {
    Ok(zstd::encode_all(bytes, level)?)
}

#[cfg(not(feature = "zstd"))]
fn compress(bytes: &[u8], _level: i32) -> Result<Vec<u8>, ArchiveError> {
    Ok(bytes.to_vec())
}

#[cfg(feature = "zstd")]
fn decompress(_entry: &str, bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    Ok(zstd::decode_all(bytes)?)
}

#[cfg(not(feature = "zstd"))]
fn decompress(entry: &str, _bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    Err(ArchiveError::Malformed {
        entry: entry.to_string(),
        message: "zstd support is not enabled".to_string(),
    })
}
