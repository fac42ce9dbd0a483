//! Core abstractions at the gateway's external boundaries.
//!
//! - [`DocumentStore`] - the document-store driver boundary
//! - [`ConnectionState`] / [`ConnectionMonitor`] - connection lifecycle,
//!   published over a watch channel instead of ambient events
//! - [`ArchiveCodec`] - the export/import archive boundary
//!
//! The gateway only ever talks to these traits; [`crate::backends`] and
//! [`crate::archive`] hold the implementations.

mod archive;
mod connection;
mod store;

pub use archive::{Archive, ArchiveCodec, ArchiveUpload, CollectionExport, ExportFormat};
pub use connection::{ConnectionMonitor, ConnectionState, StatusReport};
pub use store::{DocumentId, DocumentStore, UpdateResult};
