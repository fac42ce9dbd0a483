//! Archive codecs for export and import.
//!
//! [`TarArchiveCodec`] writes one entry per entity type
//! (`<entity type>.<json|ndjson>`) into a tar archive, zstd-compressed when
//! the `zstd` feature is enabled.

mod tar;

pub use self::tar::TarArchiveCodec;
