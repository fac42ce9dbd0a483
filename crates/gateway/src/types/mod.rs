//! Request and response types.
//!
//! - [`Params`] - the parameter bag every gateway operation takes
//! - [`Record`] - a normalized record (entity type, guid, fields)
//! - [`CollectionDescriptor`] - a tenant-visible collection with statistics
//! - [`IndexSpec`] - field to index direction mapping
//! - Operation outcomes ([`CreateOutcome`], [`DeleteOutcome`], ...)

mod collection;
mod index;
mod outcome;
mod params;
mod record;

pub use collection::{CollectionDescriptor, CollectionStats};
pub use index::{IndexDirection, IndexSpec};
pub use outcome::{
    CreateOutcome, CreateSummary, DeleteAllOutcome, DeleteOutcome, DropOutcome, ImportOutcome,
    IndexOutcome, ListOutcome,
};
pub use params::{Params, Payload};
pub use record::{Document, ID_FIELD, Record};
