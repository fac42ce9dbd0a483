//! Helios Multi-Tenant Document Gateway
//!
//! This crate is a data-access gateway in front of a shared document
//! database. Tenants ("apps") are isolated by a naming convention on
//! collection names, so many tenants can live in one physical database.
//! The gateway exposes a small declarative CRUD and query surface, collection
//! introspection, and bulk export/import of whole tenant datasets.
//!
//! # Features
//!
//! - **Tenant isolation**: collection names are derived from the tenant id;
//!   cross-collection operations are gated by a tenant shape check
//! - **Declarative queries**: named operator groups (`eq`, `gt`, `in`,
//!   `geo`, ...) translated into the store's native filter
//! - **Bulk export/import**: concurrent fan-out across collections, tar
//!   archives with one entry per entity type
//! - **Backends**: an in-process store and MongoDB
//!
//! Available features:
//! - `zstd` (default) - compressed export archives
//! - `mongodb` - MongoDB document store
//!
//! # Architecture
//!
//! - [`tenant`] - tenant ids and physical collection naming
//! - [`query`] - operator groups and their translation into native filters
//! - [`types`] - the request parameter bag, records and operation results
//! - [`core`] - the store, connection and archive boundaries
//! - [`gateway`] - CRUD orchestration, introspection, export and import
//! - [`backends`] - store implementations
//! - [`archive`] - archive codecs
//! - [`config`] - configuration
//! - [`error`] - error types
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_gateway::{Gateway, GatewayConfig, MemoryStore, Params};
//! use helios_gateway::query::{Operator, QuerySpec};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let gateway = Gateway::open(Arc::new(MemoryStore::new()), GatewayConfig::default())
//!     .await
//!     .unwrap();
//!
//! let tenant = "acme-1234567890abcdef12345678-";
//! gateway
//!     .create(&Params::new(tenant).with_type("orders").with_fields(json!([
//!         {"status": "open", "total": 7},
//!         {"status": "open", "total": 12},
//!         {"status": "closed", "total": 9}
//!     ])))
//!     .await
//!     .unwrap();
//!
//! let query = QuerySpec::new()
//!     .with(Operator::Eq, "status", json!("open"))
//!     .with(Operator::Gt, "total", json!(5))
//!     .with(Operator::Lt, "total", json!(10));
//! let found = gateway
//!     .list(&Params::new(tenant).with_type("orders").with_query(query))
//!     .await
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod archive;
pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod gateway;
pub mod query;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use config::GatewayConfig;
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use tenant::{TenancyMode, TenantId};
pub use types::{Params, Record};

// Re-export boundaries and implementations
pub use archive::TarArchiveCodec;
pub use backends::MemoryStore;
pub use core::{ArchiveCodec, ConnectionState, DocumentStore};

#[cfg(feature = "mongodb")]
pub use backends::MongoStore;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
