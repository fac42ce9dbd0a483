//! Document store implementations.
//!
//! - [`MemoryStore`] - in-process store, always available
//! - `MongoStore` - MongoDB driver adapter (feature `mongodb`)

pub mod memory;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use memory::MemoryStore;

#[cfg(feature = "mongodb")]
pub use self::mongodb::MongoStore;
