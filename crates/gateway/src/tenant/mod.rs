//! Tenant identity and physical collection naming.
//!
//! Tenants ("apps") share one physical database and are kept apart purely by
//! a naming convention on collection names. This module owns that
//! convention:
//!
//! - [`TenantId`] - opaque tenant identifier
//! - [`TenancyMode`] - shared database vs. a database dedicated to one tenant
//! - [`CollectionNamer`] - resolves entity types to physical collection names,
//!   recovers them again, and runs the tenant shape checks
//!
//! # Examples
//!
//! ```
//! use helios_gateway::config::NamingConfig;
//! use helios_gateway::tenant::{CollectionNamer, TenancyMode, TenantId};
//!
//! let namer = CollectionNamer::new(&NamingConfig::default()).unwrap();
//! let tenant = TenantId::new("acme-1234567890abcdef12345678-");
//!
//! let physical = namer.resolve(&tenant, "orders", TenancyMode::Shared);
//! assert_eq!(physical, "fh_acme-1234567890abcdef12345678-_orders");
//! assert_eq!(namer.recover_entity_type(&physical, &tenant, TenancyMode::Shared), "orders");
//!
//! // A tenant that owns its database uses entity types verbatim.
//! assert_eq!(namer.resolve(&tenant, "orders", TenancyMode::Dedicated), "orders");
//! ```

mod id;
mod naming;

pub use id::TenantId;
pub use naming::{CollectionNamer, TenancyMode};
