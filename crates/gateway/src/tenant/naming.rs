//! Tenant-aware collection naming.
//!
//! In shared mode a physical collection name is
//! `<prefix><tenant><separator><entity type>`; the tenant identifier is thus
//! always a substring of every collection the tenant owns, which is what the
//! introspection filter relies on. In dedicated mode the tenant owns the
//! whole database and entity types are used verbatim.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::NamingConfig;
use crate::error::{TenantError, ValidationError};

use super::TenantId;

/// How a tenant's collections are laid out in the physical database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenancyMode {
    /// Many tenants share one database; names are prefixed and validated.
    #[default]
    Shared,
    /// The tenant owns the whole database; no prefixing.
    Dedicated,
}

impl TenancyMode {
    /// Maps the request-level "dedicated database" flag to a mode.
    pub fn from_dedicated(dedicated: bool) -> Self {
        if dedicated {
            TenancyMode::Dedicated
        } else {
            TenancyMode::Shared
        }
    }

    /// Returns `true` for [`TenancyMode::Dedicated`].
    pub fn is_dedicated(&self) -> bool {
        matches!(self, TenancyMode::Dedicated)
    }
}

impl fmt::Display for TenancyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenancyMode::Shared => write!(f, "shared"),
            TenancyMode::Dedicated => write!(f, "dedicated"),
        }
    }
}

/// Resolves entity types to physical collection names and back.
#[derive(Debug, Clone)]
pub struct CollectionNamer {
    prefix: String,
    separator: String,
    tenant_pattern: Regex,
    max_entity_type_length: usize,
    system_marker: String,
}

impl CollectionNamer {
    /// Creates a namer from the naming configuration.
    pub fn new(config: &NamingConfig) -> Result<Self, regex::Error> {
        let tenant_pattern = Regex::new(&config.tenant_pattern)?;
        Ok(Self {
            prefix: config.collection_prefix.clone(),
            separator: config.separator.clone(),
            tenant_pattern,
            max_entity_type_length: config.max_entity_type_length,
            system_marker: config.system_marker.clone(),
        })
    }

    /// Returns the maximum accepted entity type length.
    pub fn max_entity_type_length(&self) -> usize {
        self.max_entity_type_length
    }

    /// Returns the physical collection name for an entity type.
    pub fn resolve(&self, tenant: &TenantId, entity_type: &str, mode: TenancyMode) -> String {
        match mode {
            TenancyMode::Dedicated => entity_type.to_string(),
            TenancyMode::Shared => format!(
                "{}{}{}{}",
                self.prefix,
                tenant.as_str(),
                self.separator,
                entity_type
            ),
        }
    }

    /// Recovers the tenant-visible entity type from a physical name.
    ///
    /// In shared mode only the leading tenant prefix is stripped; a name
    /// without that prefix is returned unchanged.
    pub fn recover_entity_type(
        &self,
        physical_name: &str,
        tenant: &TenantId,
        mode: TenancyMode,
    ) -> String {
        if mode.is_dedicated() {
            return physical_name.to_string();
        }
        let tenant_prefix = self.resolve(tenant, "", TenancyMode::Shared);
        physical_name
            .strip_prefix(&tenant_prefix)
            .unwrap_or(physical_name)
            .to_string()
    }

    /// Returns `true` if the tenant identifier has the shared-database shape.
    pub fn validate_tenant_shape(&self, tenant: &TenantId) -> bool {
        self.tenant_pattern.is_match(tenant.as_str())
    }

    /// Returns `true` if the entity type fits the length budget.
    pub fn validate_entity_type_length(&self, entity_type: &str) -> bool {
        entity_type.chars().count() <= self.max_entity_type_length
    }

    /// Rejects entity types over the length budget. Never truncates.
    pub fn check_entity_type(&self, entity_type: &str) -> Result<(), ValidationError> {
        if self.validate_entity_type_length(entity_type) {
            Ok(())
        } else {
            Err(ValidationError::EntityTypeTooLong {
                entity_type: entity_type.to_string(),
                max: self.max_entity_type_length,
            })
        }
    }

    /// Gate for every cross-collection operation (listing, export, import).
    ///
    /// Shared mode requires the tenant shape; dedicated mode requires the
    /// tenant to name the connected database exactly.
    pub fn check_tenant_access(
        &self,
        tenant: &TenantId,
        mode: TenancyMode,
        database: &str,
    ) -> Result<(), TenantError> {
        match mode {
            TenancyMode::Shared if !self.validate_tenant_shape(tenant) => {
                Err(TenantError::InvalidShape {
                    tenant_id: tenant.clone(),
                })
            }
            TenancyMode::Dedicated if tenant.as_str() != database => {
                Err(TenantError::DatabaseMismatch {
                    tenant_id: tenant.clone(),
                    database: database.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Returns `true` for store-internal collections.
    pub fn is_system_collection(&self, physical_name: &str) -> bool {
        physical_name.contains(&self.system_marker)
    }

    /// Returns `true` if the physical collection is visible to the tenant.
    ///
    /// In shared mode the name must start with the tenant's full prefix, so a
    /// tenant id that merely occurs inside another tenant's id does not match.
    pub fn belongs_to(&self, physical_name: &str, tenant: &TenantId, mode: TenancyMode) -> bool {
        mode.is_dedicated()
            || physical_name.starts_with(&self.resolve(tenant, "", TenancyMode::Shared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TENANT: &str = "acme-1234567890abcdef12345678-";

    fn namer() -> CollectionNamer {
        CollectionNamer::new(&NamingConfig::default()).unwrap()
    }

    #[test]
    fn test_resolve_shared() {
        let name = namer().resolve(&TenantId::new(TENANT), "orders", TenancyMode::Shared);
        assert_eq!(name, format!("fh_{}_orders", TENANT));
    }

    #[test]
    fn test_resolve_dedicated() {
        let name = namer().resolve(&TenantId::new(TENANT), "orders", TenancyMode::Dedicated);
        assert_eq!(name, "orders");
    }

    #[test]
    fn test_round_trip_both_modes() {
        let namer = namer();
        let tenant = TenantId::new(TENANT);
        let longest = "x".repeat(70);
        for entity_type in ["orders", "a", longest.as_str(), "with_underscores_too"] {
            for mode in [TenancyMode::Shared, TenancyMode::Dedicated] {
                let physical = namer.resolve(&tenant, entity_type, mode);
                assert_eq!(namer.recover_entity_type(&physical, &tenant, mode), entity_type);
            }
        }
    }

    #[test]
    fn test_recover_entity_type_with_tenant_in_type() {
        // The prefix is only stripped once, from the front.
        let namer = namer();
        let tenant = TenantId::new(TENANT);
        let entity_type = format!("fh_{}_nested", TENANT);
        let physical = namer.resolve(&tenant, &entity_type, TenancyMode::Shared);
        assert_eq!(
            namer.recover_entity_type(&physical, &tenant, TenancyMode::Shared),
            entity_type
        );
    }

    #[test]
    fn test_tenant_shape() {
        let namer = namer();
        assert!(namer.validate_tenant_shape(&TenantId::new(TENANT)));
        assert!(namer.validate_tenant_shape(&TenantId::new(
            "my.domain-ABCDEFGHIJKLMNOPQRSTUVWX-dev"
        )));
        assert!(!namer.validate_tenant_shape(&TenantId::new("acme")));
        assert!(!namer.validate_tenant_shape(&TenantId::new("acme-1234-")));
        assert!(!namer.validate_tenant_shape(&TenantId::new("-1234567890abcdef12345678-")));
    }

    #[test]
    fn test_entity_type_length() {
        let namer = namer();
        assert!(namer.validate_entity_type_length(&"x".repeat(70)));
        assert!(!namer.validate_entity_type_length(&"x".repeat(71)));

        let err = namer.check_entity_type(&"x".repeat(71)).unwrap_err();
        assert!(matches!(err, ValidationError::EntityTypeTooLong { max: 70, .. }));
    }

    #[test]
    fn test_check_tenant_access() {
        let namer = namer();
        assert!(
            namer
                .check_tenant_access(&TenantId::new(TENANT), TenancyMode::Shared, "fh-db")
                .is_ok()
        );
        assert!(matches!(
            namer.check_tenant_access(&TenantId::new("acme"), TenancyMode::Shared, "fh-db"),
            Err(TenantError::InvalidShape { .. })
        ));
        assert!(
            namer
                .check_tenant_access(&TenantId::new("acme"), TenancyMode::Dedicated, "acme")
                .is_ok()
        );
        assert!(matches!(
            namer.check_tenant_access(&TenantId::new("acme"), TenancyMode::Dedicated, "other"),
            Err(TenantError::DatabaseMismatch { .. })
        ));
    }

    #[test]
    fn test_collection_visibility() {
        let namer = namer();
        let tenant = TenantId::new(TENANT);
        assert!(namer.belongs_to(&format!("fh_{}_orders", TENANT), &tenant, TenancyMode::Shared));
        assert!(!namer.belongs_to(
            "fh_other-1234567890abcdef12345678-_orders",
            &tenant,
            TenancyMode::Shared
        ));
        assert!(!namer.belongs_to(
            &format!("fh_x{}_orders", TENANT),
            &tenant,
            TenancyMode::Shared
        ));
        assert!(!namer.belongs_to(
            &format!("archive_fh_{}_orders", TENANT),
            &tenant,
            TenancyMode::Shared
        ));
        assert!(namer.belongs_to("anything", &tenant, TenancyMode::Dedicated));
        assert!(namer.is_system_collection("system.indexes"));
        assert!(namer.is_system_collection("fh-db.system.users"));
        assert!(!namer.is_system_collection("orders"));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(TenancyMode::from_dedicated(true), TenancyMode::Dedicated);
        assert_eq!(TenancyMode::from_dedicated(false), TenancyMode::Shared);
        assert_eq!(TenancyMode::Shared.to_string(), "shared");
    }
}
