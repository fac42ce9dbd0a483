//! Gateway configuration.
//!
//! Every field has a serde default, so a configuration file only needs to
//! name what differs from the defaults:
//!
//! ```
//! use helios_gateway::config::GatewayConfig;
//!
//! let config: GatewayConfig = serde_json::from_str(r#"{
//!     "database": { "name": "tenants" },
//!     "fan_out_limit": 4
//! }"#).unwrap();
//!
//! assert_eq!(config.database.name, "tenants");
//! assert_eq!(config.naming.collection_prefix, "fh_");
//! assert_eq!(config.naming.max_entity_type_length, 70);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Connection settings for the document store.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Physical collection naming rules.
    #[serde(default)]
    pub naming: NamingConfig,

    /// Maximum number of concurrent branches for stats and export fan-out.
    #[serde(default = "default_fan_out_limit")]
    pub fan_out_limit: usize,

    /// Export format used when a request does not name one.
    #[serde(default = "default_export_format")]
    pub default_export_format: String,

    /// Label attached to connection lifecycle log lines.
    #[serde(default = "default_version")]
    pub version: String,
}

/// Connection settings for the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URI.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Name of the physical database shared by tenants (or owned by one
    /// tenant in dedicated mode).
    #[serde(default = "default_database_name")]
    pub name: String,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Rules for deriving physical collection names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Prefix placed in front of every shared-mode collection.
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,

    /// Separator between the tenant identifier and the entity type.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Shape a tenant identifier must have in shared mode (regex).
    #[serde(default = "default_tenant_pattern")]
    pub tenant_pattern: String,

    /// Maximum length of an entity type.
    #[serde(default = "default_max_entity_type_length")]
    pub max_entity_type_length: usize,

    /// Marker identifying store-internal collections.
    #[serde(default = "default_system_marker")]
    pub system_marker: String,
}

fn default_fan_out_limit() -> usize {
    10
}

fn default_export_format() -> String {
    "json".to_string()
}

fn default_version() -> String {
    crate::VERSION.to_string()
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database_name() -> String {
    "fh-db".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_collection_prefix() -> String {
    "fh_".to_string()
}

fn default_separator() -> String {
    "_".to_string()
}

fn default_tenant_pattern() -> String {
    r".+-[a-zA-Z0-9]{24}-".to_string()
}

fn default_max_entity_type_length() -> usize {
    70
}

fn default_system_marker() -> String {
    "system.".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            naming: NamingConfig::default(),
            fan_out_limit: default_fan_out_limit(),
            default_export_format: default_export_format(),
            version: default_version(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            name: default_database_name(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            collection_prefix: default_collection_prefix(),
            separator: default_separator(),
            tenant_pattern: default_tenant_pattern(),
            max_entity_type_length: default_max_entity_type_length(),
            system_marker: default_system_marker(),
        }
    }
}

impl GatewayConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database name.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database.name = name.into();
        self
    }

    /// Sets the database URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.database.uri = uri.into();
        self
    }

    /// Sets the fan-out limit.
    pub fn with_fan_out_limit(mut self, limit: usize) -> Self {
        self.fan_out_limit = limit;
        self
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.name.is_empty() {
            errors.push("Database name cannot be empty".to_string());
        }

        if self.fan_out_limit == 0 {
            errors.push("Fan-out limit cannot be 0".to_string());
        }

        if self.naming.max_entity_type_length == 0 {
            errors.push("Maximum entity type length cannot be 0".to_string());
        }

        if self.naming.system_marker.is_empty() {
            errors.push("System collection marker cannot be empty".to_string());
        }

        if let Err(e) = regex::Regex::new(&self.naming.tenant_pattern) {
            errors.push(format!("Invalid tenant pattern: {}", e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.database.name, "fh-db");
        assert_eq!(config.naming.collection_prefix, "fh_");
        assert_eq!(config.naming.separator, "_");
        assert_eq!(config.naming.max_entity_type_length, 70);
        assert_eq!(config.fan_out_limit, 10);
        assert_eq!(config.default_export_format, "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialization() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"naming": {"collection_prefix": "t_"}}"#).unwrap();
        assert_eq!(config.naming.collection_prefix, "t_");
        assert_eq!(config.naming.separator, "_");
        assert_eq!(config.database.uri, "mongodb://localhost:27017");
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = GatewayConfig::new().with_fan_out_limit(0);
        config.naming.tenant_pattern = "(".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
