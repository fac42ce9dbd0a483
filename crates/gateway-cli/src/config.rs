//! Command line configuration for the gateway CLI.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_MONGODB_URI` | mongodb://localhost:27017 | MongoDB connection URI |
//! | `GATEWAY_DATABASE` | fh-db | Database name |
//! | `GATEWAY_LOG_LEVEL` | info | Log level |
//! | `GATEWAY_FAN_OUT` | 10 | Concurrent branches for stats and export |
//! | `GATEWAY_DEDICATED` | false | Tenant owns the whole database |
//! | `GATEWAY_CONFIG` | - | JSON configuration file |
//!
//! Values given on the command line or in the environment override the
//! configuration file, which overrides the built-in defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use helios_gateway::GatewayConfig;

/// Gateway CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "helios-gateway")]
#[command(about = "Multi-tenant document gateway: inspect, export and import tenant data")]
#[command(version)]
pub struct CliConfig {
    /// MongoDB connection URI.
    #[arg(long, env = "GATEWAY_MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// Database name.
    #[arg(long, env = "GATEWAY_DATABASE")]
    pub database: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum concurrent branches for collection stats and export.
    #[arg(long, env = "GATEWAY_FAN_OUT")]
    pub fan_out: Option<usize>,

    /// Treat the tenant as owning the whole database.
    #[arg(long, env = "GATEWAY_DEDICATED", default_value = "false")]
    pub dedicated: bool,

    /// JSON configuration file.
    #[arg(long, env = "GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check the database connection.
    Status,

    /// List a tenant's collections with size and count.
    Collections {
        /// Tenant identifier.
        tenant: String,
    },

    /// List records using a JSON parameter bag.
    List {
        /// Tenant identifier.
        tenant: String,
        /// Entity type.
        entity_type: String,
        /// Operator groups and paging as JSON, e.g. '{"gt":{"total":5},"limit":10}'.
        #[arg(long, default_value = "{}")]
        query: String,
    },

    /// Export a tenant's collections to an archive.
    Export {
        /// Tenant identifier.
        tenant: String,
        /// Export only this entity type.
        #[arg(long = "type")]
        entity_type: Option<String>,
        /// Output format (json, ndjson).
        #[arg(long)]
        format: Option<String>,
        /// Directory the archive is written to.
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Import archives or JSON files into a tenant's collections.
    Import {
        /// Tenant identifier.
        tenant: String,
        /// Files to import (.tar, .tar.zst, .json, .ndjson).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Drop one of a tenant's collections.
    Drop {
        /// Tenant identifier.
        tenant: String,
        /// Entity type.
        entity_type: String,
    },
}

impl CliConfig {
    /// Builds the gateway configuration: defaults, then the configuration
    /// file, then command line and environment overrides.
    pub fn gateway_config(&self) -> anyhow::Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str(&text).map_err(|e| {
                    anyhow::anyhow!("Invalid configuration file {}: {}", path.display(), e)
                })?
            }
            None => GatewayConfig::default(),
        };

        if let Some(uri) = &self.mongodb_uri {
            config = config.with_uri(uri.clone());
        }
        if let Some(database) = &self.database {
            config = config.with_database_name(database.clone());
        }
        if let Some(fan_out) = self.fan_out {
            config = config.with_fan_out_limit(fan_out);
        }
        Ok(config)
    }
}
