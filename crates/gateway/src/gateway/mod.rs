//! The gateway: CRUD orchestration, collection introspection and bulk
//! export/import over a [`DocumentStore`].
//!
//! Every request goes through the same steps: check the required
//! parameters, resolve the physical collection name for the tenant, run the
//! store operation and normalize what comes back into [`Record`]s.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_gateway::backends::MemoryStore;
//! use helios_gateway::config::GatewayConfig;
//! use helios_gateway::gateway::Gateway;
//! use helios_gateway::types::Params;
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let gateway = Gateway::open(Arc::new(MemoryStore::new()), GatewayConfig::default())
//!     .await
//!     .unwrap();
//!
//! let params = Params::new("acme-1234567890abcdef12345678-")
//!     .with_type("orders")
//!     .with_fields(json!({"total": 5}));
//! let created = gateway.create(&params).await.unwrap();
//! assert_eq!(created.record().unwrap().field("total"), Some(&json!(5)));
//! # });
//! ```
//!
//! [`Record`]: crate::types::Record

mod bulk;
mod crud;
mod introspect;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::archive::TarArchiveCodec;
use crate::config::GatewayConfig;
use crate::core::{
    ArchiveCodec, ConnectionMonitor, ConnectionState, DocumentId, DocumentStore, StatusReport,
};
use crate::error::{ConnectionError, GatewayError, GatewayResult, ValidationError};
use crate::tenant::{CollectionNamer, TenancyMode, TenantId};
use crate::types::Params;

/// The multi-tenant document gateway.
#[derive(Debug)]
pub struct Gateway {
    store: Arc<dyn DocumentStore>,
    codec: Arc<dyn ArchiveCodec>,
    namer: CollectionNamer,
    config: GatewayConfig,
    state: watch::Receiver<ConnectionState>,
    _monitor: ConnectionMonitor,
}

/// A resolved single-collection request.
#[derive(Debug)]
struct Target<'p> {
    tenant: &'p TenantId,
    entity_type: &'p str,
    mode: TenancyMode,
    physical: String,
}

impl Gateway {
    /// Opens a gateway over a store.
    ///
    /// Waits (up to the configured connect timeout) for the store to report
    /// [`ConnectionState::Ready`], then starts the connection monitor.
    pub async fn open(store: Arc<dyn DocumentStore>, config: GatewayConfig) -> GatewayResult<Self> {
        config.validate().map_err(|errors| GatewayError::Config {
            message: errors.join("; "),
        })?;
        let namer = CollectionNamer::new(&config.naming).map_err(|e| GatewayError::Config {
            message: e.to_string(),
        })?;

        let mut source = store.connection_state();
        let timeout = Duration::from_millis(config.database.connect_timeout_ms);
        let settled = tokio::time::timeout(
            timeout,
            async {
                source
                    .wait_for(|state| !matches!(state, ConnectionState::Connecting))
                    .await
                    .map(|state| state.clone())
            },
        )
        .await;
        let state = match settled {
            Err(_) => {
                return Err(ConnectionError::Failed {
                    message: format!("not ready after {}ms", timeout.as_millis()),
                }
                .into());
            }
            Ok(Err(_)) => return Err(ConnectionError::Closed.into()),
            Ok(Ok(state)) => state,
        };
        match state {
            ConnectionState::Ready => {}
            ConnectionState::Failed(message) => {
                return Err(ConnectionError::Failed { message }.into());
            }
            ConnectionState::Closed | ConnectionState::Connecting => {
                return Err(ConnectionError::Closed.into());
            }
        }

        let (sink, state) = watch::channel(ConnectionState::Ready);
        let monitor = ConnectionMonitor::spawn(source, sink, config.version.clone());

        info!(
            backend = store.backend_name(),
            database = %store.database_name(),
            version = %config.version,
            "Database opened"
        );

        Ok(Self {
            store,
            codec: Arc::new(TarArchiveCodec::default()),
            namer,
            config,
            state,
            _monitor: monitor,
        })
    }

    /// Replaces the archive codec used by export and import.
    pub fn with_codec(mut self, codec: Arc<dyn ArchiveCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the collection namer.
    pub fn namer(&self) -> &CollectionNamer {
        &self.namer
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Returns the version label used in lifecycle logs.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Subscribes to connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Returns the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Health check against the store.
    pub async fn check_status(&self) -> StatusReport {
        let state = self.connection_state();
        let (healthy, message, detail) = match self.store.check_status().await {
            Ok(detail) => (true, None, detail),
            Err(e) => (false, Some(e.to_string()), Value::Null),
        };
        StatusReport {
            state,
            healthy,
            message,
            detail,
            checked_at: Utc::now(),
        }
    }

    /// Closes the store connection.
    pub async fn close(&self) -> GatewayResult<()> {
        info!(version = %self.config.version, "Closing database");
        self.store.close().await?;
        Ok(())
    }

    /// Checks the shared preconditions and resolves the physical name.
    fn target<'p>(&self, params: &'p Params) -> Result<Target<'p>, ValidationError> {
        let tenant = params.require_tenant()?;
        let entity_type = params.require_entity_type()?;
        self.namer.check_entity_type(entity_type)?;
        let mode = params.mode();
        let physical = self.namer.resolve(tenant, entity_type, mode);
        Ok(Target {
            tenant,
            entity_type,
            mode,
            physical,
        })
    }

    /// Parses a guid as a native id, falling back to the raw value.
    fn document_id(&self, guid: &str) -> DocumentId {
        match self.store.parse_id(guid) {
            Ok(id) => id,
            Err(_) => {
                debug!(guid = %guid, "guid is not a native id, using raw value");
                DocumentId::Raw(guid.to_string())
            }
        }
    }

    fn fan_out_limit(&self) -> usize {
        self.config.fan_out_limit.max(1)
    }
}
