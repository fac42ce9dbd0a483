//! Connection lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// State of the store connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Not yet usable.
    Connecting,
    /// Serving requests.
    Ready,
    /// Closed on request.
    Closed,
    /// Lost or never established.
    Failed(String),
}

impl ConnectionState {
    /// Returns `true` for [`ConnectionState::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    /// Returns `true` once the state can no longer become ready by itself.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Ready => write!(f, "ready"),
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Result of a health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Connection state at the time of the check.
    pub state: ConnectionState,
    /// Whether the store answered the check.
    pub healthy: bool,
    /// Failure message when unhealthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The store's own status document.
    #[serde(default)]
    pub detail: Value,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
}

/// Watches a store's connection state, logs every transition and
/// re-publishes it for the gateway's subscribers.
///
/// When the store's sender goes away the monitor publishes
/// [`ConnectionState::Closed`] and exits.
#[derive(Debug)]
pub struct ConnectionMonitor {
    handle: JoinHandle<()>,
}

impl ConnectionMonitor {
    /// Spawns the monitor task.
    pub fn spawn(
        mut source: watch::Receiver<ConnectionState>,
        sink: watch::Sender<ConnectionState>,
        version: String,
    ) -> Self {
        let handle = tokio::spawn(async move {
            while source.changed().await.is_ok() {
                let state = source.borrow_and_update().clone();
                log_transition(&state, &version);
                sink.send_replace(state);
            }
            if !sink.borrow().is_terminal() {
                log_transition(&ConnectionState::Closed, &version);
                sink.send_replace(ConnectionState::Closed);
            }
        });
        Self { handle }
    }

    /// Stops the monitor.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the monitor has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn log_transition(state: &ConnectionState, version: &str) {
    match state {
        ConnectionState::Connecting => info!(version = %version, "Database connecting"),
        ConnectionState::Ready => info!(version = %version, "Database opened"),
        ConnectionState::Closed => warn!(version = %version, "Database closed"),
        ConnectionState::Failed(message) => {
            error!(version = %version, error = %message, "Database connection error")
        }
    }
}
