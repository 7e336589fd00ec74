//! Bridge status reporting.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::publisher::ZenohPublisher;

/// Lifecycle state of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeState {
    Running,
    Offline,
}

/// Bridge status message, published on `<topic>/@/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Bridge name (e.g., "modbus").
    pub bridge: String,
    /// Bridge version.
    pub version: String,
    /// Current state.
    pub status: BridgeState,
    /// Field device identifier.
    pub device: String,
    /// Last observed device connectivity.
    pub connected: bool,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

/// Publishes [`BridgeStatus`] updates for one bridge and device.
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    publisher: ZenohPublisher,
    key: String,
    bridge: String,
    version: String,
    device: String,
}

impl StatusPublisher {
    pub fn new(
        publisher: ZenohPublisher,
        key: impl Into<String>,
        bridge: impl Into<String>,
        version: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            key: key.into(),
            bridge: bridge.into(),
            version: version.into(),
            device: device.into(),
        }
    }

    /// Build a status message stamped with the current time.
    pub fn status(&self, status: BridgeState, connected: bool) -> BridgeStatus {
        BridgeStatus {
            bridge: self.bridge.clone(),
            version: self.version.clone(),
            status,
            device: self.device.clone(),
            connected,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Publish a status message.
    pub async fn publish(&self, status: BridgeState, connected: bool) -> Result<()> {
        self.publisher
            .publish_json(&self.key, &self.status(status, connected))
            .await
    }
}
