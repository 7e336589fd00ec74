//! Device connectivity reporting.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::device::ProtocolDevice;
use crate::status::{BridgeState, StatusPublisher};

/// Periodically reports whether the device is connected.
///
/// Only observes; reconnecting is up to the device. Transitions are also
/// published as bridge status when a [`StatusPublisher`] is attached.
pub struct ConnectionMonitor<D> {
    device: Arc<D>,
    period: Duration,
    status: Option<StatusPublisher>,
    last: Option<bool>,
}

impl<D: ProtocolDevice> ConnectionMonitor<D> {
    pub fn new(device: Arc<D>, period: Duration) -> Self {
        Self {
            device,
            period,
            status: None,
            last: None,
        }
    }

    pub fn with_status(mut self, status: Option<StatusPublisher>) -> Self {
        self.status = status;
        self
    }

    /// Last observed state, `None` before the first check.
    pub fn last_state(&self) -> Option<bool> {
        self.last
    }

    /// Check and report connectivity once. Returns `true` on a state change.
    pub async fn check(&mut self) -> bool {
        let connected = self.device.is_connected();

        if connected {
            info!(machine = self.device.id(), "Connected");
        } else {
            warn!(machine = self.device.id(), "Not connected");
        }

        let changed = self.last != Some(connected);
        self.last = Some(connected);

        if changed
            && let Some(status) = &self.status
            && let Err(e) = status.publish(BridgeState::Running, connected).await
        {
            warn!(error = %e, "Failed to publish connectivity status");
        }

        changed
    }

    /// Report forever on the monitor period.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.check().await;
        }
    }
}
