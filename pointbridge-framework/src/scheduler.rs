//! Fixed-cadence poll trigger.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::{ScheduleConfig, check_initial_delay};
use crate::device::ProtocolDevice;
use crate::error::{BridgeError, Result};
use crate::RawReading;

/// Fires a device read plus its callback on a fixed period.
///
/// The period runs from firing to firing, not from the end of the previous
/// cycle. Each firing is awaited before the next one is armed, so cycles
/// never overlap; a cycle that overruns the period pushes the next firing
/// back until it completes, without catch-up bursts. A panicking cycle is
/// logged and the next firing proceeds.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    trigger: String,
    initial_delay: Option<Duration>,
    period: Duration,
}

impl PollScheduler {
    /// Create a scheduler. Without an `initial_delay` the first firing is immediate.
    pub fn new(
        trigger: impl Into<String>,
        initial_delay: Option<Duration>,
        period: Duration,
    ) -> Result<Self> {
        if period.is_zero() {
            return Err(BridgeError::validation("poll period must be greater than 0"));
        }
        check_initial_delay(initial_delay)?;

        Ok(Self {
            trigger: trigger.into(),
            initial_delay,
            period,
        })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Self::new(
            config.trigger.as_str(),
            config.initial_delay(),
            config.poll_interval(),
        )
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Fire forever.
    pub async fn run<D, F, Fut>(self, device: Arc<D>, callback: F)
    where
        D: ProtocolDevice,
        F: Fn(std::result::Result<RawReading, D::Error>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.fire(device, callback, None).await;
    }

    /// Fire exactly `firings` times, then return how many were attempted.
    pub async fn run_for<D, F, Fut>(self, device: Arc<D>, callback: F, firings: u64) -> u64
    where
        D: ProtocolDevice,
        F: Fn(std::result::Result<RawReading, D::Error>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.fire(device, callback, Some(firings)).await
    }

    async fn fire<D, F, Fut>(self, device: Arc<D>, callback: F, limit: Option<u64>) -> u64
    where
        D: ProtocolDevice,
        F: Fn(std::result::Result<RawReading, D::Error>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback = Arc::new(callback);
        let Some(start) = Instant::now().checked_add(self.initial_delay.unwrap_or_default()) else {
            error!(
                trigger = %self.trigger,
                delay = ?self.initial_delay,
                "Initial delay out of range, not polling"
            );
            return 0;
        };
        let mut ticker = time::interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            trigger = %self.trigger,
            machine = device.id(),
            initial_delay = ?self.initial_delay,
            period = ?self.period,
            "Poll scheduler started"
        );

        let mut fired = 0u64;
        while limit.is_none_or(|limit| fired < limit) {
            ticker.tick().await;
            fired += 1;

            let device = Arc::clone(&device);
            let callback = Arc::clone(&callback);
            let firing = tokio::spawn(async move {
                let reading = device.read().await;
                callback(reading).await;
            });

            match firing.await {
                Ok(()) => debug!(trigger = %self.trigger, firing = fired, "Cycle finished"),
                Err(e) if e.is_panic() => {
                    error!(trigger = %self.trigger, firing = fired, "Cycle panicked")
                }
                Err(e) => error!(trigger = %self.trigger, firing = fired, error = %e, "Cycle aborted"),
            }
        }

        fired
    }
}
