//! Configuration traits and utilities.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::{LoggingConfig, PublishConfig, ZenohConfig};

/// Trait for bridge configuration types.
///
/// Implement this trait for your bridge's configuration struct to get
/// loading, validation and access to the sections the runner needs.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use pointbridge_framework::{
///     BridgeConfig, LoggingConfig, PublishConfig, ScheduleConfig, ZenohConfig,
/// };
///
/// #[derive(Debug, Deserialize)]
/// pub struct MyBridgeConfig {
///     pub zenoh: ZenohConfig,
///     pub logging: LoggingConfig,
///     pub publish: PublishConfig,
///     pub schedule: ScheduleConfig,
/// }
///
/// impl BridgeConfig for MyBridgeConfig {
///     fn zenoh(&self) -> &ZenohConfig { &self.zenoh }
///     fn logging(&self) -> &LoggingConfig { &self.logging }
///     fn publish(&self) -> &PublishConfig { &self.publish }
///     fn schedule(&self) -> &ScheduleConfig { &self.schedule }
/// }
/// ```
pub trait BridgeConfig: Sized + DeserializeOwned {
    /// Get the Zenoh configuration.
    fn zenoh(&self) -> &ZenohConfig;

    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Get the publish destination.
    fn publish(&self) -> &PublishConfig;

    /// Get the poll and monitor cadence.
    fn schedule(&self) -> &ScheduleConfig;

    /// Validate the configuration.
    ///
    /// Called automatically after loading. The default checks the shared
    /// sections; override to add protocol checks and call
    /// [`validate_common`](Self::validate_common) yourself.
    fn validate(&self) -> Result<()> {
        self.validate_common()
    }

    /// Validate the publish and schedule sections.
    fn validate_common(&self) -> Result<()> {
        self.publish()
            .validate()
            .map_err(|e| BridgeError::validation(e.to_string()))?;
        self.schedule().validate()
    }

    /// Load configuration from a file path.
    ///
    /// Supports JSON5 format. Calls [`validate`](Self::validate) after loading.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a JSON5 string.
    fn parse(content: &str) -> Result<Self> {
        let config: Self = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Longest accepted delay before the first poll (one day).
pub const MAX_INITIAL_DELAY: Duration = Duration::from_secs(86_400);

/// Reject a first-poll delay longer than [`MAX_INITIAL_DELAY`].
pub(crate) fn check_initial_delay(delay: Option<Duration>) -> Result<()> {
    match delay {
        Some(delay) if delay > MAX_INITIAL_DELAY => Err(BridgeError::validation(format!(
            "schedule.initial_delay_secs ({}) exceeds the {}s maximum",
            delay.as_secs(),
            MAX_INITIAL_DELAY.as_secs()
        ))),
        _ => Ok(()),
    }
}

/// Poll and monitor cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Trigger name used in logs.
    #[serde(default = "default_trigger")]
    pub trigger: String,

    /// Seconds before the first poll; negative fires as soon as the device is bound.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: i64,

    /// Seconds between poll firings.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds between connectivity reports.
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_secs: u64,
}

fn default_trigger() -> String {
    "poll".to_string()
}

fn default_initial_delay() -> i64 {
    -1
}

fn default_poll_interval() -> u64 {
    5
}

fn default_monitor_interval() -> u64 {
    10
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            initial_delay_secs: default_initial_delay(),
            poll_interval_secs: default_poll_interval(),
            monitor_interval_secs: default_monitor_interval(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Delay before the first firing, `None` for "immediately".
    pub fn initial_delay(&self) -> Option<Duration> {
        u64::try_from(self.initial_delay_secs)
            .ok()
            .map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(BridgeError::validation(
                "schedule.poll_interval_secs must be greater than 0",
            ));
        }
        if self.monitor_interval_secs < self.poll_interval_secs {
            return Err(BridgeError::validation(format!(
                "schedule.monitor_interval_secs ({}) must not be shorter than poll_interval_secs ({})",
                self.monitor_interval_secs, self.poll_interval_secs
            )));
        }
        check_initial_delay(self.initial_delay())
    }
}
