//! PointBridge Bridge Framework
//!
//! The poll, aggregate and publish core shared by field-device bridges.
//!
//! # Overview
//!
//! - [`ProtocolDevice`] and [`EventPublisher`] are the two capabilities a
//!   bridge plugs together: something to read points from, something to
//!   publish records to
//! - [`PollScheduler`] fires a device read on a fixed period without ever
//!   overlapping cycles
//! - [`PollCycle`] transforms each reading into [`PublishedRecord`]s through
//!   the shared [`Snapshot`] and publishes them one at a time
//! - [`ConnectionMonitor`] reports device connectivity on a slower cadence
//! - [`BridgeRunner`] handles logging, the Zenoh session, status and shutdown
//!
//! # Example
//!
//! ```ignore
//! let points = Arc::new(PointTable::new(config.points.clone())?);
//! let device = Arc::new(MyDevice::new(&config, &points)?);
//!
//! let mut runner = BridgeRunner::new_with_args("mybridge", device.id(), config, Some(&args))
//!     .await?
//!     .with_status_publishing();
//!
//! let cycle = Arc::new(PollCycle::new(device.id(), points, runner.publisher(), runner.config().publish()));
//! let scheduler = PollScheduler::from_config(runner.config().schedule())?;
//! runner.spawn(scheduler.run(device.clone(), move |reading| {
//!     let cycle = cycle.clone();
//!     async move { cycle.run(reading).await; }
//! }));
//!
//! let monitor = ConnectionMonitor::new(device, runner.config().schedule().monitor_interval())
//!     .with_status(runner.status_publisher());
//! runner.run_until(monitor.run()).await
//! ```

mod args;
mod config;
mod cycle;
mod device;
mod error;
mod monitor;
mod publisher;
mod runner;
mod scheduler;
mod snapshot;
mod status;

pub use args::BridgeArgs;
pub use config::{BridgeConfig, MAX_INITIAL_DELAY, ScheduleConfig};
pub use cycle::{CycleReport, PollCycle};
pub use device::ProtocolDevice;
pub use error::{BridgeError, Result};
pub use monitor::ConnectionMonitor;
pub use publisher::{EventPublisher, PublishStats, ZenohPublisher};
pub use runner::BridgeRunner;
pub use scheduler::PollScheduler;
pub use snapshot::Snapshot;
pub use status::{BridgeState, BridgeStatus, StatusPublisher};

// Re-export commonly used types from pointbridge-common
pub use pointbridge_common::{
    Format, LogFormat, LoggingConfig, NativeType, PointDefinition, PointTable, PublishConfig,
    PublishedRecord, RawReading, ZenohConfig, transform,
};
