//! Modbus point bridge.
//!
//! Polls one Modbus device (TCP or RTU/serial) on the configured cadence and
//! publishes a record per point to Zenoh.

use std::sync::Arc;

use anyhow::Context;
use pointbridge_framework::{
    BridgeArgs, BridgeConfig, BridgeRunner, ConnectionMonitor, PollCycle, PollScheduler,
    ProtocolDevice, RawReading,
};
use pointbridge_modbus::config::ModbusBridgeConfig;
use pointbridge_modbus::device::{DeviceError, ModbusDevice};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = BridgeArgs::parse_with_default("pointbridge.json5");

    let config = ModbusBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let points = Arc::new(config.point_table()?);
    let device = Arc::new(
        ModbusDevice::new(config.device.clone(), &points).context("Failed to bind point table")?,
    );

    let mut runner = BridgeRunner::new_with_args("pointbridge-modbus", device.id(), config, Some(&args))
        .await?
        .with_status_publishing();

    let schedule = runner.config().schedule().clone();
    let scheduler = PollScheduler::from_config(&schedule)?;

    info!(
        device = %device.id(),
        points = points.len(),
        trigger = %scheduler.trigger(),
        period = ?scheduler.period(),
        "Polling configured"
    );

    let cycle = Arc::new(PollCycle::new(
        device.id(),
        points,
        runner.publisher(),
        runner.config().publish(),
    ));
    let on_reading = move |reading: Result<RawReading, DeviceError>| {
        let cycle = cycle.clone();
        async move {
            cycle.run(reading).await;
        }
    };

    let monitor = ConnectionMonitor::new(device.clone(), schedule.monitor_interval())
        .with_status(runner.status_publisher());

    match args.cycles {
        Some(cycles) => {
            runner.spawn(monitor.run());
            runner
                .run_until(async move {
                    let fired = scheduler.run_for(device, on_reading, cycles).await;
                    info!(cycles = fired, "Requested cycles complete");
                })
                .await?;
        }
        None => {
            runner.spawn(scheduler.run(device, on_reading));
            runner.run_until(monitor.run()).await?;
        }
    }

    Ok(())
}
