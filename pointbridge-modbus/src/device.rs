//! Modbus field device.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pointbridge_common::{NativeType, PointTable, RawReading};
use pointbridge_framework::ProtocolDevice;
use tokio::net::lookup_host;
use tokio::sync::Mutex;
use tokio_modbus::client::{Context, Reader};
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, DeviceConfig, RegisterType, WordOrder};
use crate::decode::{bits_needed, decode_bits, decode_registers, registers_needed};

/// Error type for device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Read failed: {0}")]
    Read(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Wire-level read plan for one point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointPlan {
    pub tag: String,
    pub register_type: RegisterType,
    pub address: u16,
    pub count: u16,
    pub sub_address: u32,
    pub native_type: NativeType,
}

impl PointPlan {
    /// Resolve the protocol address and read size of a point.
    pub fn new(
        point: &pointbridge_common::PointDefinition,
        address_base: u32,
    ) -> Result<Self, DeviceError> {
        let register_type = RegisterType::from_area(&point.area).ok_or_else(|| {
            DeviceError::Config(format!("point '{}': unknown area '{}'", point.id, point.area))
        })?;

        let count = if register_type.is_bit_area() {
            bits_needed(point.native_type)
        } else {
            registers_needed(point.native_type)
        };

        let address = point
            .address
            .checked_sub(address_base)
            .and_then(|a| u16::try_from(a).ok())
            .filter(|a| a.checked_add(count - 1).is_some())
            .ok_or_else(|| {
                DeviceError::Config(format!(
                    "point '{}': address {} (base {}) is outside the Modbus address space",
                    point.id, point.address, address_base
                ))
            })?;

        Ok(Self {
            tag: point.communication_tag.clone(),
            register_type,
            address,
            count,
            sub_address: point.sub_address,
            native_type: point.native_type,
        })
    }
}

fn serial_parity(parity: &str) -> Result<tokio_serial::Parity, DeviceError> {
    match parity.to_lowercase().as_str() {
        "none" => Ok(tokio_serial::Parity::None),
        "even" => Ok(tokio_serial::Parity::Even),
        "odd" => Ok(tokio_serial::Parity::Odd),
        other => Err(DeviceError::Config(format!("unsupported parity '{}'", other))),
    }
}

fn serial_stop_bits(stop_bits: u8) -> Result<tokio_serial::StopBits, DeviceError> {
    match stop_bits {
        1 => Ok(tokio_serial::StopBits::One),
        2 => Ok(tokio_serial::StopBits::Two),
        other => Err(DeviceError::Config(format!("unsupported stop bits {}", other))),
    }
}

fn serial_data_bits(data_bits: u8) -> Result<tokio_serial::DataBits, DeviceError> {
    match data_bits {
        5 => Ok(tokio_serial::DataBits::Five),
        6 => Ok(tokio_serial::DataBits::Six),
        7 => Ok(tokio_serial::DataBits::Seven),
        8 => Ok(tokio_serial::DataBits::Eight),
        other => Err(DeviceError::Config(format!("unsupported data bits {}", other))),
    }
}

/// A Modbus RTU/TCP device read point by point.
///
/// The connection is kept open between reads. A transport error or timeout
/// drops it and fails the read; the next read reconnects.
pub struct ModbusDevice {
    config: DeviceConfig,
    plans: Vec<PointPlan>,
    ctx: Mutex<Option<Context>>,
    connected: AtomicBool,
}

impl ModbusDevice {
    /// Bind the device to the point table.
    pub fn new(config: DeviceConfig, points: &PointTable) -> Result<Self, DeviceError> {
        let plans = points
            .iter()
            .map(|point| PointPlan::new(point, config.address_base))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            plans,
            ctx: Mutex::new(None),
            connected: AtomicBool::new(false),
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    /// Connect to the Modbus device.
    async fn connect(&self) -> Result<Context, DeviceError> {
        let slave = Slave(self.config.unit_id);

        match &self.config.connection {
            ConnectionConfig::Tcp { host, port } => {
                let addrs: Vec<SocketAddr> =
                    tokio::time::timeout(self.timeout(), lookup_host((host.as_str(), *port)))
                        .await
                        .map_err(|_| DeviceError::Timeout(self.timeout()))?
                        .map_err(|e| {
                            DeviceError::Connection(format!("Cannot resolve '{}': {}", host, e))
                        })?
                        .collect();

                let mut last_error =
                    DeviceError::Connection(format!("'{}' resolved to no address", host));
                for addr in addrs {
                    let attempt = tcp::connect_slave(addr, slave);
                    match tokio::time::timeout(self.timeout(), attempt).await {
                        Ok(Ok(ctx)) => return Ok(ctx),
                        Ok(Err(e)) => {
                            debug!(device = %self.config.name, %addr, error = %e, "Address refused");
                            last_error = DeviceError::Connection(format!("{}: {}", addr, e));
                        }
                        Err(_) => last_error = DeviceError::Timeout(self.timeout()),
                    }
                }
                Err(last_error)
            }
            ConnectionConfig::Rtu {
                port,
                baud_rate,
                data_bits,
                parity,
                stop_bits,
            } => {
                let builder = tokio_serial::new(port, *baud_rate)
                    .parity(serial_parity(parity)?)
                    .stop_bits(serial_stop_bits(*stop_bits)?)
                    .data_bits(serial_data_bits(*data_bits)?)
                    .timeout(self.timeout());

                let serial = tokio_serial::SerialStream::open(&builder)
                    .map_err(|e| DeviceError::Connection(format!("Serial open failed: {}", e)))?;

                Ok(rtu::attach_slave(serial, slave))
            }
        }
    }

    /// Read one point.
    ///
    /// A Modbus exception or an undecodable response yields `Ok(None)`;
    /// transport failures are errors.
    async fn read_point(&self, ctx: &mut Context, plan: &PointPlan) -> Result<Option<f64>, DeviceError> {
        let timeout = self.timeout();
        let device = self.config.name.as_str();

        macro_rules! request {
            ($call:expr) => {
                match tokio::time::timeout(timeout, $call)
                    .await
                    .map_err(|_| DeviceError::Timeout(timeout))?
                    .map_err(|e| DeviceError::Read(e.to_string()))?
                {
                    Ok(data) => data,
                    Err(code) => {
                        warn!(
                            device,
                            tag = %plan.tag,
                            area = plan.register_type.as_str(),
                            address = plan.address,
                            exception = ?code,
                            "Device answered with an exception"
                        );
                        return Ok(None);
                    }
                }
            };
        }

        let value = match plan.register_type {
            RegisterType::Coil => {
                let bits = request!(ctx.read_coils(plan.address, plan.count));
                decode_bits(&bits, plan.native_type)
            }
            RegisterType::Discrete => {
                let bits = request!(ctx.read_discrete_inputs(plan.address, plan.count));
                decode_bits(&bits, plan.native_type)
            }
            RegisterType::Input => {
                let words = request!(ctx.read_input_registers(plan.address, plan.count));
                decode_registers(&words, plan.native_type, plan.sub_address, self.word_order())
            }
            RegisterType::Holding => {
                let words = request!(ctx.read_holding_registers(plan.address, plan.count));
                decode_registers(&words, plan.native_type, plan.sub_address, self.word_order())
            }
        };

        if value.is_none() {
            warn!(device, tag = %plan.tag, "Short response, no value decoded");
        }

        Ok(value)
    }

    fn word_order(&self) -> WordOrder {
        self.config.word_order
    }

    fn mark_connected(&self, connected: bool) {
        let was = self.connected.swap(connected, Ordering::SeqCst);
        if was != connected {
            if connected {
                info!(device = %self.config.name, connection = ?self.config.connection, "Modbus connected");
            } else {
                warn!(device = %self.config.name, "Modbus connection lost");
            }
        }
    }
}

#[async_trait]
impl ProtocolDevice for ModbusDevice {
    type Error = DeviceError;

    fn id(&self) -> &str {
        &self.config.name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn read(&self) -> Result<RawReading, DeviceError> {
        let mut slot = self.ctx.lock().await;

        let mut ctx = match slot.take() {
            Some(ctx) => ctx,
            None => match self.connect().await {
                Ok(ctx) => {
                    self.mark_connected(true);
                    ctx
                }
                Err(e) => {
                    self.mark_connected(false);
                    return Err(e);
                }
            },
        };

        let mut reading = RawReading::new();
        for plan in &self.plans {
            match self.read_point(&mut ctx, plan).await {
                Ok(value) => reading.insert(plan.tag.as_str(), value),
                Err(e) => {
                    // Context dropped here; the next read reconnects.
                    self.mark_connected(false);
                    return Err(e);
                }
            }
        }

        *slot = Some(ctx);
        debug!(device = %self.config.name, points = reading.len(), "Read complete");
        Ok(reading)
    }
}
