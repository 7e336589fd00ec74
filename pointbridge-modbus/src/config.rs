//! Configuration for the Modbus bridge.

use pointbridge_common::{NativeType, PointDefinition, PointTable};
use pointbridge_framework::{
    BridgeConfig, BridgeError, LoggingConfig, PublishConfig, Result, ScheduleConfig, ZenohConfig,
};
use serde::{Deserialize, Serialize};

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusBridgeConfig {
    /// Zenoh connection settings
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bus destination for records
    #[serde(default)]
    pub publish: PublishConfig,

    /// Poll and monitor cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// The field device to poll
    pub device: DeviceConfig,

    /// Points to read on every cycle
    pub points: Vec<PointDefinition>,
}

/// Configuration for the Modbus device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name (used in logs and status)
    pub name: String,

    /// Connection type and address
    pub connection: ConnectionConfig,

    /// Modbus unit/slave ID (1-247)
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Word order of 32-bit values
    #[serde(default)]
    pub word_order: WordOrder,

    /// Subtracted from configured point addresses (1 for 1-based tag lists)
    #[serde(default)]
    pub address_base: u32,
}

fn default_unit_id() -> u8 {
    1
}

fn default_timeout_ms() -> u64 {
    1000
}

/// Connection configuration (TCP or RTU).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// Modbus TCP connection
    Tcp {
        /// Host address (IP or hostname, resolved on every connect)
        host: String,
        /// TCP port (default: 502)
        #[serde(default = "default_modbus_port")]
        port: u16,
    },
    /// Modbus RTU (serial) connection
    Rtu {
        /// Serial port path (e.g., "/dev/ttyACM0" or "COM1")
        port: String,
        /// Baud rate (default: 9600)
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        /// Data bits (default: 8)
        #[serde(default = "default_data_bits")]
        data_bits: u8,
        /// Parity: "none", "even", or "odd" (default: "none")
        #[serde(default = "default_parity")]
        parity: String,
        /// Stop bits: 1 or 2 (default: 1)
        #[serde(default = "default_stop_bits")]
        stop_bits: u8,
    },
}

fn default_modbus_port() -> u16 {
    502
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_data_bits() -> u8 {
    8
}

fn default_parity() -> String {
    "none".to_string()
}

fn default_stop_bits() -> u8 {
    1
}

/// Order of the two 16-bit words of a 32-bit value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordOrder {
    /// High word first (default)
    #[default]
    Big,
    /// Low word first
    Little,
}

/// Modbus register areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterType {
    /// Discrete output coils (read/write, 1-bit)
    Coil,
    /// Discrete input contacts (read-only, 1-bit)
    Discrete,
    /// Input registers (read-only, 16-bit)
    Input,
    /// Holding registers (read/write, 16-bit)
    Holding,
}

impl RegisterType {
    /// Parse a point area tag: `coil`/`0X`, `discrete`/`1X`, `input`/`3X`
    /// or `holding`/`4X` (case-insensitive).
    pub fn from_area(area: &str) -> Option<Self> {
        match area.trim().to_ascii_lowercase().as_str() {
            "coil" | "0x" => Some(RegisterType::Coil),
            "discrete" | "1x" => Some(RegisterType::Discrete),
            "input" | "3x" => Some(RegisterType::Input),
            "holding" | "4x" => Some(RegisterType::Holding),
            _ => None,
        }
    }

    /// Return the string name for this register type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterType::Coil => "coil",
            RegisterType::Discrete => "discrete",
            RegisterType::Input => "input",
            RegisterType::Holding => "holding",
        }
    }

    /// Whether the area is addressed in single bits.
    pub fn is_bit_area(&self) -> bool {
        matches!(self, RegisterType::Coil | RegisterType::Discrete)
    }
}

/// Highest sub-address a point may use in this area.
fn max_sub_address(register_type: RegisterType, native_type: NativeType) -> u32 {
    match (register_type.is_bit_area(), native_type) {
        (false, NativeType::Boolean) => 15,
        (false, NativeType::Byte) => 1,
        _ => 0,
    }
}

impl BridgeConfig for ModbusBridgeConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn publish(&self) -> &PublishConfig {
        &self.publish
    }

    fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    fn validate(&self) -> Result<()> {
        self.validate_common()?;
        self.device.validate()?;

        for point in &self.points {
            let register_type = RegisterType::from_area(&point.area).ok_or_else(|| {
                BridgeError::validation(format!(
                    "Point '{}': unknown area '{}' (use coil/0X, discrete/1X, input/3X or holding/4X)",
                    point.id, point.area
                ))
            })?;

            let max_sub = max_sub_address(register_type, point.native_type);
            if point.sub_address > max_sub {
                return Err(BridgeError::validation(format!(
                    "Point '{}': sub_address {} out of range for {} {} (max {})",
                    point.id,
                    point.sub_address,
                    point.native_type,
                    register_type.as_str(),
                    max_sub
                )));
            }

            if point.address < self.device.address_base {
                return Err(BridgeError::validation(format!(
                    "Point '{}': address {} is below address_base {}",
                    point.id, point.address, self.device.address_base
                )));
            }
        }

        self.point_table().map(|_| ())
    }
}

impl ModbusBridgeConfig {
    /// Build the point table, checking tag and id uniqueness.
    pub fn point_table(&self) -> Result<PointTable> {
        Ok(PointTable::new(self.points.clone())?)
    }
}

impl DeviceConfig {
    /// Validate the device section.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(BridgeError::validation("Device name cannot be empty"));
        }

        if self.unit_id == 0 || self.unit_id > 247 {
            return Err(BridgeError::validation(format!(
                "Device '{}': unit_id must be 1-247",
                self.name
            )));
        }

        if self.timeout_ms == 0 {
            return Err(BridgeError::validation(format!(
                "Device '{}': timeout_ms must be greater than 0",
                self.name
            )));
        }

        match &self.connection {
            ConnectionConfig::Tcp { host, .. } if host.trim().is_empty() => {
                return Err(BridgeError::validation(format!(
                    "Device '{}': host cannot be empty",
                    self.name
                )));
            }
            ConnectionConfig::Tcp { .. } => {}
            ConnectionConfig::Rtu {
                parity,
                data_bits,
                stop_bits,
                ..
            } => {
                if !matches!(parity.to_lowercase().as_str(), "none" | "even" | "odd") {
                    return Err(BridgeError::validation(format!(
                        "Device '{}': invalid parity '{}' (use none, even, or odd)",
                        self.name, parity
                    )));
                }
                if !(5..=8).contains(data_bits) {
                    return Err(BridgeError::validation(format!(
                        "Device '{}': data_bits must be 5-8, got {}",
                        self.name, data_bits
                    )));
                }
                if !matches!(stop_bits, 1 | 2) {
                    return Err(BridgeError::validation(format!(
                        "Device '{}': stop_bits must be 1 or 2, got {}",
                        self.name, stop_bits
                    )));
                }
            }
        }

        Ok(())
    }
}
