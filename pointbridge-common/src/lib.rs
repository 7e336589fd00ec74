//! PointBridge Common Library
//!
//! Shared types and utilities for PointBridge field-device bridges:
//!
//! - [`point`] - Point definitions and the point table
//! - [`reading`] - Raw values returned by a device read
//! - [`record`] - Published record shape and the transformer
//! - [`serialization`] - JSON/CBOR encoding and decoding
//! - [`config`] - Configuration sections shared by bridges
//! - [`session`] - Zenoh session management
//! - [`keyexpr`] - Key expression builders
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod keyexpr;
pub mod point;
pub mod reading;
pub mod record;
pub mod serialization;
pub mod session;

pub use config::{
    LogFormat, LoggingConfig, PublishConfig, ZenohConfig, ZenohMode,
};
pub use error::{Error, Result};
pub use keyexpr::KeyExprBuilder;
pub use point::{NativeType, PointDefinition, PointTable};
pub use reading::RawReading;
pub use record::{PublishedRecord, transform};
pub use serialization::{Format, decode, decode_auto, encode};
pub use session::connect;

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Example
///
/// ```ignore
/// use pointbridge_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))
}
