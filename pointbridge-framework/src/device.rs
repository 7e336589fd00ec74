//! Field device capability.

use async_trait::async_trait;

use crate::RawReading;

/// A field device that can be sampled for its configured points.
///
/// Implementations own the wire protocol and the connection lifecycle,
/// including reconnecting after failures.
#[async_trait]
pub trait ProtocolDevice: Send + Sync + 'static {
    /// Error returned when a read produces no data at all.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Device identifier used in logs.
    fn id(&self) -> &str;

    /// Whether the device is currently reachable.
    ///
    /// Never fails: an undeterminable state is reported as `false`.
    fn is_connected(&self) -> bool;

    /// Read every configured point.
    ///
    /// The reading is keyed by communication tag. A point the device answered
    /// without a value maps to `None`.
    async fn read(&self) -> Result<RawReading, Self::Error>;
}

