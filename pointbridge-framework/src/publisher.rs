//! Record publishing.

use std::sync::Arc;

use async_trait::async_trait;
use pointbridge_common::{Format, KeyExprBuilder, PublishedRecord, encode};

use crate::error::{BridgeError, Result};

/// Sink that delivers one record at a time to a bus topic.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Deliver `record` to `topic`, routed by `key`.
    ///
    /// Completes once the bus accepted the record.
    async fn publish(&self, topic: &str, key: &str, record: &PublishedRecord) -> Result<()>;
}

#[async_trait]
impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    async fn publish(&self, topic: &str, key: &str, record: &PublishedRecord) -> Result<()> {
        (**self).publish(topic, key, record).await
    }
}

/// Publisher that puts records on a Zenoh session.
///
/// A record published to topic `t` with key `k` is put on key expression
/// `t/k`, encoded with the publisher's [`Format`].
#[derive(Clone, Debug)]
pub struct ZenohPublisher {
    session: Arc<zenoh::Session>,
    format: Format,
}

impl ZenohPublisher {
    pub fn new(session: Arc<zenoh::Session>, format: Format) -> Self {
        Self { session, format }
    }

    /// Publish an encoded payload to a key, tagged with the format's MIME type.
    pub async fn publish_raw(&self, key: &str, payload: Vec<u8>, format: Format) -> Result<()> {
        self.session
            .put(key, payload)
            .encoding(format.mime_type())
            .await
            .map_err(|e| BridgeError::Publish {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// Publish a JSON value to a key.
    pub async fn publish_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(key, payload, Format::Json).await
    }
}

#[async_trait]
impl EventPublisher for ZenohPublisher {
    async fn publish(&self, topic: &str, key: &str, record: &PublishedRecord) -> Result<()> {
        let key_expr = KeyExprBuilder::new(topic).record_key(key);
        let payload = encode(record, self.format)?;

        self.publish_raw(&key_expr, payload, self.format).await?;
        tracing::trace!(key = %key_expr, id = %record.id, value = record.value, "Published record");
        Ok(())
    }
}

/// Outcome counters for one publish pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    /// Number of records the bus accepted.
    pub success: usize,
    /// Number of records that failed and were dropped.
    pub failed: usize,
}

impl PublishStats {
    /// Total number of attempted publishes.
    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// Success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            100.0
        } else {
            (self.success as f64 / self.total() as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_stats() {
        let mut stats = PublishStats::default();
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.success_rate(), 100.0);

        stats.success = 3;
        stats.failed = 1;
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.success_rate(), 75.0);
    }
}
