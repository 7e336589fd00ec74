//! Key expression helpers.
//!
//! Records are put on `<topic>/<key>`; bridge status on `<topic>/@/status`.

use crate::config::PublishConfig;

/// Builder for key expressions under one topic.
#[derive(Debug, Clone)]
pub struct KeyExprBuilder {
    topic: String,
}

impl KeyExprBuilder {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Key expression for records published with `key`.
    ///
    /// # Example
    /// ```
    /// use pointbridge_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("iotoperations-pubsub");
    /// assert_eq!(builder.record_key("clp"), "iotoperations-pubsub/clp");
    /// ```
    pub fn record_key(&self, key: &str) -> String {
        let key = key.trim_matches('/');
        if key.is_empty() {
            self.topic.clone()
        } else {
            format!("{}/{}", self.topic, key)
        }
    }

    /// Key expression for bridge status.
    ///
    /// # Example
    /// ```
    /// use pointbridge_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("iotoperations-pubsub");
    /// assert_eq!(builder.status_key(), "iotoperations-pubsub/@/status");
    /// ```
    pub fn status_key(&self) -> String {
        format!("{}/@/status", self.topic)
    }

    /// Wildcard matching everything under the topic.
    pub fn topic_wildcard(&self) -> String {
        format!("{}/**", self.topic)
    }
}

impl From<&PublishConfig> for KeyExprBuilder {
    fn from(config: &PublishConfig) -> Self {
        KeyExprBuilder::new(config.topic.as_str())
    }
}
