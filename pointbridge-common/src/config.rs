use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::serialization::Format;

/// Zenoh session role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZenohMode {
    #[default]
    Peer,
    Client,
    Router,
}

impl ZenohMode {
    /// Name as understood by the Zenoh configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZenohMode::Peer => "peer",
            ZenohMode::Client => "client",
            ZenohMode::Router => "router",
        }
    }
}

impl std::fmt::Display for ZenohMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zenoh connection configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZenohConfig {
    /// Session role: "peer" (default), "client" or "router".
    #[serde(default)]
    pub mode: ZenohMode,

    /// Endpoints to connect to (required in client mode).
    #[serde(default)]
    pub connect: Vec<String>,

    /// Endpoints to listen on.
    #[serde(default)]
    pub listen: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive, e.g. "info" or "pointbridge_framework=debug".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Where published records go on the bus.
///
/// Every record is put on `<topic>/<key>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Bus topic (first key expression chunk).
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Routing key appended to the topic.
    #[serde(default = "default_key")]
    pub key: String,

    /// Payload format.
    #[serde(default)]
    pub serialization: Format,
}

fn default_topic() -> String {
    "pointbridge".to_string()
}

fn default_key() -> String {
    "points".to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            key: default_key(),
            serialization: Format::default(),
        }
    }
}

impl PublishConfig {
    /// Check that topic and key can form a key expression.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("topic", &self.topic), ("key", &self.key)] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("publish.{} cannot be empty", field)));
            }
            if value.contains(['*', '$', '?', '#']) {
                return Err(Error::Config(format!(
                    "publish.{} '{}' contains wildcard characters",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default)]
        zenoh: ZenohConfig,
        #[serde(default)]
        logging: LoggingConfig,
        #[serde(default)]
        publish: PublishConfig,
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
        {
            zenoh: {
                mode: "client",
                connect: ["tcp/localhost:7447"],
            },
            logging: {
                level: "debug",
                format: "json",
            },
            publish: {
                topic: "iotoperations-pubsub",
                key: "clp",
                serialization: "cbor",
            },
        }
        "#;

        let config: Sample = json5::from_str(content).unwrap();

        assert_eq!(config.zenoh.mode, ZenohMode::Client);
        assert_eq!(config.zenoh.connect, vec!["tcp/localhost:7447"]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.publish.topic, "iotoperations-pubsub");
        assert_eq!(config.publish.key, "clp");
        assert_eq!(config.publish.serialization, Format::Cbor);
    }

    #[test]
    fn test_defaults() {
        let config: Sample = json5::from_str("{}").unwrap();

        assert_eq!(config.zenoh.mode, ZenohMode::Peer);
        assert!(config.zenoh.listen.is_empty());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.publish, PublishConfig::default());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = json5::from_str::<Sample>(r#"{ zenoh: { mode: "broker" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_publish_validation() {
        let mut publish = PublishConfig::default();
        assert!(publish.validate().is_ok());

        publish.key = "  ".to_string();
        assert!(publish.validate().is_err());

        publish.key = "clp/*".to_string();
        assert!(publish.validate().is_err());
    }
}
