use zenoh::Session;

use crate::config::{ZenohConfig, ZenohMode};
use crate::error::{Error, Result};

/// Build the Zenoh configuration for a [`ZenohConfig`].
pub fn zenoh_config(config: &ZenohConfig) -> Result<zenoh::Config> {
    if config.mode == ZenohMode::Client && config.connect.is_empty() {
        return Err(Error::Config(
            "Zenoh client mode requires at least one connect endpoint".to_string(),
        ));
    }

    let mut zenoh_config = zenoh::Config::default();

    zenoh_config
        .insert_json5("mode", &format!("\"{}\"", config.mode))
        .map_err(|e| Error::Config(format!("Failed to set mode: {}", e)))?;

    insert_endpoints(&mut zenoh_config, "connect/endpoints", &config.connect)?;
    insert_endpoints(&mut zenoh_config, "listen/endpoints", &config.listen)?;

    Ok(zenoh_config)
}

fn insert_endpoints(zenoh_config: &mut zenoh::Config, path: &str, endpoints: &[String]) -> Result<()> {
    if endpoints.is_empty() {
        return Ok(());
    }

    let value = serde_json::to_string(endpoints)?;
    zenoh_config
        .insert_json5(path, &value)
        .map_err(|e| Error::Config(format!("Failed to set {}: {}", path, e)))
}

/// Open a Zenoh session using the provided configuration.
pub async fn connect(config: &ZenohConfig) -> Result<Session> {
    let zenoh_config = zenoh_config(config)?;

    tracing::info!(
        mode = %config.mode,
        connect = ?config.connect,
        listen = ?config.listen,
        "Connecting to Zenoh"
    );

    let session = zenoh::open(zenoh_config).await?;

    tracing::info!(zid = %session.zid(), "Connected to Zenoh");

    Ok(session)
}
