//! Bridge runner for lifecycle management.

use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;

use pointbridge_common::{KeyExprBuilder, connect, init_tracing};

use crate::BridgeArgs;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::publisher::ZenohPublisher;
use crate::status::{BridgeState, StatusPublisher};

/// Bridge runner that manages the lifecycle of a bridge process.
///
/// Handles:
/// - Logging initialization
/// - Zenoh connection
/// - Task spawning and management
/// - Graceful shutdown on Ctrl+C
/// - Status publishing (optional)
///
/// # Example
///
/// ```ignore
/// use pointbridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let args = BridgeArgs::parse_with_default("mybridge.json5");
///     let config = MyBridgeConfig::load(&args.config)?;
///
///     let mut runner = BridgeRunner::new_with_args("mybridge", "dev1", config, Some(&args)).await?;
///     let publisher = runner.publisher();
///     runner.spawn(async move {
///         // Background work here
///     });
///
///     runner.run_until(monitor.run()).await
/// }
/// ```
pub struct BridgeRunner<C: BridgeConfig> {
    /// Bridge name for logging and status.
    name: String,
    /// Bridge version.
    version: String,
    /// Field device identifier.
    device: String,
    /// The loaded configuration.
    config: C,
    /// Zenoh session.
    session: Arc<zenoh::Session>,
    /// Publisher for records.
    publisher: ZenohPublisher,
    /// Status publisher (optional).
    status_publisher: Option<StatusPublisher>,
    /// Spawned tasks.
    tasks: Vec<JoinHandle<()>>,
}

impl<C: BridgeConfig> BridgeRunner<C> {
    /// Create a new bridge runner.
    ///
    /// This will:
    /// 1. Initialize logging based on config (with optional CLI override)
    /// 2. Connect to Zenoh
    /// 3. Create the publisher
    pub async fn new_with_args(
        name: impl Into<String>,
        device: impl Into<String>,
        config: C,
        args: Option<&BridgeArgs>,
    ) -> Result<Self> {
        let name = name.into();
        let device = device.into();
        let version = env!("CARGO_PKG_VERSION").to_string();

        let log_config = match args {
            Some(args) => args.logging(config.logging()),
            None => config.logging().clone(),
        };
        init_tracing(&log_config).map_err(|e| BridgeError::config(e.to_string()))?;

        tracing::info!(bridge = %name, version = %version, "Starting bridge");

        let session = Arc::new(
            connect(config.zenoh())
                .await
                .map_err(|e| BridgeError::ZenohConnection(e.to_string()))?,
        );

        tracing::info!(zid = %session.zid(), "Connected to bus");

        let publisher = ZenohPublisher::new(session.clone(), config.publish().serialization);

        Ok(Self {
            name,
            version,
            device,
            config,
            session,
            publisher,
            status_publisher: None,
            tasks: Vec::new(),
        })
    }

    /// Enable status publishing.
    ///
    /// When enabled, the runner publishes status on startup and shutdown, and
    /// [`status_publisher`](Self::status_publisher) hands out a publisher for
    /// connectivity changes.
    pub fn with_status_publishing(mut self) -> Self {
        let key = KeyExprBuilder::from(self.config.publish()).status_key();
        self.status_publisher = Some(StatusPublisher::new(
            self.publisher.clone(),
            key,
            &self.name,
            &self.version,
            &self.device,
        ));
        self
    }

    /// Get the bridge name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Get a clone of the record publisher.
    pub fn publisher(&self) -> ZenohPublisher {
        self.publisher.clone()
    }

    /// Get a clone of the status publisher, if enabled.
    pub fn status_publisher(&self) -> Option<StatusPublisher> {
        self.status_publisher.clone()
    }

    /// Spawn a background task.
    ///
    /// The task will be tracked and aborted on shutdown.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(future));
    }

    /// Run `main_loop` until it finishes or Ctrl+C is received.
    ///
    /// This will:
    /// 1. Publish "running" status (if enabled)
    /// 2. Drive `main_loop`, racing it against Ctrl+C
    /// 3. Abort all spawned tasks
    /// 4. Publish "offline" status (if enabled)
    /// 5. Close the Zenoh session
    pub async fn run_until<F>(self, main_loop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Some(ref status_pub) = self.status_publisher
            && let Err(e) = status_pub.publish(BridgeState::Running, false).await
        {
            tracing::warn!(error = %e, "Failed to publish running status");
        }

        tracing::info!(
            bridge = %self.name,
            device = %self.device,
            tasks = self.tasks.len(),
            "Bridge running. Press Ctrl+C to stop."
        );

        tokio::select! {
            _ = main_loop => {
                tracing::info!(bridge = %self.name, "Main loop finished");
            }
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
                tracing::info!(bridge = %self.name, "Received shutdown signal");
            }
        }

        for task in &self.tasks {
            task.abort();
        }

        if let Some(ref status_pub) = self.status_publisher
            && let Err(e) = status_pub.publish(BridgeState::Offline, false).await
        {
            tracing::warn!(error = %e, "Failed to publish offline status");
        }

        if let Err(e) = self.session.close().await {
            tracing::warn!(error = %e, "Error closing Zenoh session");
        }

        tracing::info!(bridge = %self.name, "Bridge stopped");

        Ok(())
    }
}
