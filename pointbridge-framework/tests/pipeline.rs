//! Scheduler, cycle and monitor driven together against fake device and
//! publisher capabilities.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pointbridge_framework::{
    BridgeConfig, BridgeError, ConnectionMonitor, EventPublisher, NativeType, PointDefinition,
    PointTable, PollCycle, PollScheduler, ProtocolDevice, PublishConfig, PublishedRecord,
    RawReading, ScheduleConfig,
};
use serde::Deserialize;
use tokio_test::assert_ok;

#[derive(Debug, thiserror::Error)]
#[error("device offline")]
struct Offline;

/// Returns `D1 = n` on the n-th read, fails every read listed in `fail_on`.
struct ScriptedDevice {
    reads: AtomicU64,
    fail_on: Vec<u64>,
    connected: AtomicBool,
}

impl ScriptedDevice {
    fn new(fail_on: Vec<u64>) -> Self {
        Self {
            reads: AtomicU64::new(0),
            fail_on,
            connected: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl ProtocolDevice for ScriptedDevice {
    type Error = Offline;

    fn id(&self) -> &str {
        "CLP"
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn read(&self) -> Result<RawReading, Offline> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&n) {
            self.connected.store(false, Ordering::SeqCst);
            return Err(Offline);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(RawReading::new()
            .with("tag1", Some(n as f64))
            .with("tag2", None)
            .with("unknown", Some(1.0)))
    }
}

#[derive(Default)]
struct Collector {
    records: Mutex<Vec<PublishedRecord>>,
}

#[async_trait]
impl EventPublisher for Collector {
    async fn publish(
        &self,
        _topic: &str,
        key: &str,
        record: &PublishedRecord,
    ) -> pointbridge_framework::Result<()> {
        if record.value < 0.0 {
            return Err(BridgeError::Publish {
                key: key.to_string(),
                message: "negative".to_string(),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn points() -> Arc<PointTable> {
    let point = |id: &str, tag: &str, address| PointDefinition {
        id: id.to_string(),
        name: format!("Variable {}", id),
        area: "1X".to_string(),
        address,
        sub_address: 0,
        communication_tag: tag.to_string(),
        native_type: NativeType::Byte,
    };
    Arc::new(PointTable::new(vec![point("D1", "tag1", 2), point("D2", "tag2", 10)]).unwrap())
}

fn publish() -> PublishConfig {
    PublishConfig {
        topic: "iotoperations-pubsub".to_string(),
        key: "clp".to_string(),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_cycles_publish_every_matched_point() {
    let device = Arc::new(ScriptedDevice::new(vec![1]));
    let collector = Arc::new(Collector::default());
    let cycle = Arc::new(PollCycle::new("CLP", points(), collector.clone(), &publish()));

    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let on_reading = {
        let cycle = cycle.clone();
        move |reading: Result<RawReading, Offline>| {
            let cycle = cycle.clone();
            let sink = sink.clone();
            async move {
                let report = cycle.run(reading).await;
                sink.lock().unwrap().push(report);
            }
        }
    };

    let scheduler = PollScheduler::new("Trigger1", None, Duration::from_secs(5)).unwrap();
    let fired = scheduler.run_for(device.clone(), on_reading, 3).await;
    assert_eq!(fired, 3);

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].matched, 2);
    assert_eq!(reports[0].unmatched, 1);
    assert!(reports[1].is_empty());
    assert_eq!(reports[2].publish.success, 2);

    let records = collector.records.lock().unwrap();
    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.id.as_str(), r.address.as_str(), r.value))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("D1", "2.0", 0.0),
            ("D2", "10.0", 0.0),
            ("D1", "2.0", 2.0),
            ("D2", "10.0", 0.0),
        ]
    );
    assert!(cycle.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_tracks_device_state() {
    let device = Arc::new(ScriptedDevice::new(vec![0]));
    let mut monitor = ConnectionMonitor::new(device.clone(), Duration::from_secs(10));

    assert!(monitor.check().await);
    assert_eq!(monitor.last_state(), Some(true));
    assert!(!monitor.check().await);

    assert!(device.read().await.is_err());
    assert!(monitor.check().await);
    assert_eq!(monitor.last_state(), Some(false));
}

#[derive(Debug, Deserialize)]
struct TestConfig {
    #[serde(default)]
    zenoh: pointbridge_framework::ZenohConfig,
    #[serde(default)]
    logging: pointbridge_framework::LoggingConfig,
    #[serde(default)]
    publish: PublishConfig,
    #[serde(default)]
    schedule: ScheduleConfig,
}

impl BridgeConfig for TestConfig {
    fn zenoh(&self) -> &pointbridge_framework::ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &pointbridge_framework::LoggingConfig {
        &self.logging
    }

    fn publish(&self) -> &PublishConfig {
        &self.publish
    }

    fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_from_config() {
    let config = assert_ok!(TestConfig::parse(
        r#"{
            publish: { topic: "iotoperations-pubsub", key: "clp" },
            schedule: { trigger: "Trigger1", initial_delay_secs: 2, poll_interval_secs: 1, monitor_interval_secs: 10 },
        }"#,
    ));

    let scheduler = assert_ok!(PollScheduler::from_config(config.schedule()));
    assert_eq!(scheduler.trigger(), "Trigger1");
    assert_eq!(scheduler.period(), Duration::from_secs(1));

    let device = Arc::new(ScriptedDevice::new(vec![]));
    let start = tokio::time::Instant::now();
    scheduler.run_for(device.clone(), |_| async {}, 2).await;
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(device.reads.load(Ordering::SeqCst), 2);
}
