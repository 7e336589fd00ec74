//! One poll cycle: raw reading in, published records out.

use std::fmt::Display;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::publisher::{EventPublisher, PublishStats};
use crate::snapshot::Snapshot;
use crate::{PointTable, PublishConfig, RawReading, transform};

/// Outcome of one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries in the raw reading.
    pub received: usize,
    /// Entries that matched a point definition.
    pub matched: usize,
    /// Entries whose communication tag is not in the point table.
    pub unmatched: usize,
    /// Publish outcome for the matched records.
    pub publish: PublishStats,
}

impl CycleReport {
    /// Whether the device produced no data this cycle.
    pub fn is_empty(&self) -> bool {
        self.received == 0
    }
}

/// Turns raw readings into published records.
///
/// Records are built under the [`Snapshot`] lock, published one at a time
/// outside it, and the snapshot is cleared afterwards whatever the publish
/// outcome. A failed publish is logged and the pass continues with the
/// remaining records; failed records are not retried.
pub struct PollCycle<P> {
    machine: String,
    points: Arc<PointTable>,
    snapshot: Snapshot,
    publisher: P,
    topic: String,
    key: String,
}

impl<P: EventPublisher> PollCycle<P> {
    pub fn new(
        machine: impl Into<String>,
        points: Arc<PointTable>,
        publisher: P,
        publish: &PublishConfig,
    ) -> Self {
        Self {
            machine: machine.into(),
            points,
            snapshot: Snapshot::new(),
            publisher,
            topic: publish.topic.clone(),
            key: publish.key.clone(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Handle the outcome of one device read.
    pub async fn run<E: Display>(&self, reading: Result<RawReading, E>) -> CycleReport {
        let reading = match reading {
            Ok(reading) if !reading.is_empty() => reading,
            Ok(_) => {
                warn!(machine = %self.machine, "Machine returned no value");
                return CycleReport::default();
            }
            Err(e) => {
                warn!(machine = %self.machine, error = %e, "Machine returned no value");
                return CycleReport::default();
            }
        };

        info!(machine = %self.machine, entries = reading.len(), "Processing data");
        let mut report = self.aggregate(&reading);

        info!(machine = %self.machine, records = report.matched, "Publishing records");
        report.publish = self.publish_snapshot().await;
        self.snapshot.clear();

        info!(
            machine = %self.machine,
            received = report.received,
            unmatched = report.unmatched,
            published = report.publish.success,
            failed = report.publish.failed,
            success_rate = report.publish.success_rate(),
            "Cycle complete"
        );

        report
    }

    /// Transform `reading` into the snapshot, replacing its contents.
    fn aggregate(&self, reading: &RawReading) -> CycleReport {
        self.snapshot.with_exclusive(|records| {
            let mut report = CycleReport {
                received: reading.len(),
                ..Default::default()
            };
            let mut next = Vec::with_capacity(reading.len());

            for (tag, value) in reading.iter() {
                match self.points.by_tag(tag) {
                    Some(point) => next.push(transform(point, value)),
                    None => {
                        report.unmatched += 1;
                        warn!(machine = %self.machine, tag, "No point defined for communication tag");
                    }
                }
            }

            report.matched = next.len();
            *records = next;
            report
        })
    }

    /// Publish the snapshot contents in order, one record at a time.
    async fn publish_snapshot(&self) -> PublishStats {
        let mut stats = PublishStats::default();

        for record in self.snapshot.records() {
            match self.publisher.publish(&self.topic, &self.key, &record).await {
                Ok(()) => {
                    stats.success += 1;
                    debug!(id = %record.id, address = %record.address, value = record.value, "Published data");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(
                        topic = %self.topic,
                        key = %self.key,
                        id = %record.id,
                        error = %e,
                        "Failed to publish record"
                    );
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BridgeError, Result};
    use crate::{NativeType, PointDefinition, PublishedRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, String, PublishedRecord)>>,
        fail_ids: Vec<String>,
    }

    #[async_trait]
    impl EventPublisher for Recorder {
        async fn publish(&self, topic: &str, key: &str, record: &PublishedRecord) -> Result<()> {
            if self.fail_ids.contains(&record.id) {
                return Err(BridgeError::Publish {
                    key: key.to_string(),
                    message: "broker refused".to_string(),
                });
            }
            self.seen
                .lock()
                .unwrap()
                .push((topic.to_string(), key.to_string(), record.clone()));
            Ok(())
        }
    }

    fn point(id: &str, address: u32, native_type: NativeType) -> PointDefinition {
        PointDefinition {
            id: id.to_string(),
            name: format!("Variable {}", id),
            area: "1X".to_string(),
            address,
            sub_address: 0,
            communication_tag: id.to_string(),
            native_type,
        }
    }

    fn cycle(publisher: Arc<Recorder>) -> PollCycle<Arc<Recorder>> {
        let points = PointTable::new(vec![
            point("D1", 2, NativeType::Byte),
            point("D2", 3, NativeType::Int16),
        ])
        .unwrap();
        let publish = PublishConfig {
            topic: "iotoperations-pubsub".to_string(),
            key: "clp".to_string(),
            ..Default::default()
        };
        PollCycle::new("CLP", Arc::new(points), publisher, &publish)
    }

    fn ok(reading: RawReading) -> std::result::Result<RawReading, String> {
        Ok(reading)
    }

    #[tokio::test]
    async fn test_single_point_scenario() {
        let publisher = Arc::new(Recorder::default());
        let cycle = cycle(publisher.clone());

        let report = cycle.run(ok(RawReading::new().with("D1", Some(7.0)))).await;

        assert_eq!(report.matched, 1);
        assert_eq!(report.publish.success, 1);

        let seen = publisher.seen.lock().unwrap();
        let (topic, key, record) = &seen[0];
        assert_eq!(topic, "iotoperations-pubsub");
        assert_eq!(key, "clp");
        assert_eq!(record.id, "D1");
        assert_eq!(record.name, "Variable D1");
        assert_eq!(record.address, "2.0");
        assert_eq!(record.value, 7.0);
        assert_eq!(record.kind, "Byte");
    }

    #[tokio::test]
    async fn test_absent_value_published_as_zero() {
        let publisher = Arc::new(Recorder::default());
        let cycle = cycle(publisher.clone());

        cycle.run(ok(RawReading::new().with("D1", None))).await;

        let seen = publisher.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].2.value, 0.0);
    }

    #[tokio::test]
    async fn test_empty_or_failed_reading_publishes_nothing() {
        let publisher = Arc::new(Recorder::default());
        let cycle = cycle(publisher.clone());

        let report = cycle.run(ok(RawReading::new())).await;
        assert!(report.is_empty());

        let report = cycle
            .run(Err::<RawReading, _>("timeout".to_string()))
            .await;
        assert!(report.is_empty());

        assert!(publisher.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_no_data_logged_once_per_cycle() {
        let cycle = cycle(Arc::new(Recorder::default()));

        cycle.run(ok(RawReading::new())).await;
        cycle
            .run(Err::<RawReading, _>("timeout".to_string()))
            .await;

        assert!(logs_contain("error=timeout"));
        assert!(!logs_contain("Publishing records"));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("Machine returned no value"))
                .count()
            {
                2 => Ok(()),
                n => Err(format!("expected one no-data line per cycle, found {}", n)),
            }
        });
    }

    #[tokio::test]
    async fn test_unmatched_tag_skipped() {
        let publisher = Arc::new(Recorder::default());
        let cycle = cycle(publisher.clone());

        let reading = RawReading::new()
            .with("D9", Some(1.0))
            .with("D2", Some(-4.0));
        let report = cycle.run(ok(reading)).await;

        assert_eq!(report.received, 2);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.matched, 1);

        let seen = publisher.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].2.id, "D2");
        assert_eq!(seen[0].2.value, -4.0);
    }

    #[tokio::test]
    async fn test_points_missing_from_reading_produce_no_record() {
        let publisher = Arc::new(Recorder::default());
        let cycle = cycle(publisher.clone());

        let report = cycle.run(ok(RawReading::new().with("D2", Some(1.0)))).await;

        assert_eq!(report.matched, 1);
        let seen = publisher.seen.lock().unwrap();
        assert!(seen.iter().all(|(_, _, r)| r.id != "D1"));
    }

    #[tokio::test]
    async fn test_publishes_in_reading_order() {
        let publisher = Arc::new(Recorder::default());
        let cycle = cycle(publisher.clone());

        let reading = RawReading::new()
            .with("D2", Some(2.0))
            .with("D1", Some(1.0));
        cycle.run(ok(reading)).await;

        let ids: Vec<_> = publisher
            .seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, r)| r.id.clone())
            .collect();
        assert_eq!(ids, vec!["D2", "D1"]);
    }

    #[tokio::test]
    async fn test_failed_publish_continues_and_snapshot_cleared() {
        let publisher = Arc::new(Recorder {
            fail_ids: vec!["D1".to_string()],
            ..Default::default()
        });
        let cycle = cycle(publisher.clone());

        let reading = RawReading::new()
            .with("D1", Some(1.0))
            .with("D2", Some(2.0));
        let report = cycle.run(ok(reading)).await;

        assert_eq!(report.publish.failed, 1);
        assert_eq!(report.publish.success, 1);
        assert_eq!(publisher.seen.lock().unwrap()[0].2.id, "D2");
        assert!(cycle.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_no_accumulation_across_cycles() {
        let publisher = Arc::new(Recorder::default());
        let cycle = cycle(publisher.clone());

        cycle.run(ok(RawReading::new().with("D1", Some(1.0)))).await;
        cycle.run(ok(RawReading::new().with("D2", Some(2.0)))).await;

        let seen = publisher.seen.lock().unwrap();
        let ids: Vec<_> = seen.iter().map(|(_, _, r)| r.id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D2"]);
        assert!(cycle.snapshot().is_empty());
    }
}
