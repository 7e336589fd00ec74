//! Record publishing through a real Zenoh session.
//!
//! Zenoh requires the multi-thread tokio runtime. Each test uses a unique
//! topic so concurrent tests do not see each other's samples.

use std::sync::Arc;
use std::time::Duration;

use pointbridge_framework::{
    BridgeError, EventPublisher, Format, NativeType, PointDefinition, PublishedRecord,
    ZenohPublisher, transform,
};
use zenoh::bytes::Encoding;

fn unique_topic() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test_{}", nanos)
}

fn record() -> PublishedRecord {
    let point = PointDefinition {
        id: "D1".to_string(),
        name: "Variable 1".to_string(),
        area: "1X".to_string(),
        address: 2,
        sub_address: 0,
        communication_tag: "D1".to_string(),
        native_type: NativeType::Byte,
    };
    transform(&point, Some(7.0))
}

async fn open() -> Arc<zenoh::Session> {
    Arc::new(
        zenoh::open(zenoh::Config::default())
            .await
            .expect("Failed to open Zenoh session"),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_publish_json_record_on_topic_key() {
    let topic = unique_topic();
    let session = open().await;
    let subscriber = session
        .declare_subscriber(format!("{}/**", topic))
        .await
        .expect("Failed to create subscriber");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let publisher = ZenohPublisher::new(session.clone(), Format::Json);
    publisher
        .publish(&topic, "clp", &record())
        .await
        .expect("Failed to publish");

    let sample = tokio::time::timeout(Duration::from_secs(5), subscriber.recv_async())
        .await
        .expect("Timeout waiting for record")
        .expect("Failed to receive record");

    assert_eq!(sample.key_expr().as_str(), format!("{}/clp", topic));
    assert_eq!(sample.encoding(), &Encoding::APPLICATION_JSON);

    let json: serde_json::Value =
        serde_json::from_slice(&sample.payload().to_bytes()).expect("Payload is not JSON");
    assert_eq!(
        json,
        serde_json::json!({
            "Id": "D1",
            "Name": "Variable 1",
            "Address": "2.0",
            "Value": 7.0,
            "Type": "Byte",
        })
    );

    drop(subscriber);
    session.close().await.expect("Failed to close session");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_publish_cbor_record() {
    let topic = unique_topic();
    let session = open().await;
    let subscriber = session
        .declare_subscriber(format!("{}/**", topic))
        .await
        .expect("Failed to create subscriber");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let publisher = ZenohPublisher::new(session.clone(), Format::Cbor);
    publisher
        .publish(&topic, "clp", &record())
        .await
        .expect("Failed to publish");

    let sample = tokio::time::timeout(Duration::from_secs(5), subscriber.recv_async())
        .await
        .expect("Timeout")
        .expect("Failed to receive");

    assert_eq!(sample.encoding(), &Encoding::APPLICATION_CBOR);
    let decoded: PublishedRecord =
        pointbridge_common::decode(&sample.payload().to_bytes(), Format::Cbor).unwrap();
    assert_eq!(decoded, record());

    drop(subscriber);
    session.close().await.expect("Failed to close session");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_publish_on_closed_session_fails() {
    let topic = unique_topic();
    let session = open().await;
    session.close().await.expect("Failed to close session");

    let publisher = ZenohPublisher::new(session, Format::Json);
    let result = publisher.publish(&topic, "clp", &record()).await;

    match result {
        Err(BridgeError::Publish { key, .. }) => assert_eq!(key, format!("{}/clp", topic)),
        other => panic!("Expected a publish error, got {:?}", other),
    }
}
