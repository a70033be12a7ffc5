//! Whole-engine runs: bus in, router, both flows, bus out.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tokio::sync::watch;

use osw_core::QueueMessage;
use osw_core::config::{BusConfig, WorkerConfig};
use osw_core::traits::MessageBus;
use osw_worker::jobs::pipeline::GENERIC_FAILURE_MESSAGE;
use osw_worker::jobs::{OnDemandJobHandler, PipelineJobHandler};
use osw_worker::{JobExecutor, MessageRouter};

use crate::helpers::{Harness, REQUESTS, RESULT_TYPE, RESULTS, Script};

fn router(harness: &Harness) -> Arc<MessageRouter> {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(PipelineJobHandler::new(harness.runner.clone())));
    executor.register(Arc::new(OnDemandJobHandler::new(harness.runner.clone())));

    let bus_config = BusConfig {
        listening_topic: REQUESTS.to_string(),
        subscription: "formatter".to_string(),
        publishing_topic: RESULTS.to_string(),
        max_concurrent_messages: 2,
        ..BusConfig::default()
    };
    let worker_config = WorkerConfig {
        download_dir: harness.download_root().to_string_lossy().into_owned(),
        shutdown_grace_seconds: 5,
    };
    Arc::new(MessageRouter::new(
        harness.bus.clone(),
        Arc::new(executor),
        &bus_config,
        &worker_config,
    ))
}

#[tokio::test]
async fn test_router_serves_both_flows() {
    let mut harness = Harness::new(Script::Emit(vec!["graph.osm.xml"])).await;
    harness.put_input("up/a.zip", b"PK").await;
    harness.put_input("up/b.zip", b"PK").await;
    harness.put_input("up/c.zip", b"PK").await;

    let router = router(&harness);
    let stream = router.open().await.expect("subscribe");
    let (stop, shutdown) = watch::channel(false);
    let task = tokio::spawn({
        let router = Arc::clone(&router);
        async move { router.serve(stream, shutdown).await }
    });

    for (id, file) in [("rec-a", "a.zip"), ("rec-b", "b.zip")] {
        harness
            .bus
            .publish(
                REQUESTS,
                &QueueMessage::new(
                    id,
                    "osw-validation",
                    json!({"file_upload_path": format!("up/{file}"), "tdei_project_group_id": "pg"}),
                ),
            )
            .await
            .expect("publish");
    }
    harness
        .bus
        .publish(
            REQUESTS,
            &QueueMessage::new(
                "req-c",
                "osw_on_demand_request",
                json!({"sourceUrl": "up/c.zip", "jobId": "c", "source": "osw", "target": "osm"}),
            ),
        )
        .await
        .expect("publish");
    // No messageId: nobody to answer, nothing published.
    harness
        .bus
        .publish_raw(REQUESTS, Bytes::from_static(br#"{"messageType":"osw-validation"}"#))
        .await;

    let mut results = HashMap::new();
    for _ in 0..3 {
        let result = harness.next_result().await;
        results.insert(result.message_id.clone(), result);
    }

    for id in ["rec-a", "rec-b"] {
        let status = &results[id];
        assert_eq!(status.message_type, RESULT_TYPE);
        assert_eq!(status.data["success"], true, "{id}: {:?}", status.data);
    }
    let response = &results["req-c"];
    assert_eq!(response.message_type, "osw_on_demand_request");
    assert_eq!(response.data["status"], "completed");
    assert_eq!(harness.converter.calls(), 3);

    stop.send(true).expect("signal");
    task.await.expect("join").expect("serve");
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_envelope_without_message_type_is_answered() {
    let mut harness = Harness::new(Script::Emit(vec!["graph.osm.xml"])).await;
    harness.put_input("up/a.zip", b"PK").await;

    let router = router(&harness);
    let stream = router.open().await.expect("subscribe");
    let (stop, shutdown) = watch::channel(false);
    let task = tokio::spawn({
        let router = Arc::clone(&router);
        async move { router.serve(stream, shutdown).await }
    });

    let body = json!({
        "messageId": "r1",
        "data": {"file_upload_path": "up/a.zip", "tdei_project_group_id": "g1"}
    });
    harness
        .bus
        .publish_raw(REQUESTS, Bytes::from(body.to_string()))
        .await;

    let status = harness.next_result().await;
    assert_eq!(status.message_id, "r1");
    assert_eq!(status.message_type, RESULT_TYPE);
    assert_eq!(status.data["success"], false);
    assert_eq!(status.data["file_upload_path"], "up/a.zip");
    assert_eq!(status.data["tdei_project_group_id"], "g1");
    let message = status.data["message"].as_str().expect("message");
    assert!(message.starts_with(GENERIC_FAILURE_MESSAGE), "{message}");
    assert_eq!(harness.store.downloads(), 0);
    assert_eq!(harness.converter.calls(), 0);

    stop.send(true).expect("signal");
    task.await.expect("join").expect("serve");
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_router_stops_when_idle() {
    let harness = Harness::new(Script::Emit(vec!["graph.osm.xml"])).await;
    let router = router(&harness);

    let (stop, shutdown) = watch::channel(false);
    let task = tokio::spawn({
        let router = Arc::clone(&router);
        async move { router.run(shutdown).await }
    });

    stop.send(true).expect("signal");
    tokio::time::timeout(std::time::Duration::from_secs(5), task)
        .await
        .expect("router stopped")
        .expect("join")
        .expect("run");
}
