//! On-demand flow: request in, response of a different shape out.

use serde_json::{Value, json};

use osw_core::QueueMessage;
use osw_core::types::DataFormat;
use osw_worker::JobHandler;
use osw_worker::jobs::OnDemandJobHandler;
use osw_worker::jobs::on_demand::SUCCESS_MESSAGE;

use crate::helpers::{Harness, PUBLIC_BASE, Script};

const REQUEST_TYPE: &str = "OSW_ON_DEMAND_FORMATTING_REQUEST";

fn request(message_id: &str, data: Value) -> QueueMessage {
    QueueMessage::new(message_id, REQUEST_TYPE, data)
}

async fn run(harness: &mut Harness, envelope: QueueMessage) -> QueueMessage {
    OnDemandJobHandler::new(harness.runner.clone())
        .handle(envelope)
        .await;
    harness.next_result().await
}

#[tokio::test]
async fn test_osw_to_osm_completes() {
    let mut harness = Harness::new(Script::Emit(vec!["graph.osm.xml"])).await;
    harness.put_input("uploads/osw.zip", b"PK").await;

    let source_url = "https://store.example.com/osw/uploads/osw.zip";
    let response = run(
        &mut harness,
        request(
            "m-1",
            json!({"sourceUrl": source_url, "jobId": "42", "source": "osw", "target": "osm"}),
        ),
    )
    .await;

    assert_eq!(response.message_id, "m-1");
    assert_eq!(response.message_type, REQUEST_TYPE);
    assert_eq!(response.data["status"], "completed");
    assert_eq!(response.data["success"], true);
    assert_eq!(response.data["message"], SUCCESS_MESSAGE);
    assert_eq!(response.data["jobId"], "42");
    assert_eq!(response.data["sourceUrl"], source_url);
    assert_eq!(response.data["source"], "osw");
    assert_eq!(response.data["target"], "osm");
    assert_eq!(
        response.data["formattedUrl"],
        format!("{PUBLIC_BASE}/osw/jobs/42/osm/graph.osm.xml")
    );
    assert!(
        harness
            .uploaded_file(response.data["formattedUrl"].as_str().expect("url"))
            .exists()
    );

    let converted = harness.converter.last_request().expect("converter called");
    assert_eq!(converted.target_format, DataFormat::OsmXml);
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_osm_to_osw_zips_multiple_outputs() {
    let mut harness = Harness::new(Script::Emit(vec!["nodes.geojson", "edges.geojson"])).await;
    harness.put_input("uploads/city.osm.pbf", b"pbf").await;

    let response = run(
        &mut harness,
        request(
            "m-2",
            json!({
                "sourceUrl": "uploads/city.osm.pbf",
                "jobId": "77",
                "source": "osm",
                "target": "osw"
            }),
        ),
    )
    .await;

    assert_eq!(response.data["status"], "completed");
    assert_eq!(
        response.data["formattedUrl"],
        format!("{PUBLIC_BASE}/osw/jobs/77/osw/77.zip")
    );
    let converted = harness.converter.last_request().expect("converter called");
    assert_eq!(converted.source_format, DataFormat::OsmPbf);
    assert_eq!(converted.target_format, DataFormat::GraphArchive);
}

#[tokio::test]
async fn test_same_family_target_is_rejected_before_download() {
    let mut harness = Harness::new(Script::Emit(vec!["never.zip"])).await;
    harness.put_input("uploads/osw.zip", b"PK").await;

    let response = run(
        &mut harness,
        request(
            "m-3",
            json!({"sourceUrl": "uploads/osw.zip", "jobId": "43", "source": "osw", "target": "osw"}),
        ),
    )
    .await;

    assert_eq!(response.data["status"], "failed");
    assert_eq!(response.data["success"], false);
    assert_eq!(response.data["formattedUrl"], "");
    let message = response.data["message"].as_str().expect("message");
    assert!(message.contains("Unsupported file format"), "{message}");
    assert_eq!(harness.store.downloads(), 0);
    assert_eq!(harness.converter.calls(), 0);
}

#[tokio::test]
async fn test_unknown_target_tag_fails() {
    let mut harness = Harness::new(Script::Emit(vec!["never.zip"])).await;

    let response = run(
        &mut harness,
        request(
            "m-4",
            json!({"sourceUrl": "uploads/osw.zip", "jobId": "44", "source": "osw", "target": "shapefile"}),
        ),
    )
    .await;

    assert_eq!(response.data["status"], "failed");
    assert_eq!(response.data["jobId"], "44");
    let message = response.data["message"].as_str().expect("message");
    assert!(message.contains("shapefile"), "{message}");
    assert_eq!(harness.store.downloads(), 0);
}

#[tokio::test]
async fn test_converter_failure_fails_response() {
    let mut harness = Harness::new(Script::Fail("parser exploded")).await;
    harness.put_input("uploads/area.osm", b"<osm/>").await;

    let response = run(
        &mut harness,
        request(
            "m-5",
            json!({"sourceUrl": "uploads/area.osm", "jobId": "45", "source": "osm", "target": "osw"}),
        ),
    )
    .await;

    assert_eq!(response.data["status"], "failed");
    assert_eq!(response.data["formattedUrl"], "");
    let message = response.data["message"].as_str().expect("message");
    assert!(message.contains("parser exploded"), "{message}");
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_malformed_request_is_answered() {
    let mut harness = Harness::new(Script::Emit(vec!["never.zip"])).await;

    let response = run(
        &mut harness,
        request(
            "m-6",
            json!({"sourceUrl": "uploads/osw.zip", "jobId": "46", "source": "osw"}),
        ),
    )
    .await;

    assert_eq!(response.message_id, "m-6");
    assert_eq!(response.data["status"], "failed");
    assert_eq!(response.data["jobId"], "46");
    assert_eq!(response.data["success"], false);
    assert_eq!(harness.converter.calls(), 0);
}
