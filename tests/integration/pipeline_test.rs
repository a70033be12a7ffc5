//! Pipeline flow: validation-stage messages in, status messages out.

use std::fs::File;
use std::time::Duration;

use serde_json::{Value, json};

use osw_core::QueueMessage;
use osw_core::types::DataFormat;
use osw_entity::message::pipeline::MISSING_FILE_PATH;
use osw_worker::JobHandler;
use osw_worker::jobs::PipelineJobHandler;
use osw_worker::jobs::pipeline::{
    CONVERTER_FAILURE_MESSAGE, GENERIC_FAILURE_MESSAGE, SUCCESS_MESSAGE,
};

use crate::helpers::{Harness, Options, PUBLIC_BASE, RESULT_TYPE, Script};

fn validation_message(record: &str, data: Value) -> QueueMessage {
    QueueMessage::new(record, "osw-validation", data)
}

async fn run(harness: &mut Harness, envelope: QueueMessage) -> QueueMessage {
    PipelineJobHandler::new(harness.runner.clone())
        .handle(envelope)
        .await;
    harness.next_result().await
}

#[tokio::test]
async fn test_archive_is_formatted_and_reported() {
    let mut harness = Harness::new(Script::Emit(vec!["graph.osm.xml"])).await;
    harness.put_input("test upload/osw.zip", b"PK archive").await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-1",
            json!({
                "file_upload_path": "https://store.example.com/osw/test%20upload/osw.zip",
                "tdei_project_group_id": "pg-1",
                "success": true,
                "message": "Validation passed",
                "user_id": "u-9"
            }),
        ),
    )
    .await;

    assert_eq!(result.message_id, "rec-1");
    assert_eq!(result.message_type, RESULT_TYPE);
    assert_eq!(result.data["success"], true);
    assert_eq!(result.data["message"], SUCCESS_MESSAGE);
    assert_eq!(result.data["user_id"], "u-9");
    assert_eq!(result.data["tdei_project_group_id"], "pg-1");

    let url = result.data["formatted_url"].as_str().expect("formatted_url");
    assert!(url.starts_with(&format!("{PUBLIC_BASE}/osw/")));
    assert!(url.contains("/pg-1/rec-1/graph.osm_"), "{url}");
    assert!(url.ends_with(".xml"), "{url}");
    let uploaded = harness.uploaded_file(url);
    assert_eq!(
        std::fs::read_to_string(uploaded).expect("uploaded file"),
        "converted graph.osm.xml"
    );

    let request = harness.converter.last_request().expect("converter called");
    assert_eq!(request.source_format, DataFormat::GraphArchive);
    assert_eq!(request.target_format, DataFormat::OsmXml);
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_multiple_outputs_are_zipped() {
    let mut harness =
        Harness::new(Script::Emit(vec!["nodes.geojson", "edges.geojson", "points.geojson"]))
            .await;
    harness.put_input("2024/region.osm.pbf", b"pbf").await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-2",
            json!({
                "file_upload_path": "2024/region.osm.pbf",
                "tdei_project_group_id": "pg-2"
            }),
        ),
    )
    .await;

    assert_eq!(result.data["success"], true);
    let url = result.data["formatted_url"].as_str().expect("formatted_url");
    assert!(url.contains("/pg-2/rec-2/rec-2_"), "{url}");
    assert!(url.ends_with(".zip"), "{url}");

    let archive = zip::ZipArchive::new(File::open(harness.uploaded_file(url)).expect("open"))
        .expect("valid zip");
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, ["edges.geojson", "nodes.geojson", "points.geojson"]);

    let request = harness.converter.last_request().expect("converter called");
    assert_eq!(request.source_format, DataFormat::OsmPbf);
    assert_eq!(request.target_format, DataFormat::GraphArchive);
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_converter_failure_is_reported() {
    let mut harness = Harness::new(Script::Fail("invalid topology")).await;
    harness.put_input("up/osw.zip", b"PK").await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-3",
            json!({"file_upload_path": "up/osw.zip", "tdei_project_group_id": "pg"}),
        ),
    )
    .await;

    assert_eq!(result.data["success"], false);
    let message = result.data["message"].as_str().expect("message");
    assert!(message.starts_with(&format!("{CONVERTER_FAILURE_MESSAGE}: ")), "{message}");
    assert!(message.contains("invalid topology"), "{message}");
    assert!(result.data.get("formatted_url").is_none());
    assert_eq!(harness.store.uploads(), 0);
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_success_without_output_is_reported() {
    let mut harness = Harness::new(Script::Emit(vec![])).await;
    harness.put_input("up/osw.zip", b"PK").await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-empty",
            json!({"file_upload_path": "up/osw.zip", "tdei_project_group_id": "pg"}),
        ),
    )
    .await;

    assert_eq!(result.data["success"], false);
    let message = result.data["message"].as_str().expect("message");
    assert!(message.starts_with(GENERIC_FAILURE_MESSAGE), "{message}");
    assert!(message.contains("Packaging failed"), "{message}");
    assert_eq!(harness.converter.calls(), 1);
    assert_eq!(harness.store.uploads(), 0);
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_converter_timeout_is_reported() {
    let mut harness = Harness::with_options(
        Script::Sleep(Duration::from_secs(30)),
        Options {
            timeout: Duration::from_millis(100),
            ..Options::default()
        },
    )
    .await;
    harness.put_input("up/region.osm", b"<osm/>").await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-4",
            json!({"file_upload_path": "up/region.osm", "tdei_project_group_id": "pg"}),
        ),
    )
    .await;

    assert_eq!(result.data["success"], false);
    let message = result.data["message"].as_str().expect("message");
    assert!(message.starts_with(CONVERTER_FAILURE_MESSAGE), "{message}");
    assert!(message.contains("timed out"), "{message}");
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_unsupported_extension_touches_nothing() {
    let mut harness = Harness::new(Script::Emit(vec!["never.xml"])).await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-5",
            json!({"file_upload_path": "up/input.unknown", "tdei_project_group_id": "pg"}),
        ),
    )
    .await;

    assert_eq!(result.data["success"], false);
    let message = result.data["message"].as_str().expect("message");
    assert!(message.starts_with(GENERIC_FAILURE_MESSAGE), "{message}");
    assert!(message.contains("Unsupported file format"), "{message}");
    assert_eq!(harness.store.downloads(), 0);
    assert_eq!(harness.converter.calls(), 0);
}

#[tokio::test]
async fn test_missing_file_path_still_reports() {
    let mut harness = Harness::new(Script::Emit(vec!["never.xml"])).await;

    let result = run(
        &mut harness,
        validation_message("rec-6", json!({"tdei_project_group_id": "pg", "user_id": "u"})),
    )
    .await;

    assert_eq!(result.message_id, "rec-6");
    assert_eq!(result.data["success"], false);
    assert_eq!(
        result.data["message"],
        format!("{GENERIC_FAILURE_MESSAGE} {MISSING_FILE_PATH}")
    );
    assert_eq!(result.data["user_id"], "u");
    assert_eq!(harness.converter.calls(), 0);
}

#[tokio::test]
async fn test_missing_input_object_fails_acquisition() {
    let mut harness = Harness::new(Script::Emit(vec!["never.xml"])).await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-7",
            json!({"file_upload_path": "https://store/osw/gone/osw.zip", "tdei_project_group_id": "pg"}),
        ),
    )
    .await;

    assert_eq!(result.data["success"], false);
    let message = result.data["message"].as_str().expect("message");
    assert!(message.contains("Failed to acquire"), "{message}");
    assert_eq!(harness.store.downloads(), 1);
    assert_eq!(harness.converter.calls(), 0);
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_upload_failure_fails_the_job() {
    let mut harness = Harness::with_options(
        Script::Emit(vec!["graph.osm.xml"]),
        Options {
            fail_uploads: true,
            ..Options::default()
        },
    )
    .await;
    harness.put_input("up/osw.zip", b"PK").await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-8",
            json!({"file_upload_path": "up/osw.zip", "tdei_project_group_id": "pg"}),
        ),
    )
    .await;

    assert_eq!(result.data["success"], false);
    let message = result.data["message"].as_str().expect("message");
    assert!(message.starts_with(GENERIC_FAILURE_MESSAGE), "{message}");
    assert!(message.contains("Upload failed"), "{message}");
    assert!(result.data.get("formatted_url").is_none());
    assert_eq!(harness.leftover_workspaces().await, 0);
}

#[tokio::test]
async fn test_traversal_locator_is_rejected() {
    let mut harness = Harness::new(Script::Emit(vec!["never.xml"])).await;

    let result = run(
        &mut harness,
        validation_message(
            "rec-9",
            json!({"file_upload_path": "up/%2E%2E/%2E%2E/secret.zip", "tdei_project_group_id": "pg"}),
        ),
    )
    .await;

    assert_eq!(result.data["success"], false);
    assert_eq!(harness.store.downloads(), 0);
}
