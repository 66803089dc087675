use std::sync::Arc;

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use http::StatusCode;
use serde_json::{Value, json};

use xgds_domain::content_type::ContentType;
use xgds_relay::domain::types::RELAY_PATH;
use xgds_relay::router::relay_routes;
use xgds_relay::usecase::receive::HandlerRegistry;

use crate::helpers::MockRecordHandler;

fn server() -> (TestServer, Arc<MockRecordHandler>) {
    let handler = Arc::new(MockRecordHandler::new());
    let mut registry = HandlerRegistry::new();
    registry.register(ContentType::new("xgds_notes2", "note"), handler.clone());
    let server = TestServer::new(relay_routes(Arc::new(registry))).unwrap();
    (server, handler)
}

fn relay_form(model: &str, is_update: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("object_id", "13")
        .add_text("content_type_app_label", "xgds_notes2")
        .add_text("content_type_model", model)
        .add_text("url", RELAY_PATH)
        .add_text("serialized_form", r#"{"content": "hello"}"#)
        .add_text("is_update", is_update)
}

#[tokio::test]
async fn should_apply_new_record_with_attachments() {
    let (server, handler) = server();
    let form = relay_form("Note", "False").add_part(
        "image",
        Part::bytes(b"jpeg".to_vec())
            .file_name("a.jpg")
            .mime_type("image/jpeg"),
    );

    let response = server.post(RELAY_PATH).multipart(form).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({"pk": 13, "fields": {"content": "hello"}, "files": ["a.jpg"]})
    );
    assert_eq!(handler.apply_count(), 1);
    let applied = handler.applied.lock().unwrap();
    assert_eq!(applied[0].files[0].file_key, "image");
    assert_eq!(&applied[0].files[0].bytes[..], b"jpeg");
}

#[tokio::test]
async fn should_report_existing_record_for_duplicate_delivery() {
    let (server, handler) = server();

    server
        .post(RELAY_PATH)
        .multipart(relay_form("note", "False"))
        .await
        .assert_status_ok();
    let response = server
        .post(RELAY_PATH)
        .multipart(relay_form("note", "False"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["exists"], "true");
    assert_eq!(body["json"]["pk"], 13);
    assert_eq!(handler.apply_count(), 1);
}

#[tokio::test]
async fn should_reapply_update_of_existing_record() {
    let (server, handler) = server();

    server
        .post(RELAY_PATH)
        .multipart(relay_form("note", "False"))
        .await
        .assert_status_ok();
    let response = server
        .post(RELAY_PATH)
        .multipart(relay_form("note", "True"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.get("exists").is_none());
    assert_eq!(handler.apply_count(), 2);
    assert!(handler.applied.lock().unwrap()[1].is_update);
}

#[tokio::test]
async fn should_reject_unknown_content_type() {
    let (server, handler) = server();

    let response = server
        .post(RELAY_PATH)
        .multipart(relay_form("imageset", "False"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "UNKNOWN_CONTENT_TYPE");
    assert_eq!(handler.apply_count(), 0);
}

#[tokio::test]
async fn should_reject_form_without_object_id() {
    let (server, _) = server();
    let form = MultipartForm::new()
        .add_text("content_type_app_label", "xgds_notes2")
        .add_text("content_type_model", "note")
        .add_text("serialized_form", "{}");

    let response = server.post(RELAY_PATH).multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_RELAY_FORM");
}
