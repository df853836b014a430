//! Logs instances against a mock API.

mod common;

use common::*;
use serde_json::json;
use stackit_provider::ProviderError;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const INSTANCE: &str = "stackit_logs_instance";

fn instances_path() -> String {
    format!("/v1beta/projects/{}/regions/eu01/instances", PROJECT_ID)
}

fn instance_path() -> String {
    format!("{}/{}", instances_path(), INSTANCE_ID)
}

fn instance(status: &str, retention_days: i64) -> serde_json::Value {
    json!({
        "id": INSTANCE_ID,
        "displayName": "audit",
        "description": "audit trail",
        "retentionDays": retention_days,
        "acl": ["10.0.0.0/8"],
        "status": status,
        "created": "2026-01-05T10:00:00Z",
        "datasourceUrl": "https://grafana.example/ds",
        "ingestUrl": "https://ingest.example",
        "ingestOtlpUrl": "https://otlp.example",
        "queryUrl": "https://query.example",
        "queryRangeUrl": "https://query.example/range"
    })
}

fn state() -> serde_json::Value {
    json!({
        "id": format!("{},eu01,{}", PROJECT_ID, INSTANCE_ID),
        "project_id": PROJECT_ID,
        "region": "eu01",
        "instance_id": INSTANCE_ID,
        "display_name": "audit",
        "description": "audit trail",
        "retention_days": 30,
        "acl": ["10.0.0.0/8"]
    })
}

#[tokio::test]
async fn test_create_waits_for_active() {
    let (server, tester) = setup().await;
    Mock::given(method("POST"))
        .and(path(instances_path()))
        .and(body_json(json!({
            "displayName": "audit",
            "retentionDays": 30,
            "description": "audit trail",
            "acl": ["10.0.0.0/8"]
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(instance("reconciling", 30)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(instance("reconciling", 30)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, instance_path(), instance("active", 30)).await;

    let created = tester
        .lifecycle_create(
            INSTANCE,
            json!({
                "project_id": PROJECT_ID,
                "display_name": "audit",
                "description": "audit trail",
                "retention_days": 30,
                "acl": ["10.0.0.0/8"]
            }),
        )
        .await
        .unwrap()
        .expect("instance exists");

    assert_eq!(created["id"], format!("{},eu01,{}", PROJECT_ID, INSTANCE_ID));
    assert_eq!(created["region"], "eu01");
    assert_eq!(created["status"], "active");
    assert_eq!(created["ingest_otlp_url"], "https://otlp.example");
}

#[tokio::test]
async fn test_create_failure_keeps_created_instance() {
    let (server, tester) = setup().await;
    Mock::given(method("POST"))
        .and(path(instances_path()))
        .respond_with(ResponseTemplate::new(202).set_body_json(instance("reconciling", 30)))
        .mount(&server)
        .await;
    mount_get(&server, instance_path(), instance("failed", 30)).await;

    let mut planned = state();
    planned.as_object_mut().unwrap().remove("id");
    planned.as_object_mut().unwrap().remove("instance_id");
    let err = tester.create(INSTANCE, planned).await.unwrap_err();

    let ProviderError::Partial { state, source } = err else {
        panic!("expected the created instance to be kept, got {err:?}");
    };
    assert!(matches!(*source, ProviderError::Wait(_)));
    assert_eq!(state["instance_id"], INSTANCE_ID);
    assert_eq!(state["id"], format!("{},eu01,{}", PROJECT_ID, INSTANCE_ID));
}

#[tokio::test]
async fn test_import_by_regional_id_then_read() {
    let (server, tester) = setup().await;
    mount_get(&server, instance_path(), instance("active", 30)).await;

    let imported = tester
        .lifecycle_import(INSTANCE, &format!("{},eu01,{}", PROJECT_ID, INSTANCE_ID))
        .await
        .unwrap()
        .expect("instance exists");
    assert_eq!(imported["display_name"], "audit");
    assert_eq!(imported["retention_days"], 30);
    assert_eq!(imported["acl"], json!(["10.0.0.0/8"]));

    let err = tester
        .import_resource(INSTANCE, &format!("{},{}", PROJECT_ID, INSTANCE_ID))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("[project_id],[region],[instance_id]"));
}

#[tokio::test]
async fn test_read_drops_missing_instance() {
    let (server, tester) = setup().await;
    mount_not_found(&server, instance_path()).await;

    assert!(tester.read(INSTANCE, state()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_skips_unchanged_payload() {
    let (server, tester) = setup().await;
    mount_get(&server, instance_path(), instance("active", 30)).await;
    Mock::given(method("PUT"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let updated = tester.update(INSTANCE, state(), state()).await.unwrap();
    assert_eq!(updated["status"], "active");
}

#[tokio::test]
async fn test_update_changes_retention() {
    let (server, tester) = setup().await;
    Mock::given(method("PUT"))
        .and(path(instance_path()))
        .and(body_json(json!({
            "displayName": "audit",
            "retentionDays": 90,
            "description": "audit trail",
            "acl": ["10.0.0.0/8"]
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, instance_path(), instance("active", 90)).await;

    let mut planned = state();
    planned["retention_days"] = json!(90);
    let updated = tester.update(INSTANCE, state(), planned).await.unwrap();
    assert_eq!(updated["retention_days"], 90);
}

#[tokio::test]
async fn test_delete_waits_for_removal() {
    let (server, tester) = setup().await;
    Mock::given(method("DELETE"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(instance("deleting", 30)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_not_found(&server, instance_path()).await;

    tester.lifecycle_delete(INSTANCE, state()).await.unwrap();
}

#[tokio::test]
async fn test_data_source_reads_instance() {
    let (server, tester) = setup().await;
    mount_get(&server, instance_path(), instance("active", 30)).await;

    let read = tester
        .read_data_source(
            INSTANCE,
            json!({"project_id": PROJECT_ID, "instance_id": INSTANCE_ID}),
        )
        .await
        .unwrap();
    assert_eq!(read["region"], "eu01");
    assert_eq!(read["query_url"], "https://query.example");
}
