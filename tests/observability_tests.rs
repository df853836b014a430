//! Observability resources against a mock API.

mod common;

use common::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use stackit_provider::services::observability::alertconfig::mock_payload;
use stackit_provider::testing::{assert_error_at, assert_plan, PlanShape};
use stackit_provider::ProviderError;

const INSTANCE: &str = "stackit_observability_instance";
const CREDENTIAL: &str = "stackit_observability_credential";

fn prior_state() -> serde_json::Value {
    json!({
        "id": format!("{},{}", PROJECT_ID, INSTANCE_ID),
        "project_id": PROJECT_ID,
        "instance_id": INSTANCE_ID,
        "name": "monitoring",
        "plan_name": "Observability-Monitoring-Medium-EU01",
        "plan_id": "plan-medium",
        "grafana_initial_admin_password": "initial-secret",
        "metrics_retention_days": 90,
        "metrics_retention_days_5m_downsampling": 90,
        "metrics_retention_days_1h_downsampling": 90,
        "logs_retention_days": 30,
        "traces_retention_days": 7
    })
}

#[tokio::test]
async fn test_create_waits_and_reads_back() {
    let (server, tester) = setup().await;
    mount_observability_settings(&server, json!({"data": mock_payload()})).await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{}/instances", PROJECT_ID)))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({"name": "monitoring", "planId": "plan-medium"})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"instanceId": INSTANCE_ID})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(observability_instance_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(observability_instance("CREATING")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let mut created = observability_instance("CREATE_SUCCEEDED");
    created["instance"]["grafanaAdminPassword"] = json!("initial-secret");
    Mock::given(method("GET"))
        .and(path(observability_instance_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(created))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(
        &server,
        observability_instance_path(),
        observability_instance("CREATE_SUCCEEDED"),
    )
    .await;

    let state = tester
        .lifecycle_create(
            INSTANCE,
            json!({
                "project_id": PROJECT_ID,
                "name": "monitoring",
                "plan_name": "Observability-Monitoring-Medium-EU01"
            }),
        )
        .await
        .unwrap()
        .expect("instance exists");

    assert_eq!(state["id"], format!("{},{}", PROJECT_ID, INSTANCE_ID));
    assert_eq!(state["plan_id"], "plan-medium");
    assert_eq!(state["grafana_url"], "https://grafana.example");
    assert_eq!(state["metrics_retention_days"], 90);
    assert_eq!(state["logs_retention_days"], 30);
    assert_eq!(state["traces_retention_days"], 7);
    // The placeholder alert configuration reads as unset.
    assert!(state["alert_config"].is_null());
}

#[tokio::test]
async fn test_update_skips_unchanged_instance_payload() {
    let (server, tester) = setup().await;
    mount_observability_settings(&server, json!({"data": mock_payload()})).await;
    mount_get(
        &server,
        observability_instance_path(),
        observability_instance("CREATE_SUCCEEDED"),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path(observability_instance_path()))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/acl", observability_instance_path())))
        .and(body_json(json!({"acl": ["193.148.160.0/19"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let prior = prior_state();
    let mut planned = prior.clone();
    planned["acl"] = json!(["193.148.160.0/19"]);

    let state = tester.update(INSTANCE, prior, planned).await.unwrap();
    assert_eq!(state["grafana_initial_admin_password"], "initial-secret");
}

#[tokio::test]
async fn test_failed_settings_keep_created_instance() {
    let (server, tester) = setup().await;
    mount_get(&server, format!("/v1/projects/{}/plans", PROJECT_ID), observability_plans()).await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{}/instances", PROJECT_ID)))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"instanceId": INSTANCE_ID})))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(
        &server,
        observability_instance_path(),
        observability_instance("CREATE_SUCCEEDED"),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/acl", observability_instance_path())))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = tester
        .create(
            INSTANCE,
            json!({
                "project_id": PROJECT_ID,
                "name": "monitoring",
                "plan_name": "Observability-Monitoring-Medium-EU01",
                "acl": ["10.0.0.0/8"]
            }),
        )
        .await
        .unwrap_err();

    let state = err.partial_state().expect("created instance is kept").clone();
    assert_eq!(state["instance_id"], INSTANCE_ID);
    assert_eq!(state["id"], format!("{},{}", PROJECT_ID, INSTANCE_ID));
    assert_eq!(state["plan_id"], "plan-medium");
    let ProviderError::Partial { source, .. } = err else {
        unreachable!()
    };
    assert!(matches!(*source, ProviderError::Api { .. }));
}

#[tokio::test]
async fn test_reordered_acl_is_not_a_change() {
    let (server, tester) = setup().await;
    mount_observability_settings(&server, json!({"data": mock_payload()})).await;
    mount_get(
        &server,
        observability_instance_path(),
        observability_instance("CREATE_SUCCEEDED"),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/acl", observability_instance_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut prior = prior_state();
    prior["acl"] = json!(["192.168.0.0/16", "10.0.0.0/8"]);
    let mut config = prior.clone();
    config["acl"] = json!(["10.0.0.0/8", "192.168.0.0/16"]);

    let plan = tester.plan_update(INSTANCE, prior.clone(), config).await.unwrap();
    assert_plan(&plan, PlanShape::NoChanges, &[]);

    tester.update(INSTANCE, prior, plan.planned_state).await.unwrap();
}

#[tokio::test]
async fn test_plan_rejects_malformed_acl_entry() {
    let (_server, tester) = setup().await;
    let err = tester
        .plan_create(
            INSTANCE,
            json!({
                "project_id": PROJECT_ID,
                "name": "monitoring",
                "plan_name": "Observability-Monitoring-Medium-EU01",
                "acl": ["10.0.0.0/8", "10.0.0.300/8"]
            }),
        )
        .await
        .unwrap_err();
    assert_error_at(&err.into_diagnostics(), "acl.1");
}

#[tokio::test]
async fn test_read_drops_missing_instance() {
    let (server, tester) = setup().await;
    mount_not_found(&server, observability_instance_path()).await;

    let state = tester.read(INSTANCE, prior_state()).await.unwrap();
    assert!(state.is_none());
}

#[tokio::test]
async fn test_read_drops_deleted_instance() {
    let (server, tester) = setup().await;
    mount_get(
        &server,
        observability_instance_path(),
        observability_instance("DELETE_SUCCEEDED"),
    )
    .await;

    assert!(tester.read(INSTANCE, prior_state()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_read_fails_on_unknown_plan() {
    let (server, tester) = setup().await;
    mount_observability_settings(&server, json!({"data": mock_payload()})).await;
    let mut instance = observability_instance("CREATE_SUCCEEDED");
    instance["planId"] = json!("plan-retired");
    mount_get(&server, observability_instance_path(), instance).await;

    let err = tester.read(INSTANCE, prior_state()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Mapping(_)));
}

#[tokio::test]
async fn test_import_then_read() {
    let (server, tester) = setup().await;
    mount_observability_settings(&server, json!({})).await;
    mount_get(
        &server,
        observability_instance_path(),
        observability_instance("CREATE_SUCCEEDED"),
    )
    .await;

    let state = tester
        .lifecycle_import(INSTANCE, &format!("{},{}", PROJECT_ID, INSTANCE_ID))
        .await
        .unwrap()
        .expect("instance exists");
    assert_eq!(state["plan_name"], "Observability-Monitoring-Medium-EU01");
    assert!(state["grafana_initial_admin_password"].is_null());

    let err = tester.import_resource(INSTANCE, PROJECT_ID).await.unwrap_err();
    assert!(matches!(err, ProviderError::ImportId { .. }));
}

#[tokio::test]
async fn test_plan_rejects_unsupported_settings() {
    let (server, tester) = setup().await;
    mount_get(
        &server,
        format!("/v1/projects/{}/plans", PROJECT_ID),
        observability_plans(),
    )
    .await;

    let err = tester
        .plan_create(
            INSTANCE,
            json!({
                "project_id": PROJECT_ID,
                "name": "metrics",
                "plan_name": "Observability-Metrics-Basic-EU01",
                "logs_retention_days": 30
            }),
        )
        .await
        .unwrap_err();
    assert_error_at(&err.into_diagnostics(), "logs_retention_days");
}

#[tokio::test]
async fn test_plan_rejects_unknown_plan_name() {
    let (server, tester) = setup().await;
    mount_get(
        &server,
        format!("/v1/projects/{}/plans", PROJECT_ID),
        observability_plans(),
    )
    .await;

    let err = tester
        .plan_create(
            INSTANCE,
            json!({"project_id": PROJECT_ID, "name": "x", "plan_name": "Nope"}),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("plan_name"));
}

#[tokio::test]
async fn test_clearing_alert_config_writes_placeholder() {
    let (server, tester) = setup().await;
    mount_observability_settings(&server, json!({"data": mock_payload()})).await;
    mount_get(
        &server,
        observability_instance_path(),
        observability_instance("CREATE_SUCCEEDED"),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/alertconfigs", observability_instance_path())))
        .and(body_json(serde_json::to_value(mock_payload()).unwrap()))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut prior = prior_state();
    prior["alert_config"] = json!({
        "receivers": [{"name": "team", "email_configs": [{"to": "team@example.com"}]}],
        "route": {"receiver": "team"}
    });
    let mut planned = prior.clone();
    planned["alert_config"] = json!(null);

    let state = tester.update(INSTANCE, prior, planned).await.unwrap();
    assert!(state["alert_config"].is_null());
}

#[tokio::test]
async fn test_credential_lifecycle() {
    let (server, tester) = setup().await;
    let credentials = format!("{}/credentials", observability_instance_path());

    Mock::given(method("POST"))
        .and(path(credentials.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "credentials": {"username": "u-123", "password": "p-456"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(
        &server,
        format!("{}/u-123", credentials),
        json!({"id": "u-123", "name": "u-123", "credentialsInfo": {"username": "u-123"}}),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/u-123", credentials)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let state = tester
        .lifecycle_create(
            CREDENTIAL,
            json!({"project_id": PROJECT_ID, "instance_id": INSTANCE_ID}),
        )
        .await
        .unwrap()
        .expect("credential exists");
    assert_eq!(state["username"], "u-123");
    assert_eq!(state["password"], "p-456");

    // A credential already gone counts as deleted.
    tester.lifecycle_delete(CREDENTIAL, state).await.unwrap();
}
