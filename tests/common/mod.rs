//! Shared fixtures for the mock-server integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stackit_provider::testing::{mock_config, ProviderTester};
use stackit_provider::StackitProvider;

pub const PROJECT_ID: &str = "5c6b2a1e-2a0b-4a43-9c58-3a4d6a2f8f11";
pub const INSTANCE_ID: &str = "0b7e1d36-4c1f-4f5e-9a3d-6d0f3d0c8a21";
pub const SERVER_ID: &str = "9e2d4b8a-7f61-4c3e-8d25-1a6b0c9e4f72";
pub const PLATFORM_ID: &str = "3f8a6c1d-2b94-4e7a-b05c-8d1e7f2a6b39";
pub const ORG_ID: &str = "7a1c5e9b-3d82-4f60-a4b7-2c9e1d8f5a03";

/// A configured provider whose APIs all live on a fresh mock server.
pub async fn setup() -> (MockServer, ProviderTester<StackitProvider>) {
    setup_with(|_| {}).await
}

/// Like [`setup`], with a hook to adjust the provider block.
pub async fn setup_with(adjust: impl FnOnce(&mut Value)) -> (MockServer, ProviderTester<StackitProvider>) {
    let server = MockServer::start().await;
    let mut config = mock_config(&server.uri());
    adjust(&mut config);
    let tester = ProviderTester::new(StackitProvider::new());
    tester.configure(config).await.unwrap();
    (server, tester)
}

/// Mount a `GET` answering `body` with 200.
pub async fn mount_get(server: &MockServer, route: String, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a `GET` answering 404.
pub async fn mount_not_found(server: &MockServer, route: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
        .mount(server)
        .await;
}

pub fn observability_instance_path() -> String {
    format!("/v1/projects/{}/instances/{}", PROJECT_ID, INSTANCE_ID)
}

pub fn observability_plans() -> Value {
    json!({
        "plans": [
            {
                "planId": "plan-medium",
                "name": "Observability-Monitoring-Medium-EU01",
                "alertRules": 1000,
                "alertReceivers": 10,
                "totalMetricSamples": 500000,
                "logsStorage": 100,
                "tracesStorage": 100
            },
            {
                "planId": "plan-metrics",
                "name": "Observability-Metrics-Basic-EU01",
                "alertRules": 0,
                "alertReceivers": 0,
                "totalMetricSamples": 100000,
                "logsStorage": 0,
                "tracesStorage": 0
            }
        ]
    })
}

pub fn observability_instance(status: &str) -> Value {
    json!({
        "id": INSTANCE_ID,
        "name": "monitoring",
        "planId": "plan-medium",
        "planName": "Observability-Monitoring-Medium-EU01",
        "status": status,
        "isUpdatable": true,
        "dashboardUrl": "https://portal.example/dashboard",
        "instance": {
            "grafanaUrl": "https://grafana.example",
            "grafanaPublicReadAccess": false,
            "grafanaAdminUser": "admin",
            "metricsUrl": "https://metrics.example",
            "pushMetricsUrl": "https://metrics.example/push",
            "logsUrl": "https://logs.example",
            "logsPushUrl": "https://logs.example/push"
        }
    })
}

/// Mount the settings endpoints read while refreshing an observability instance.
pub async fn mount_observability_settings(server: &MockServer, alert_config: Value) {
    let base = observability_instance_path();
    mount_get(server, format!("/v1/projects/{}/plans", PROJECT_ID), observability_plans()).await;
    mount_get(server, format!("{}/acl", base), json!({"acl": []})).await;
    mount_get(
        server,
        format!("{}/metrics-storage-retentions", base),
        json!({
            "metricsRetentionTimeRaw": "90d",
            "metricsRetentionTime5m": "90d",
            "metricsRetentionTime1h": "90d"
        }),
    )
    .await;
    mount_get(server, format!("{}/logs-configs", base), json!({"config": {"retention": "720h"}})).await;
    mount_get(server, format!("{}/traces-configs", base), json!({"config": {"retention": "168h"}})).await;
    mount_get(server, format!("{}/alertconfigs", base), alert_config).await;
}
