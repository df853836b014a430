//! Cloud Foundry organizations and platforms against a mock API.

mod common;

use common::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use stackit_provider::ProviderError;

const ORGANIZATION: &str = "stackit_scf_organization";
const PLATFORM: &str = "stackit_scf_platform";

fn organizations_path() -> String {
    format!("/v1/projects/{}/regions/eu01/organizations", PROJECT_ID)
}

fn organization(status: &str) -> serde_json::Value {
    json!({
        "guid": ORG_ID,
        "name": "team",
        "platformId": PLATFORM_ID,
        "quotaId": "quota-1",
        "region": "eu01",
        "status": status,
        "suspended": false,
        "createdAt": "2025-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_create_waits_for_created_status() {
    let (server, tester) = setup().await;
    let org_path = format!("{}/{}", organizations_path(), ORG_ID);

    Mock::given(method("POST"))
        .and(path(organizations_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"guid": ORG_ID})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(org_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(organization("creating")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_get(&server, org_path, organization("created")).await;

    let state = tester
        .lifecycle_create(
            ORGANIZATION,
            json!({"project_id": PROJECT_ID, "name": "team"}),
        )
        .await
        .unwrap()
        .expect("organization exists");
    assert_eq!(state["id"], format!("{},eu01,{}", PROJECT_ID, ORG_ID));
    assert_eq!(state["status"], "created");
    assert_eq!(state["platform_id"], PLATFORM_ID);
}

#[tokio::test]
async fn test_create_failure_keeps_created_organization() {
    let (server, tester) = setup().await;
    Mock::given(method("POST"))
        .and(path(organizations_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"guid": ORG_ID})))
        .mount(&server)
        .await;
    mount_get(
        &server,
        format!("{}/{}", organizations_path(), ORG_ID),
        organization("create_failed"),
    )
    .await;

    let err = tester
        .create(
            ORGANIZATION,
            json!({"project_id": PROJECT_ID, "region": "eu01", "name": "team"}),
        )
        .await
        .unwrap_err();
    let ProviderError::Partial { state, source } = err else {
        panic!("expected the created organization to be kept, got {:?}", err);
    };
    assert!(matches!(*source, ProviderError::Wait(_)));
    assert_eq!(state["org_id"], ORG_ID);
    assert_eq!(state["id"], format!("{},eu01,{}", PROJECT_ID, ORG_ID));
}

#[tokio::test]
async fn test_delete_waits_until_gone() {
    let (server, tester) = setup().await;
    let org_path = format!("{}/{}", organizations_path(), ORG_ID);

    Mock::given(method("DELETE"))
        .and(path(org_path.clone()))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(org_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(organization("deleting")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_not_found(&server, org_path).await;

    let state = json!({
        "project_id": PROJECT_ID,
        "region": "eu01",
        "org_id": ORG_ID,
        "name": "team"
    });
    tester.lifecycle_delete(ORGANIZATION, state).await.unwrap();
}

#[tokio::test]
async fn test_platform_data_source() {
    let (server, tester) = setup().await;
    mount_get(
        &server,
        format!("/v1/projects/{}/regions/eu01/platforms/{}", PROJECT_ID, PLATFORM_ID),
        json!({
            "guid": PLATFORM_ID,
            "displayName": "SCF eu01",
            "region": "eu01",
            "systemId": "01.cf.eu01",
            "apiUrl": "https://api.cf.example"
        }),
    )
    .await;

    let state = tester
        .read_data_source(
            PLATFORM,
            json!({"project_id": PROJECT_ID, "platform_id": PLATFORM_ID}),
        )
        .await
        .unwrap();
    assert_eq!(state["id"], format!("{},eu01,{}", PROJECT_ID, PLATFORM_ID));
    assert_eq!(state["api_url"], "https://api.cf.example");
    assert!(state["console_url"].is_null());
}
