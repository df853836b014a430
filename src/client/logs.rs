//! Logs API: regional log-service instances.

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

/// Instance status once provisioning or an update finished.
pub const STATUS_ACTIVE: &str = "active";
/// Instance status while a change is being applied.
pub const STATUS_RECONCILING: &str = "reconciling";
/// Instance status while deletion is running.
pub const STATUS_DELETING: &str = "deleting";

/// Body of the create and update instance calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePayload {
    pub display_name: String,
    pub retention_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub acl: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsInstance {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub retention_days: Option<i64>,
    pub acl: Vec<String>,
    pub status: String,
    pub created: Option<String>,
    pub datasource_url: Option<String>,
    pub ingest_url: Option<String>,
    pub ingest_otlp_url: Option<String>,
    pub query_url: Option<String>,
    pub query_range_url: Option<String>,
}

/// Client for the Logs API.
#[derive(Debug, Clone)]
pub struct LogsClient {
    api: ApiClient,
}

impl LogsClient {
    /// Wrap an authenticated API client.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn instances_path(project_id: &str, region: &str) -> String {
        format!("/v1beta/projects/{}/regions/{}/instances", project_id, region)
    }

    fn instance_path(project_id: &str, region: &str, instance_id: &str) -> String {
        format!("{}/{}", Self::instances_path(project_id, region), instance_id)
    }

    pub async fn create_instance(
        &self,
        project_id: &str,
        region: &str,
        payload: &InstancePayload,
    ) -> Result<LogsInstance> {
        self.api
            .post(
                "creating logs instance",
                &Self::instances_path(project_id, region),
                payload,
            )
            .await
    }

    pub async fn get_instance(
        &self,
        project_id: &str,
        region: &str,
        instance_id: &str,
    ) -> Result<LogsInstance> {
        self.api
            .get(
                "reading logs instance",
                &Self::instance_path(project_id, region, instance_id),
            )
            .await
    }

    pub async fn update_instance(
        &self,
        project_id: &str,
        region: &str,
        instance_id: &str,
        payload: &InstancePayload,
    ) -> Result<()> {
        self.api
            .put_discard(
                "updating logs instance",
                &Self::instance_path(project_id, region, instance_id),
                payload,
            )
            .await
    }

    pub async fn delete_instance(&self, project_id: &str, region: &str, instance_id: &str) -> Result<()> {
        self.api
            .delete(
                "deleting logs instance",
                &Self::instance_path(project_id, region, instance_id),
            )
            .await
    }
}
