//! LogMe API: instances, offerings and credentials.

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

/// `lastOperation.type` of a deletion.
pub const OPERATION_DELETE: &str = "delete";
/// `lastOperation.state` while an operation runs.
pub const STATE_IN_PROGRESS: &str = "in progress";
/// `lastOperation.state` of a finished operation.
pub const STATE_SUCCEEDED: &str = "succeeded";
/// `lastOperation.state` of a failed operation.
pub const STATE_FAILED: &str = "failed";

/// Instance parameters as sent to and returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InstanceParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sgw_acl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_monitoring: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_disk_threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_frequency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syslog: Option<Vec<String>>,
}

impl InstanceParameters {
    /// Whether no parameter is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstancePayload {
    pub instance_name: String,
    pub plan_id: String,
    pub parameters: InstanceParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialUpdateInstancePayload {
    pub plan_id: String,
    pub parameters: InstanceParameters,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceResponse {
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LastOperation {
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub instance_id: String,
    pub name: String,
    pub plan_id: String,
    pub cf_guid: Option<String>,
    pub cf_space_guid: Option<String>,
    pub cf_organization_guid: Option<String>,
    pub dashboard_url: Option<String>,
    pub image_url: Option<String>,
    pub parameters: Option<InstanceParameters>,
    pub last_operation: LastOperation,
}

impl Instance {
    /// Whether the last operation was a finished deletion.
    pub fn is_deleted(&self) -> bool {
        self.last_operation.kind == OPERATION_DELETE && self.last_operation.state == STATE_SUCCEEDED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OfferingPlan {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Offering {
    pub name: String,
    pub version: String,
    pub plans: Vec<OfferingPlan>,
}

#[derive(Debug, Deserialize)]
struct OfferingsResponse {
    #[serde(default)]
    offerings: Vec<Offering>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawCredentials {
    pub host: String,
    pub port: Option<i64>,
    pub username: String,
    pub password: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsEnvelope {
    pub credentials: RawCredentials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsResponse {
    pub id: String,
    pub raw: Option<CredentialsEnvelope>,
    pub uri: Option<String>,
}

/// Client for the LogMe API.
#[derive(Debug, Clone)]
pub struct LogMeClient {
    api: ApiClient,
}

impl LogMeClient {
    /// Wrap an authenticated API client.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn instance_path(project_id: &str, instance_id: &str) -> String {
        format!("/v1/projects/{}/instances/{}", project_id, instance_id)
    }

    pub async fn list_offerings(&self, project_id: &str) -> Result<Vec<Offering>> {
        let path = format!("/v1/projects/{}/offerings", project_id);
        let response: OfferingsResponse = self.api.get("listing offerings", &path).await?;
        Ok(response.offerings)
    }

    pub async fn create_instance(
        &self,
        project_id: &str,
        payload: &CreateInstancePayload,
    ) -> Result<CreateInstanceResponse> {
        let path = format!("/v1/projects/{}/instances", project_id);
        self.api.post("creating instance", &path, payload).await
    }

    pub async fn get_instance(&self, project_id: &str, instance_id: &str) -> Result<Instance> {
        self.api
            .get("reading instance", &Self::instance_path(project_id, instance_id))
            .await
    }

    pub async fn partial_update_instance(
        &self,
        project_id: &str,
        instance_id: &str,
        payload: &PartialUpdateInstancePayload,
    ) -> Result<()> {
        self.api
            .patch(
                "updating instance",
                &Self::instance_path(project_id, instance_id),
                payload,
            )
            .await
    }

    pub async fn delete_instance(&self, project_id: &str, instance_id: &str) -> Result<()> {
        self.api
            .delete("deleting instance", &Self::instance_path(project_id, instance_id))
            .await
    }

    pub async fn create_credentials(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<CredentialsResponse> {
        let path = format!("{}/credentials", Self::instance_path(project_id, instance_id));
        self.api
            .post("creating credentials", &path, &serde_json::json!({}))
            .await
    }

    pub async fn get_credentials(
        &self,
        project_id: &str,
        instance_id: &str,
        credential_id: &str,
    ) -> Result<CredentialsResponse> {
        let path = format!(
            "{}/credentials/{}",
            Self::instance_path(project_id, instance_id),
            credential_id
        );
        self.api.get("reading credentials", &path).await
    }

    pub async fn delete_credentials(
        &self,
        project_id: &str,
        instance_id: &str,
        credential_id: &str,
    ) -> Result<()> {
        let path = format!(
            "{}/credentials/{}",
            Self::instance_path(project_id, instance_id),
            credential_id
        );
        self.api.delete("deleting credentials", &path).await
    }
}
