//! Observability API: instances, plans, credentials and alerting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

/// Instance status reported while creation is running.
pub const STATUS_CREATING: &str = "CREATING";
/// Instance status once creation finished.
pub const STATUS_CREATE_SUCCEEDED: &str = "CREATE_SUCCEEDED";
/// Instance status when creation failed.
pub const STATUS_CREATE_FAILED: &str = "CREATE_FAILED";
/// Instance status once an update finished.
pub const STATUS_UPDATE_SUCCEEDED: &str = "UPDATE_SUCCEEDED";
/// Instance status when an update failed.
pub const STATUS_UPDATE_FAILED: &str = "UPDATE_FAILED";
/// Instance status once deletion finished.
pub const STATUS_DELETE_SUCCEEDED: &str = "DELETE_SUCCEEDED";
/// Instance status when deletion failed.
pub const STATUS_DELETE_FAILED: &str = "DELETE_FAILED";

/// A service plan and its capacity limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plan {
    pub plan_id: String,
    pub name: String,
    pub alert_rules: i64,
    pub alert_receivers: i64,
    pub total_metric_samples: i64,
    pub logs_storage: i64,
    pub traces_storage: i64,
}

#[derive(Debug, Deserialize)]
struct PlansResponse {
    #[serde(default)]
    plans: Vec<Plan>,
}

/// Body of the create-instance call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstancePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<BTreeMap<String, String>>,
}

/// Body of the update-instance call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstancePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceResponse {
    pub instance_id: String,
}

/// Endpoints and retention settings of a running instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceDetails {
    pub grafana_url: Option<String>,
    pub grafana_public_read_access: Option<bool>,
    pub grafana_admin_user: Option<String>,
    pub grafana_admin_password: Option<String>,
    pub metrics_url: Option<String>,
    pub push_metrics_url: Option<String>,
    pub targets_url: Option<String>,
    pub alerting_url: Option<String>,
    pub logs_url: Option<String>,
    pub logs_push_url: Option<String>,
    pub jaeger_traces_url: Option<String>,
    pub jaeger_ui_url: Option<String>,
    pub otlp_traces_url: Option<String>,
    pub zipkin_spans_url: Option<String>,
    pub metrics_retention_time_raw: Option<String>,
    pub metrics_retention_time_5m: Option<String>,
    pub metrics_retention_time_1h: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetInstanceResponse {
    pub id: String,
    pub name: Option<String>,
    pub plan_id: String,
    pub plan_name: String,
    pub status: String,
    pub is_updatable: Option<bool>,
    pub dashboard_url: Option<String>,
    pub parameters: Option<BTreeMap<String, String>>,
    pub instance: Option<InstanceDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclPayload {
    #[serde(default)]
    pub acl: Vec<String>,
}

/// Metric retention per downsampling level, e.g. `90d`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsRetention {
    pub metrics_retention_time_raw: String,
    pub metrics_retention_time_5m: String,
    pub metrics_retention_time_1h: String,
}

/// Logs or traces storage retention, e.g. `720h`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub retention: String,
}

#[derive(Debug, Deserialize)]
struct RetentionConfigResponse {
    config: RetentionConfig,
}

/// Alertmanager configuration as exchanged with the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfigPayload {
    #[serde(default)]
    pub receivers: Vec<ReceiverPayload>,
    #[serde(default)]
    pub route: RoutePayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_configs: Option<Vec<EmailConfigPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opsgenie_configs: Option<Vec<OpsgenieConfigPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_hook_configs: Option<Vec<WebHookConfigPayload>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailConfigPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smarthost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpsgenieConfigPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebHookConfigPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_teams: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_chat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
}

/// One node of the routing tree; leaf nodes carry no `routes` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_wait: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<String>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_re: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchers: Option<Vec<String>>,
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_matching: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RoutePayload>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opsgenie_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opsgenie_api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_auth_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_auth_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_auth_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_smarthost: Option<String>,
}

/// Answer of the alert configuration read; `data` is absent on plans without alerting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GetAlertConfigResponse {
    #[serde(default)]
    pub data: Option<AlertConfigPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct CreateCredentialsResponse {
    credentials: Credentials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialsInfo {
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetCredentialsResponse {
    pub id: String,
    pub name: String,
    pub credentials_info: Option<CredentialsInfo>,
}

/// Client for the observability API.
#[derive(Debug, Clone)]
pub struct ObservabilityClient {
    api: ApiClient,
}

impl ObservabilityClient {
    /// Wrap an authenticated API client.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn instance_path(project_id: &str, instance_id: &str) -> String {
        format!("/v1/projects/{}/instances/{}", project_id, instance_id)
    }

    pub async fn list_plans(&self, project_id: &str) -> Result<Vec<Plan>> {
        let path = format!("/v1/projects/{}/plans", project_id);
        let response: PlansResponse = self.api.get("listing plans", &path).await?;
        Ok(response.plans)
    }

    pub async fn create_instance(
        &self,
        project_id: &str,
        payload: &CreateInstancePayload,
    ) -> Result<CreateInstanceResponse> {
        let path = format!("/v1/projects/{}/instances", project_id);
        self.api.post("creating instance", &path, payload).await
    }

    pub async fn get_instance(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<GetInstanceResponse> {
        self.api
            .get("reading instance", &Self::instance_path(project_id, instance_id))
            .await
    }

    pub async fn update_instance(
        &self,
        project_id: &str,
        instance_id: &str,
        payload: &UpdateInstancePayload,
    ) -> Result<()> {
        self.api
            .put_discard(
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

    pub async fn get_acl(&self, project_id: &str, instance_id: &str) -> Result<Vec<String>> {
        let path = format!("{}/acl", Self::instance_path(project_id, instance_id));
        let response: AclPayload = self.api.get("reading ACL", &path).await?;
        Ok(response.acl)
    }

    pub async fn update_acl(&self, project_id: &str, instance_id: &str, acl: Vec<String>) -> Result<()> {
        let path = format!("{}/acl", Self::instance_path(project_id, instance_id));
        self.api
            .put_discard("updating ACL", &path, &AclPayload { acl })
            .await
    }

    pub async fn get_metrics_retention(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<MetricsRetention> {
        let path = format!(
            "{}/metrics-storage-retentions",
            Self::instance_path(project_id, instance_id)
        );
        self.api.get("reading metrics retention", &path).await
    }

    pub async fn update_metrics_retention(
        &self,
        project_id: &str,
        instance_id: &str,
        retention: &MetricsRetention,
    ) -> Result<()> {
        let path = format!(
            "{}/metrics-storage-retentions",
            Self::instance_path(project_id, instance_id)
        );
        self.api
            .put_discard("updating metrics retention", &path, retention)
            .await
    }

    pub async fn get_logs_config(&self, project_id: &str, instance_id: &str) -> Result<RetentionConfig> {
        let path = format!("{}/logs-configs", Self::instance_path(project_id, instance_id));
        let response: RetentionConfigResponse = self.api.get("reading logs config", &path).await?;
        Ok(response.config)
    }

    pub async fn update_logs_config(
        &self,
        project_id: &str,
        instance_id: &str,
        config: &RetentionConfig,
    ) -> Result<()> {
        let path = format!("{}/logs-configs", Self::instance_path(project_id, instance_id));
        self.api.put_discard("updating logs config", &path, config).await
    }

    pub async fn get_traces_config(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<RetentionConfig> {
        let path = format!("{}/traces-configs", Self::instance_path(project_id, instance_id));
        let response: RetentionConfigResponse =
            self.api.get("reading traces config", &path).await?;
        Ok(response.config)
    }

    pub async fn update_traces_config(
        &self,
        project_id: &str,
        instance_id: &str,
        config: &RetentionConfig,
    ) -> Result<()> {
        let path = format!("{}/traces-configs", Self::instance_path(project_id, instance_id));
        self.api
            .put_discard("updating traces config", &path, config)
            .await
    }

    pub async fn get_alert_config(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<GetAlertConfigResponse> {
        let path = format!("{}/alertconfigs", Self::instance_path(project_id, instance_id));
        self.api.get("reading alert config", &path).await
    }

    pub async fn update_alert_config(
        &self,
        project_id: &str,
        instance_id: &str,
        payload: &AlertConfigPayload,
    ) -> Result<()> {
        let path = format!("{}/alertconfigs", Self::instance_path(project_id, instance_id));
        self.api
            .put_discard("updating alert config", &path, payload)
            .await
    }

    pub async fn create_credentials(&self, project_id: &str, instance_id: &str) -> Result<Credentials> {
        let path = format!("{}/credentials", Self::instance_path(project_id, instance_id));
        let response: CreateCredentialsResponse = self
            .api
            .post("creating credentials", &path, &serde_json::json!({}))
            .await?;
        Ok(response.credentials)
    }

    pub async fn get_credentials(
        &self,
        project_id: &str,
        instance_id: &str,
        username: &str,
    ) -> Result<GetCredentialsResponse> {
        let path = format!(
            "{}/credentials/{}",
            Self::instance_path(project_id, instance_id),
            username
        );
        self.api.get("reading credentials", &path).await
    }

    pub async fn delete_credentials(
        &self,
        project_id: &str,
        instance_id: &str,
        username: &str,
    ) -> Result<()> {
        let path = format!(
            "{}/credentials/{}",
            Self::instance_path(project_id, instance_id),
            username
        );
        self.api.delete("deleting credentials", &path).await
    }
}
