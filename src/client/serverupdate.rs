//! Server update API: update schedules and service enablement.

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

/// Body of the create and update schedule calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchedulePayload {
    pub name: String,
    pub rrule: String,
    pub enabled: bool,
    pub maintenance_window: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSchedule {
    pub id: i64,
    pub name: String,
    pub rrule: String,
    pub enabled: bool,
    pub maintenance_window: i64,
}

#[derive(Debug, Deserialize)]
struct UpdateSchedulesResponse {
    #[serde(default)]
    items: Vec<UpdateSchedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceStatus {
    pub enabled: bool,
}

/// Client for the server update API.
#[derive(Debug, Clone)]
pub struct ServerUpdateClient {
    api: ApiClient,
}

impl ServerUpdateClient {
    /// Wrap an authenticated API client.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn server_path(project_id: &str, region: &str, server_id: &str) -> String {
        format!(
            "/v1/projects/{}/regions/{}/servers/{}",
            project_id, region, server_id
        )
    }

    fn schedule_path(project_id: &str, region: &str, server_id: &str, schedule_id: i64) -> String {
        format!(
            "{}/update-schedules/{}",
            Self::server_path(project_id, region, server_id),
            schedule_id
        )
    }

    pub async fn get_service_status(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<ServiceStatus> {
        let path = format!("{}/service", Self::server_path(project_id, region, server_id));
        self.api.get("reading server update service", &path).await
    }

    pub async fn enable_service(&self, project_id: &str, region: &str, server_id: &str) -> Result<()> {
        let path = format!("{}/service", Self::server_path(project_id, region, server_id));
        self.api
            .post_empty("enabling server update service", &path)
            .await
    }

    pub async fn create_schedule(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
        payload: &UpdateSchedulePayload,
    ) -> Result<UpdateSchedule> {
        let path = format!(
            "{}/update-schedules",
            Self::server_path(project_id, region, server_id)
        );
        self.api.post("creating update schedule", &path, payload).await
    }

    pub async fn get_schedule(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
        schedule_id: i64,
    ) -> Result<UpdateSchedule> {
        self.api
            .get(
                "reading update schedule",
                &Self::schedule_path(project_id, region, server_id, schedule_id),
            )
            .await
    }

    pub async fn list_schedules(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<Vec<UpdateSchedule>> {
        let path = format!(
            "{}/update-schedules",
            Self::server_path(project_id, region, server_id)
        );
        let response: UpdateSchedulesResponse =
            self.api.get("listing update schedules", &path).await?;
        Ok(response.items)
    }

    pub async fn update_schedule(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
        schedule_id: i64,
        payload: &UpdateSchedulePayload,
    ) -> Result<UpdateSchedule> {
        self.api
            .put(
                "updating update schedule",
                &Self::schedule_path(project_id, region, server_id, schedule_id),
                payload,
            )
            .await
    }

    pub async fn delete_schedule(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
        schedule_id: i64,
    ) -> Result<()> {
        self.api
            .delete(
                "deleting update schedule",
                &Self::schedule_path(project_id, region, server_id, schedule_id),
            )
            .await
    }
}
