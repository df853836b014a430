//! SCF (Cloud Foundry) API: organizations and platforms.

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

/// Organization status once provisioning finished.
pub const STATUS_CREATED: &str = "created";
/// Organization status when provisioning failed.
pub const STATUS_CREATE_FAILED: &str = "create_failed";
/// Organization status when deletion failed.
pub const STATUS_DELETE_FAILED: &str = "delete_failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationResponse {
    pub guid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    pub guid: String,
    pub name: String,
    pub platform_id: Option<String>,
    pub quota_id: Option<String>,
    pub region: Option<String>,
    pub status: String,
    pub suspended: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Platform {
    pub guid: String,
    pub display_name: String,
    pub region: String,
    pub system_id: String,
    pub api_url: String,
    pub console_url: Option<String>,
}

/// Client for the SCF API.
#[derive(Debug, Clone)]
pub struct ScfClient {
    api: ApiClient,
}

impl ScfClient {
    /// Wrap an authenticated API client.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn organizations_path(project_id: &str, region: &str) -> String {
        format!("/v1/projects/{}/regions/{}/organizations", project_id, region)
    }

    pub async fn create_organization(
        &self,
        project_id: &str,
        region: &str,
        payload: &CreateOrganizationPayload,
    ) -> Result<CreateOrganizationResponse> {
        self.api
            .post(
                "creating organization",
                &Self::organizations_path(project_id, region),
                payload,
            )
            .await
    }

    pub async fn get_organization(
        &self,
        project_id: &str,
        region: &str,
        org_id: &str,
    ) -> Result<Organization> {
        let path = format!("{}/{}", Self::organizations_path(project_id, region), org_id);
        self.api.get("reading organization", &path).await
    }

    pub async fn update_organization(
        &self,
        project_id: &str,
        region: &str,
        org_id: &str,
        payload: &UpdateOrganizationPayload,
    ) -> Result<()> {
        let path = format!("{}/{}", Self::organizations_path(project_id, region), org_id);
        self.api.patch("updating organization", &path, payload).await
    }

    pub async fn delete_organization(&self, project_id: &str, region: &str, org_id: &str) -> Result<()> {
        let path = format!("{}/{}", Self::organizations_path(project_id, region), org_id);
        self.api.delete("deleting organization", &path).await
    }

    pub async fn get_platform(
        &self,
        project_id: &str,
        region: &str,
        platform_id: &str,
    ) -> Result<Platform> {
        let path = format!(
            "/v1/projects/{}/regions/{}/platforms/{}",
            project_id, region, platform_id
        );
        self.api.get("reading platform", &path).await
    }
}
