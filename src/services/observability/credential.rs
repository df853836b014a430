//! `stackit_observability_credential` resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::found;
use crate::client::observability::{Credentials, GetCredentialsResponse};
use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::resource::{decode, encode, required, Resource};
use crate::schema::{Attribute, Schema, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub instance_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fill the model from freshly created credentials.
pub fn map_created(model: &mut CredentialModel, credentials: &Credentials) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    let instance_id = required(&model.instance_id, "instance_id")?;
    if credentials.username.is_empty() {
        return Err(ProviderError::Mapping("username not present in response".into()));
    }
    model.id = Some(import::build_id(&[project_id, instance_id, &credentials.username]));
    model.username = Some(credentials.username.clone());
    model.password = Some(credentials.password.clone());
    Ok(())
}

/// Fill the model from a credentials read. The password is never returned.
pub fn map_read(model: &mut CredentialModel, response: &GetCredentialsResponse) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    let instance_id = required(&model.instance_id, "instance_id")?;
    let username = response
        .credentials_info
        .as_ref()
        .map(|info| info.username.clone())
        .filter(|u| !u.is_empty())
        .or_else(|| model.username.clone())
        .ok_or_else(|| ProviderError::Mapping("username not present in response".into()))?;
    model.id = Some(import::build_id(&[project_id, instance_id, &username]));
    model.username = Some(username);
    Ok(())
}

pub struct CredentialResource;

#[async_trait::async_trait]
impl Resource for CredentialResource {
    fn type_name(&self) -> &'static str {
        "stackit_observability_credential"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Basic auth credentials of an observability instance.")
            .with_attribute(
                "id",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
            .with_attribute(
                "project_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::Uuid),
            )
            .with_attribute(
                "instance_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::Uuid),
            )
            .with_attribute(
                "username",
                Attribute::computed_string().with_use_state_for_unknown(),
            )
            .with_attribute(
                "password",
                Attribute::computed_string()
                    .with_use_state_for_unknown()
                    .sensitive(),
            )
    }

    fn import_fields(&self) -> Option<&'static [&'static str]> {
        Some(&["project_id", "instance_id", "username"])
    }

    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value> {
        let mut model: CredentialModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&model.instance_id, "instance_id")?.clone();
        let credentials = ctx
            .observability()
            .create_credentials(&project_id, &instance_id)
            .await?;
        map_created(&mut model, &credentials)?;
        info!(%project_id, %instance_id, username = %credentials.username, "observability credential created");
        encode(&model)
    }

    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>> {
        let mut model: CredentialModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&model.instance_id, "instance_id")?.clone();
        let username = required(&model.username, "username")?.clone();
        let response = ctx
            .observability()
            .get_credentials(&project_id, &instance_id, &username)
            .await;
        let Some(response) = found(response)? else {
            return Ok(None);
        };
        map_read(&mut model, &response)?;
        Ok(Some(encode(&model)?))
    }

    async fn update(&self, _ctx: &ProviderData, _prior: Value, _planned: Value) -> Result<Value> {
        Err(ProviderError::Validation(
            "observability credentials can't be updated in place".into(),
        ))
    }

    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()> {
        let model: CredentialModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?;
        let instance_id = required(&model.instance_id, "instance_id")?;
        let username = required(&model.username, "username")?;
        let deleted = ctx
            .observability()
            .delete_credentials(project_id, instance_id, username)
            .await;
        if found(deleted)?.is_none() {
            debug!(%username, "credential already gone");
        }
        info!(%project_id, %instance_id, %username, "observability credential deleted");
        Ok(())
    }
}
