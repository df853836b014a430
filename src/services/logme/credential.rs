//! `stackit_logme_credential` resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::found;
use crate::client::logme::CredentialsResponse;
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
    pub credential_id: Option<String>,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub uri: Option<String>,
}

/// Copy an API credential into the model.
pub fn map_credential(model: &mut CredentialModel, response: &CredentialsResponse) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    let instance_id = required(&model.instance_id, "instance_id")?;
    if response.id.is_empty() {
        return Err(ProviderError::Mapping("credential id not present in response".into()));
    }
    model.id = Some(import::build_id(&[project_id, instance_id, &response.id]));
    model.credential_id = Some(response.id.clone());
    if let Some(raw) = &response.raw {
        let credentials = &raw.credentials;
        model.host = Some(credentials.host.clone());
        model.port = credentials.port;
        model.username = Some(credentials.username.clone());
        model.password = Some(credentials.password.clone());
        if credentials.uri.is_some() {
            model.uri = credentials.uri.clone();
        }
    }
    if response.uri.is_some() {
        model.uri = response.uri.clone();
    }
    Ok(())
}

pub struct CredentialResource;

#[async_trait::async_trait]
impl Resource for CredentialResource {
    fn type_name(&self) -> &'static str {
        "stackit_logme_credential"
    }

    fn schema(&self) -> Schema {
        let computed = || Attribute::computed_string().with_use_state_for_unknown();
        Schema::v0()
            .with_description("Credentials of a LogMe instance.")
            .with_attribute("id", computed())
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
            .with_attribute("credential_id", computed())
            .with_attribute("host", computed())
            .with_attribute("port", Attribute::computed_int64().with_use_state_for_unknown())
            .with_attribute("username", computed())
            .with_attribute("password", computed().sensitive())
            .with_attribute("uri", computed().sensitive())
    }

    fn import_fields(&self) -> Option<&'static [&'static str]> {
        Some(&["project_id", "instance_id", "credential_id"])
    }

    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value> {
        let mut model: CredentialModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&model.instance_id, "instance_id")?.clone();
        let response = ctx
            .logme()
            .create_credentials(&project_id, &instance_id)
            .await?;
        map_credential(&mut model, &response)?;
        info!(%project_id, %instance_id, credential_id = %response.id, "LogMe credential created");
        encode(&model)
    }

    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>> {
        let mut model: CredentialModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&model.instance_id, "instance_id")?.clone();
        let credential_id = required(&model.credential_id, "credential_id")?.clone();
        let response = ctx
            .logme()
            .get_credentials(&project_id, &instance_id, &credential_id)
            .await;
        let Some(response) = found(response)? else {
            return Ok(None);
        };
        map_credential(&mut model, &response)?;
        Ok(Some(encode(&model)?))
    }

    async fn update(&self, _ctx: &ProviderData, _prior: Value, _planned: Value) -> Result<Value> {
        Err(ProviderError::Validation(
            "LogMe credentials can't be updated in place".into(),
        ))
    }

    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()> {
        let model: CredentialModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?;
        let instance_id = required(&model.instance_id, "instance_id")?;
        let credential_id = required(&model.credential_id, "credential_id")?;
        let deleted = ctx
            .logme()
            .delete_credentials(project_id, instance_id, credential_id)
            .await;
        if found(deleted)?.is_none() {
            debug!(%credential_id, "credential already gone");
        }
        info!(%project_id, %instance_id, %credential_id, "LogMe credential deleted");
        Ok(())
    }
}
