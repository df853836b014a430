//! `stackit_scf_organization` resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::found;
use crate::client::scf::{
    CreateOrganizationPayload, Organization, ScfClient, UpdateOrganizationPayload, STATUS_CREATED,
    STATUS_CREATE_FAILED, STATUS_DELETE_FAILED,
};
use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::resource::{decode, encode, required, Resource};
use crate::schema::{Attribute, Schema, Validator};
use crate::wait::{self, Poll};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub org_id: Option<String>,
    pub name: Option<String>,
    pub platform_id: Option<String>,
    pub quota_id: Option<String>,
    pub suspended: Option<bool>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

pub fn to_create_payload(model: &OrganizationModel) -> Result<CreateOrganizationPayload> {
    Ok(CreateOrganizationPayload {
        name: required(&model.name, "name")?.clone(),
        platform_id: model.platform_id.clone(),
        quota_id: model.quota_id.clone(),
        suspended: model.suspended,
    })
}

pub fn to_update_payload(model: &OrganizationModel) -> UpdateOrganizationPayload {
    UpdateOrganizationPayload {
        name: model.name.clone(),
        suspended: model.suspended,
    }
}

/// Copy an API organization into the model.
pub fn map_organization(model: &mut OrganizationModel, region: &str, org: &Organization) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    if org.guid.is_empty() {
        return Err(ProviderError::Mapping("organization guid not present in response".into()));
    }
    let region = org.region.clone().unwrap_or_else(|| region.to_string());
    model.id = Some(import::build_id(&[project_id, &region, &org.guid]));
    model.region = Some(region);
    model.org_id = Some(org.guid.clone());
    model.name = Some(org.name.clone());
    model.platform_id = org.platform_id.clone();
    model.quota_id = org.quota_id.clone();
    model.suspended = org.suspended;
    model.status = Some(org.status.clone());
    model.created_at = org.created_at.clone();
    model.updated_at = org.updated_at.clone();
    Ok(())
}

async fn wait_until_created(
    client: &ScfClient,
    ctx: &ProviderData,
    project_id: &str,
    region: &str,
    org_id: &str,
) -> Result<Organization> {
    let operation = "organization creation";
    wait::wait_for(operation, ctx.config().wait, move || async move {
        let org = client.get_organization(project_id, region, org_id).await?;
        match org.status.as_str() {
            STATUS_CREATED => Ok(Poll::Done(org)),
            STATUS_CREATE_FAILED => Err(wait::failed(operation, STATUS_CREATE_FAILED)),
            status => Ok(Poll::Pending(status.to_string())),
        }
    })
    .await
}

pub struct OrganizationResource;

#[async_trait::async_trait]
impl Resource for OrganizationResource {
    fn type_name(&self) -> &'static str {
        "stackit_scf_organization"
    }

    fn schema(&self) -> Schema {
        let computed = || Attribute::computed_string().with_use_state_for_unknown();
        Schema::v0()
            .with_description("Cloud Foundry organization.")
            .with_attribute("id", computed())
            .with_attribute(
                "project_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::Uuid),
            )
            .with_attribute(
                "region",
                Attribute::optional_string()
                    .optional_computed()
                    .with_force_new()
                    .with_use_state_for_unknown()
                    .with_validator(Validator::NoSeparator),
            )
            .with_attribute("org_id", computed())
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::LengthAtLeast(1)),
            )
            .with_attribute(
                "platform_id",
                Attribute::optional_string()
                    .optional_computed()
                    .with_force_new()
                    .with_use_state_for_unknown(),
            )
            .with_attribute(
                "quota_id",
                Attribute::optional_string()
                    .optional_computed()
                    .with_force_new()
                    .with_use_state_for_unknown(),
            )
            .with_attribute(
                "suspended",
                Attribute::optional_bool()
                    .optional_computed()
                    .with_use_state_for_unknown(),
            )
            .with_attribute("status", Attribute::computed_string())
            .with_attribute("created_at", computed())
            .with_attribute("updated_at", Attribute::computed_string())
    }

    fn is_beta(&self) -> bool {
        true
    }

    fn import_fields(&self) -> Option<&'static [&'static str]> {
        Some(&["project_id", "region", "org_id"])
    }

    async fn modify_plan(
        &self,
        ctx: &ProviderData,
        _prior: Option<&Value>,
        planned: Value,
    ) -> Result<Value> {
        let mut model: OrganizationModel = decode(planned)?;
        if model.region.is_none() {
            model.region = Some(ctx.default_region().to_string());
        }
        encode(&model)
    }

    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value> {
        let mut model: OrganizationModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let region = model
            .region
            .clone()
            .unwrap_or_else(|| ctx.default_region().to_string());
        let client = ctx.scf();

        let created = client
            .create_organization(&project_id, &region, &to_create_payload(&model)?)
            .await?;
        info!(%project_id, org_id = %created.guid, "organization requested");

        model.org_id = Some(created.guid.clone());
        model.region = Some(region.clone());
        model.id = Some(import::build_id(&[&project_id, &region, &created.guid]));
        let seeded = encode(&model)?;

        let finished = async {
            let org = wait_until_created(&client, ctx, &project_id, &region, &created.guid).await?;
            map_organization(&mut model, &region, &org)?;
            encode(&model)
        };
        finished.await.map_err(|err| err.with_state(seeded))
    }

    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>> {
        let mut model: OrganizationModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let org_id = required(&model.org_id, "org_id")?.clone();
        let region = model
            .region
            .clone()
            .unwrap_or_else(|| ctx.default_region().to_string());

        let org = ctx.scf().get_organization(&project_id, &region, &org_id).await;
        let Some(org) = found(org)? else {
            return Ok(None);
        };
        map_organization(&mut model, &region, &org)?;
        Ok(Some(encode(&model)?))
    }

    async fn update(&self, ctx: &ProviderData, prior: Value, planned: Value) -> Result<Value> {
        let prior: OrganizationModel = decode(prior)?;
        let mut model: OrganizationModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let org_id = required(&prior.org_id, "org_id")?.clone();
        let region = model
            .region
            .clone()
            .unwrap_or_else(|| ctx.default_region().to_string());
        let client = ctx.scf();

        let payload = to_update_payload(&model);
        if payload == to_update_payload(&prior) {
            debug!(%org_id, "organization unchanged, skipping update");
        } else {
            client
                .update_organization(&project_id, &region, &org_id, &payload)
                .await?;
            info!(%project_id, %org_id, "organization updated");
        }
        let org = client.get_organization(&project_id, &region, &org_id).await?;
        map_organization(&mut model, &region, &org)?;
        encode(&model)
    }

    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()> {
        let model: OrganizationModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?;
        let org_id = required(&model.org_id, "org_id")?;
        let region = model.region.as_deref().unwrap_or_else(|| ctx.default_region());
        let client = ctx.scf();

        if found(client.delete_organization(project_id, region, org_id).await)?.is_none() {
            debug!(%org_id, "organization already gone");
            return Ok(());
        }

        let operation = "organization deletion";
        let client = &client;
        wait::wait_for(operation, ctx.config().wait, move || async move {
            match found(client.get_organization(project_id, region, org_id).await)? {
                None => Ok(Poll::Done(())),
                Some(org) if org.status == STATUS_DELETE_FAILED => {
                    Err(wait::failed(operation, &org.status))
                },
                Some(org) => Ok(Poll::Pending(org.status)),
            }
        })
        .await?;
        info!(%project_id, %org_id, "organization deleted");
        Ok(())
    }
}
