//! `stackit_logme_instance` resource and data source.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::found;
use crate::client::logme::{
    CreateInstancePayload, Instance, InstanceParameters, LogMeClient, Offering,
    PartialUpdateInstancePayload, STATE_FAILED, STATE_SUCCEEDED,
};
use crate::config::WaitConfig;
use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::resource::{data_source_schema, decode, encode, required, DataSource, Resource};
use crate::schema::{Attribute, AttributeFlags, NestedAttributes, Schema, Validator};
use crate::wait::{self, Poll};

const TYPE_NAME: &str = "stackit_logme_instance";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub instance_id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub plan_name: Option<String>,
    pub plan_id: Option<String>,
    pub parameters: Option<ParametersModel>,
    pub cf_guid: Option<String>,
    pub cf_space_guid: Option<String>,
    pub cf_organization_guid: Option<String>,
    pub dashboard_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametersModel {
    pub sgw_acl: Option<String>,
    pub enable_monitoring: Option<bool>,
    pub monitoring_instance_id: Option<String>,
    pub max_disk_threshold: Option<i64>,
    pub metrics_frequency: Option<i64>,
    pub metrics_prefix: Option<String>,
    pub graphite: Option<String>,
    pub syslog: Option<Vec<String>>,
}

impl From<&ParametersModel> for InstanceParameters {
    fn from(p: &ParametersModel) -> Self {
        Self {
            sgw_acl: p.sgw_acl.clone(),
            enable_monitoring: p.enable_monitoring,
            monitoring_instance_id: p.monitoring_instance_id.clone(),
            max_disk_threshold: p.max_disk_threshold,
            metrics_frequency: p.metrics_frequency,
            metrics_prefix: p.metrics_prefix.clone(),
            graphite: p.graphite.clone(),
            syslog: p.syslog.clone(),
        }
    }
}

impl From<&InstanceParameters> for ParametersModel {
    fn from(p: &InstanceParameters) -> Self {
        Self {
            sgw_acl: p.sgw_acl.clone(),
            enable_monitoring: p.enable_monitoring,
            monitoring_instance_id: p.monitoring_instance_id.clone(),
            max_disk_threshold: p.max_disk_threshold,
            metrics_frequency: p.metrics_frequency,
            metrics_prefix: p.metrics_prefix.clone(),
            graphite: p.graphite.clone(),
            syslog: p.syslog.clone(),
        }
    }
}

fn parameters(model: &InstanceModel) -> InstanceParameters {
    model
        .parameters
        .as_ref()
        .map(InstanceParameters::from)
        .unwrap_or_default()
}

/// Resolve `version` and `plan_name` to a plan id.
pub fn resolve_plan_id(offerings: &[Offering], version: &str, plan_name: &str) -> Result<String> {
    let mut available = Vec::new();
    for offering in offerings.iter().filter(|o| o.version == version) {
        for plan in &offering.plans {
            if plan.name == plan_name {
                return Ok(plan.id.clone());
            }
            available.push(plan.name.as_str());
        }
    }
    Err(ProviderError::attribute(
        "plan_name",
        "Invalid plan name",
        format!(
            "Couldn't find plan {:?} for version {:?}; available plans: {}",
            plan_name,
            version,
            available.join(", ")
        ),
    ))
}

/// Find version and plan name of a plan id.
fn describe_plan(offerings: &[Offering], plan_id: &str) -> Option<(String, String)> {
    offerings.iter().find_map(|offering| {
        offering
            .plans
            .iter()
            .find(|plan| plan.id == plan_id)
            .map(|plan| (offering.version.clone(), plan.name.clone()))
    })
}

pub fn to_create_payload(model: &InstanceModel, plan_id: &str) -> Result<CreateInstancePayload> {
    Ok(CreateInstancePayload {
        instance_name: required(&model.name, "name")?.clone(),
        plan_id: plan_id.to_string(),
        parameters: parameters(model),
    })
}

pub fn to_update_payload(model: &InstanceModel, plan_id: &str) -> PartialUpdateInstancePayload {
    PartialUpdateInstancePayload {
        plan_id: plan_id.to_string(),
        parameters: parameters(model),
    }
}

/// Copy an API instance into the model.
pub fn map_instance(model: &mut InstanceModel, instance: &Instance) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    if instance.instance_id.is_empty() {
        return Err(ProviderError::Mapping("instance id not present in response".into()));
    }
    model.id = Some(import::build_id(&[project_id, &instance.instance_id]));
    model.instance_id = Some(instance.instance_id.clone());
    model.name = Some(instance.name.clone());
    model.plan_id = Some(instance.plan_id.clone());
    model.parameters = instance
        .parameters
        .as_ref()
        .filter(|p| !p.is_empty())
        .map(ParametersModel::from);
    model.cf_guid = instance.cf_guid.clone();
    model.cf_space_guid = instance.cf_space_guid.clone();
    model.cf_organization_guid = instance.cf_organization_guid.clone();
    model.dashboard_url = instance.dashboard_url.clone();
    model.image_url = instance.image_url.clone();
    Ok(())
}

async fn wait_for_operation(
    client: &LogMeClient,
    config: WaitConfig,
    project_id: &str,
    instance_id: &str,
    operation: &str,
) -> Result<()> {
    wait::wait_for(operation, config, move || async move {
        let instance = client.get_instance(project_id, instance_id).await?;
        match instance.last_operation.state.as_str() {
            STATE_SUCCEEDED => Ok(Poll::Done(())),
            STATE_FAILED => Err(wait::failed(operation, STATE_FAILED)),
            state => Ok(Poll::Pending(state.to_string())),
        }
    })
    .await
}

async fn refresh(client: &LogMeClient, mut model: InstanceModel) -> Result<Option<InstanceModel>> {
    let project_id = required(&model.project_id, "project_id")?.clone();
    let instance_id = required(&model.instance_id, "instance_id")?.clone();

    let Some(instance) = found(client.get_instance(&project_id, &instance_id).await)? else {
        return Ok(None);
    };
    if instance.is_deleted() {
        return Ok(None);
    }
    map_instance(&mut model, &instance)?;

    let offerings = client.list_offerings(&project_id).await?;
    if let Some((version, plan_name)) = describe_plan(&offerings, &instance.plan_id) {
        model.version = Some(version);
        model.plan_name = Some(plan_name);
    }
    Ok(Some(model))
}

fn gone(project_id: &str, instance_id: &str) -> ProviderError {
    ProviderError::NotFound(format!(
        "LogMe instance {}",
        import::build_id(&[project_id, instance_id])
    ))
}

fn parameters_attribute() -> Attribute {
    let nested = NestedAttributes::single()
        .with_attribute("sgw_acl", Attribute::optional_string().optional_computed())
        .with_attribute("enable_monitoring", Attribute::optional_bool().optional_computed())
        .with_attribute(
            "monitoring_instance_id",
            Attribute::optional_string().with_validator(Validator::Uuid),
        )
        .with_attribute("max_disk_threshold", Attribute::optional_int64().optional_computed())
        .with_attribute("metrics_frequency", Attribute::optional_int64().optional_computed())
        .with_attribute("metrics_prefix", Attribute::optional_string())
        .with_attribute("graphite", Attribute::optional_string())
        .with_attribute("syslog", Attribute::optional_string_list());
    Attribute::nested(nested, AttributeFlags::optional_computed()).with_use_state_for_unknown()
}

pub struct InstanceResource;

#[async_trait::async_trait]
impl Resource for InstanceResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let computed = || Attribute::computed_string().with_use_state_for_unknown();
        Schema::v0()
            .with_description("LogMe instance.")
            .with_attribute("id", computed())
            .with_attribute(
                "project_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::Uuid),
            )
            .with_attribute("instance_id", computed())
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::LengthAtLeast(1)),
            )
            .with_attribute(
                "version",
                Attribute::required_string().with_description("Service version, e.g. `2`."),
            )
            .with_attribute("plan_name", Attribute::required_string())
            .with_attribute("plan_id", Attribute::computed_string())
            .with_attribute("parameters", parameters_attribute())
            .with_attribute("cf_guid", computed())
            .with_attribute("cf_space_guid", computed())
            .with_attribute("cf_organization_guid", computed())
            .with_attribute("dashboard_url", computed())
            .with_attribute("image_url", computed())
    }

    fn import_fields(&self) -> Option<&'static [&'static str]> {
        Some(&["project_id", "instance_id"])
    }

    async fn modify_plan(
        &self,
        ctx: &ProviderData,
        _prior: Option<&Value>,
        planned: Value,
    ) -> Result<Value> {
        let mut model: InstanceModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?;
        let offerings = ctx.logme().list_offerings(project_id).await?;
        let plan_id = resolve_plan_id(
            &offerings,
            required(&model.version, "version")?,
            required(&model.plan_name, "plan_name")?,
        )?;
        model.plan_id = Some(plan_id);
        encode(&model)
    }

    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value> {
        let mut model: InstanceModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let client = ctx.logme();

        let offerings = client.list_offerings(&project_id).await?;
        let plan_id = resolve_plan_id(
            &offerings,
            required(&model.version, "version")?,
            required(&model.plan_name, "plan_name")?,
        )?;
        let payload = to_create_payload(&model, &plan_id)?;
        let instance_id = client.create_instance(&project_id, &payload).await?.instance_id;
        info!(%project_id, %instance_id, "LogMe instance requested");

        model.instance_id = Some(instance_id.clone());
        model.id = Some(import::build_id(&[&project_id, &instance_id]));
        model.plan_id = Some(plan_id);
        let seeded = encode(&model)?;

        let finished = async {
            wait_for_operation(
                &client,
                ctx.config().wait,
                &project_id,
                &instance_id,
                "LogMe instance creation",
            )
            .await?;
            refresh(&client, model)
                .await?
                .ok_or_else(|| gone(&project_id, &instance_id))
        };
        let model = finished.await.map_err(|err| err.with_state(seeded))?;
        encode(&model)
    }

    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>> {
        let model: InstanceModel = decode(state)?;
        match refresh(&ctx.logme(), model).await? {
            Some(model) => Ok(Some(encode(&model)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, ctx: &ProviderData, prior: Value, planned: Value) -> Result<Value> {
        let prior: InstanceModel = decode(prior)?;
        let mut model: InstanceModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&prior.instance_id, "instance_id")?.clone();
        model.instance_id = Some(instance_id.clone());
        let client = ctx.logme();

        let offerings = client.list_offerings(&project_id).await?;
        let plan_id = resolve_plan_id(
            &offerings,
            required(&model.version, "version")?,
            required(&model.plan_name, "plan_name")?,
        )?;
        let payload = to_update_payload(&model, &plan_id);
        let previous = to_update_payload(&prior, prior.plan_id.as_deref().unwrap_or_default());
        if payload == previous {
            debug!(%instance_id, "instance payload unchanged, skipping update");
        } else {
            client
                .partial_update_instance(&project_id, &instance_id, &payload)
                .await?;
            info!(%project_id, %instance_id, "LogMe instance update requested");
            wait_for_operation(
                &client,
                ctx.config().wait,
                &project_id,
                &instance_id,
                "LogMe instance update",
            )
            .await?;
        }

        let model = refresh(&client, model)
            .await?
            .ok_or_else(|| gone(&project_id, &instance_id))?;
        encode(&model)
    }

    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()> {
        let model: InstanceModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?;
        let instance_id = required(&model.instance_id, "instance_id")?;
        let client = ctx.logme();

        if found(client.delete_instance(project_id, instance_id).await)?.is_none() {
            debug!(%instance_id, "instance already gone");
            return Ok(());
        }

        let operation = "LogMe instance deletion";
        let client = &client;
        wait::wait_for(operation, ctx.config().wait, move || async move {
            match found(client.get_instance(project_id, instance_id).await)? {
                None => Ok(Poll::Done(())),
                Some(instance) if instance.is_deleted() => Ok(Poll::Done(())),
                Some(instance) if instance.last_operation.state == STATE_FAILED => {
                    Err(wait::failed(operation, STATE_FAILED))
                },
                Some(instance) => Ok(Poll::Pending(instance.last_operation.state)),
            }
        })
        .await?;
        info!(%project_id, %instance_id, "LogMe instance deleted");
        Ok(())
    }
}

pub struct InstanceDataSource;

#[async_trait::async_trait]
impl DataSource for InstanceDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        data_source_schema(InstanceResource.schema(), &["project_id", "instance_id"])
    }

    async fn read(&self, ctx: &ProviderData, config: Value) -> Result<Value> {
        let model: InstanceModel = decode(config)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&model.instance_id, "instance_id")?.clone();
        let model = refresh(&ctx.logme(), model)
            .await?
            .ok_or_else(|| gone(&project_id, &instance_id))?;
        encode(&model)
    }
}
