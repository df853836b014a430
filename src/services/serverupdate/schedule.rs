//! `stackit_server_update_schedule` resource and data sources.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::found;
use crate::client::serverupdate::{ServerUpdateClient, UpdateSchedule, UpdateSchedulePayload};
use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::resource::{data_source_schema, decode, encode, required, DataSource, Resource};
use crate::schema::{Attribute, AttributeFlags, NestedAttributes, Schema, Validator};

const TYPE_NAME: &str = "stackit_server_update_schedule";
const IMPORT_FIELDS: &[&str] = &["project_id", "region", "server_id", "update_schedule_id"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub server_id: Option<String>,
    pub update_schedule_id: Option<i64>,
    pub name: Option<String>,
    pub rrule: Option<String>,
    pub enabled: Option<bool>,
    pub maintenance_window: Option<i64>,
}

impl ScheduleModel {
    fn region_or<'a>(&'a self, ctx: &'a ProviderData) -> &'a str {
        self.region.as_deref().unwrap_or_else(|| ctx.default_region())
    }
}

/// Build the create/update payload.
pub fn to_payload(model: &ScheduleModel) -> Result<UpdateSchedulePayload> {
    Ok(UpdateSchedulePayload {
        name: required(&model.name, "name")?.clone(),
        rrule: required(&model.rrule, "rrule")?.clone(),
        enabled: *required(&model.enabled, "enabled")?,
        maintenance_window: *required(&model.maintenance_window, "maintenance_window")?,
    })
}

/// Copy an API schedule into the model.
pub fn map_schedule(model: &mut ScheduleModel, region: &str, schedule: &UpdateSchedule) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    let server_id = required(&model.server_id, "server_id")?;
    let schedule_id = schedule.id.to_string();
    model.id = Some(import::build_id(&[project_id, region, server_id, &schedule_id]));
    model.region = Some(region.to_string());
    model.update_schedule_id = Some(schedule.id);
    model.name = Some(schedule.name.clone());
    model.rrule = Some(schedule.rrule.clone());
    model.enabled = Some(schedule.enabled);
    model.maintenance_window = Some(schedule.maintenance_window);
    Ok(())
}

/// Enable the update service on the server unless it already is.
async fn ensure_service(
    client: &ServerUpdateClient,
    project_id: &str,
    region: &str,
    server_id: &str,
) -> Result<()> {
    let status = found(client.get_service_status(project_id, region, server_id).await)?;
    if status.map_or(false, |s| s.enabled) {
        return Ok(());
    }
    info!(%server_id, "enabling server update service");
    client.enable_service(project_id, region, server_id).await
}

fn schedule_attributes(nested: NestedAttributes) -> NestedAttributes {
    nested
        .with_attribute("update_schedule_id", Attribute::computed_int64())
        .with_attribute("name", Attribute::computed_string())
        .with_attribute("rrule", Attribute::computed_string())
        .with_attribute("enabled", Attribute::computed_bool())
        .with_attribute("maintenance_window", Attribute::computed_int64())
}

pub struct ScheduleResource;

#[async_trait::async_trait]
impl Resource for ScheduleResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Server update schedule.")
            .with_attribute("id", Attribute::computed_string().with_use_state_for_unknown())
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
                    .with_validator(Validator::NoSeparator)
                    .with_description("Defaults to the provider region."),
            )
            .with_attribute(
                "server_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::Uuid),
            )
            .with_attribute(
                "update_schedule_id",
                Attribute::computed_int64().with_use_state_for_unknown(),
            )
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::LengthAtLeast(1)),
            )
            .with_attribute(
                "rrule",
                Attribute::required_string().with_description("iCalendar recurrence rule."),
            )
            .with_attribute("enabled", Attribute::required_bool())
            .with_attribute(
                "maintenance_window",
                Attribute::required_int64()
                    .with_validator(Validator::Int64Between { min: 1, max: 24 })
                    .with_description("Maintenance window length in hours."),
            )
    }

    fn is_beta(&self) -> bool {
        true
    }

    fn import_fields(&self) -> Option<&'static [&'static str]> {
        Some(IMPORT_FIELDS)
    }

    fn import_state(&self, id: &str) -> Result<Value> {
        let parts = import::parse_id(id, IMPORT_FIELDS)?;
        let schedule_id: i64 = parts[3].parse().map_err(|_| ProviderError::ImportId {
            expected: "[project_id],[region],[server_id],[update_schedule_id] with a numeric update_schedule_id"
                .into(),
            got: id.to_string(),
        })?;
        Ok(json!({
            "id": id,
            "project_id": parts[0],
            "region": parts[1],
            "server_id": parts[2],
            "update_schedule_id": schedule_id,
        }))
    }

    async fn modify_plan(
        &self,
        ctx: &ProviderData,
        _prior: Option<&Value>,
        planned: Value,
    ) -> Result<Value> {
        let mut model: ScheduleModel = decode(planned)?;
        if model.region.is_none() {
            model.region = Some(ctx.default_region().to_string());
        }
        encode(&model)
    }

    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value> {
        let mut model: ScheduleModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let server_id = required(&model.server_id, "server_id")?.clone();
        let region = model.region_or(ctx).to_string();
        let client = ctx.server_update();

        ensure_service(&client, &project_id, &region, &server_id).await?;
        let schedule = client
            .create_schedule(&project_id, &region, &server_id, &to_payload(&model)?)
            .await?;
        map_schedule(&mut model, &region, &schedule)?;
        info!(%project_id, %server_id, schedule_id = schedule.id, "update schedule created");
        encode(&model)
    }

    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>> {
        let mut model: ScheduleModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let server_id = required(&model.server_id, "server_id")?.clone();
        let schedule_id = *required(&model.update_schedule_id, "update_schedule_id")?;
        let region = model.region_or(ctx).to_string();

        let schedule = ctx
            .server_update()
            .get_schedule(&project_id, &region, &server_id, schedule_id)
            .await;
        let Some(schedule) = found(schedule)? else {
            return Ok(None);
        };
        map_schedule(&mut model, &region, &schedule)?;
        Ok(Some(encode(&model)?))
    }

    async fn update(&self, ctx: &ProviderData, prior: Value, planned: Value) -> Result<Value> {
        let prior: ScheduleModel = decode(prior)?;
        let mut model: ScheduleModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let server_id = required(&model.server_id, "server_id")?.clone();
        let schedule_id = *required(&prior.update_schedule_id, "update_schedule_id")?;
        let region = model.region_or(ctx).to_string();
        let client = ctx.server_update();

        let payload = to_payload(&model)?;
        let schedule = if to_payload(&prior).ok().as_ref() == Some(&payload) {
            debug!(schedule_id, "schedule unchanged, skipping update");
            client
                .get_schedule(&project_id, &region, &server_id, schedule_id)
                .await?
        } else {
            client
                .update_schedule(&project_id, &region, &server_id, schedule_id, &payload)
                .await?
        };
        map_schedule(&mut model, &region, &schedule)?;
        info!(%project_id, %server_id, schedule_id, "update schedule updated");
        encode(&model)
    }

    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()> {
        let model: ScheduleModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?;
        let server_id = required(&model.server_id, "server_id")?;
        let schedule_id = *required(&model.update_schedule_id, "update_schedule_id")?;
        let region = model.region_or(ctx);
        let deleted = ctx
            .server_update()
            .delete_schedule(project_id, region, server_id, schedule_id)
            .await;
        if found(deleted)?.is_none() {
            debug!(schedule_id, "update schedule already gone");
        }
        info!(%project_id, %server_id, schedule_id, "update schedule deleted");
        Ok(())
    }
}

pub struct ScheduleDataSource;

#[async_trait::async_trait]
impl DataSource for ScheduleDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        data_source_schema(
            ScheduleResource.schema(),
            &["project_id", "server_id", "update_schedule_id"],
        )
        .with_attribute("region", Attribute::optional_string().optional_computed())
    }

    fn is_beta(&self) -> bool {
        true
    }

    async fn read(&self, ctx: &ProviderData, config: Value) -> Result<Value> {
        let mut model: ScheduleModel = decode(config)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let server_id = required(&model.server_id, "server_id")?.clone();
        let schedule_id = *required(&model.update_schedule_id, "update_schedule_id")?;
        let region = model.region_or(ctx).to_string();

        let schedule = found(
            ctx.server_update()
                .get_schedule(&project_id, &region, &server_id, schedule_id)
                .await,
        )?
        .ok_or_else(|| {
            ProviderError::NotFound(format!("update schedule {} of server {}", schedule_id, server_id))
        })?;
        map_schedule(&mut model, &region, &schedule)?;
        encode(&model)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulesModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub server_id: Option<String>,
    pub items: Option<Vec<ScheduleItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleItem {
    pub update_schedule_id: i64,
    pub name: String,
    pub rrule: String,
    pub enabled: bool,
    pub maintenance_window: i64,
}

impl From<&UpdateSchedule> for ScheduleItem {
    fn from(schedule: &UpdateSchedule) -> Self {
        Self {
            update_schedule_id: schedule.id,
            name: schedule.name.clone(),
            rrule: schedule.rrule.clone(),
            enabled: schedule.enabled,
            maintenance_window: schedule.maintenance_window,
        }
    }
}

pub struct SchedulesDataSource;

#[async_trait::async_trait]
impl DataSource for SchedulesDataSource {
    fn type_name(&self) -> &'static str {
        "stackit_server_update_schedules"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("All update schedules of a server.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "project_id",
                Attribute::required_string().with_validator(Validator::Uuid),
            )
            .with_attribute("region", Attribute::optional_string().optional_computed())
            .with_attribute(
                "server_id",
                Attribute::required_string().with_validator(Validator::Uuid),
            )
            .with_attribute(
                "items",
                Attribute::nested(
                    schedule_attributes(NestedAttributes::list()),
                    AttributeFlags::computed(),
                ),
            )
    }

    fn is_beta(&self) -> bool {
        true
    }

    async fn read(&self, ctx: &ProviderData, config: Value) -> Result<Value> {
        let mut model: SchedulesModel = decode(config)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let server_id = required(&model.server_id, "server_id")?.clone();
        let region = model
            .region
            .clone()
            .unwrap_or_else(|| ctx.default_region().to_string());

        let schedules = ctx
            .server_update()
            .list_schedules(&project_id, &region, &server_id)
            .await?;
        model.id = Some(import::build_id(&[&project_id, &region, &server_id]));
        model.region = Some(region);
        model.items = Some(schedules.iter().map(ScheduleItem::from).collect());
        encode(&model)
    }
}
