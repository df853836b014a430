//! `stackit_logs_instance` resource and data source.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::found;
use crate::client::logs::{
    InstancePayload, LogsClient, LogsInstance, STATUS_ACTIVE, STATUS_DELETING, STATUS_RECONCILING,
};
use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::resource::{data_source_schema, decode, encode, required, DataSource, Resource};
use crate::schema::{Attribute, Schema, Validator};
use crate::wait::{self, Poll};

const TYPE_NAME: &str = "stackit_logs_instance";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub instance_id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub retention_days: Option<i64>,
    pub acl: Option<BTreeSet<String>>,
    pub status: Option<String>,
    pub created: Option<String>,
    pub datasource_url: Option<String>,
    pub ingest_url: Option<String>,
    pub ingest_otlp_url: Option<String>,
    pub query_url: Option<String>,
    pub query_range_url: Option<String>,
}

impl InstanceModel {
    fn region_or<'a>(&'a self, ctx: &'a ProviderData) -> &'a str {
        self.region.as_deref().unwrap_or_else(|| ctx.default_region())
    }
}

pub fn to_payload(model: &InstanceModel) -> Result<InstancePayload> {
    Ok(InstancePayload {
        display_name: required(&model.display_name, "display_name")?.clone(),
        retention_days: *required(&model.retention_days, "retention_days")?,
        description: model.description.clone(),
        acl: model.acl.iter().flatten().cloned().collect(),
    })
}

/// Copy an API instance into the model.
pub fn map_instance(model: &mut InstanceModel, region: &str, instance: &LogsInstance) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    if instance.id.is_empty() {
        return Err(ProviderError::Mapping("logs instance id not present in response".into()));
    }
    let retention_days = instance.retention_days.ok_or_else(|| {
        ProviderError::Mapping("logs instance retention days not present in response".into())
    })?;
    model.id = Some(import::build_id(&[project_id, region, &instance.id]));
    model.region = Some(region.to_string());
    model.instance_id = Some(instance.id.clone());
    model.display_name = Some(instance.display_name.clone());
    model.description = instance.description.clone().filter(|d| !d.is_empty());
    model.retention_days = Some(retention_days);
    model.acl = if instance.acl.is_empty() {
        None
    } else {
        Some(instance.acl.iter().cloned().collect())
    };
    model.status = Some(instance.status.clone());
    model.created = instance.created.clone();
    model.datasource_url = instance.datasource_url.clone();
    model.ingest_url = instance.ingest_url.clone();
    model.ingest_otlp_url = instance.ingest_otlp_url.clone();
    model.query_url = instance.query_url.clone();
    model.query_range_url = instance.query_range_url.clone();
    Ok(())
}

async fn wait_until_active(
    client: &LogsClient,
    ctx: &ProviderData,
    project_id: &str,
    region: &str,
    instance_id: &str,
    operation: &str,
) -> Result<LogsInstance> {
    wait::wait_for(operation, ctx.config().wait, move || async move {
        let instance = client.get_instance(project_id, region, instance_id).await?;
        match instance.status.as_str() {
            STATUS_ACTIVE => Ok(Poll::Done(instance)),
            STATUS_RECONCILING => Ok(Poll::Pending(instance.status)),
            status => Err(wait::failed(operation, status)),
        }
    })
    .await
}

fn gone(project_id: &str, region: &str, instance_id: &str) -> ProviderError {
    ProviderError::NotFound(format!(
        "logs instance {}",
        import::build_id(&[project_id, region, instance_id])
    ))
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
            .with_description("Regional log-service instance.")
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
                    .with_validator(Validator::NoSeparator)
                    .with_description("Defaults to the provider region."),
            )
            .with_attribute("instance_id", computed())
            .with_attribute(
                "display_name",
                Attribute::required_string().with_validator(Validator::LengthAtLeast(1)),
            )
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "retention_days",
                Attribute::required_int64()
                    .with_validator(Validator::Int64Between { min: 1, max: 365 })
                    .with_description("How long logs are kept."),
            )
            .with_attribute(
                "acl",
                Attribute::optional_string_set()
                    .with_validator(Validator::Cidr)
                    .with_description("CIDR ranges allowed to reach the instance."),
            )
            .with_attribute("status", Attribute::computed_string())
            .with_attribute("created", computed())
            .with_attribute("datasource_url", computed())
            .with_attribute("ingest_url", computed())
            .with_attribute("ingest_otlp_url", computed())
            .with_attribute("query_url", computed())
            .with_attribute("query_range_url", computed())
    }

    fn is_beta(&self) -> bool {
        true
    }

    fn import_fields(&self) -> Option<&'static [&'static str]> {
        Some(&["project_id", "region", "instance_id"])
    }

    async fn modify_plan(
        &self,
        ctx: &ProviderData,
        _prior: Option<&Value>,
        planned: Value,
    ) -> Result<Value> {
        let mut model: InstanceModel = decode(planned)?;
        if model.region.is_none() {
            model.region = Some(ctx.default_region().to_string());
        }
        encode(&model)
    }

    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value> {
        let mut model: InstanceModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let region = model.region_or(ctx).to_string();
        let client = ctx.logs();

        let created = client
            .create_instance(&project_id, &region, &to_payload(&model)?)
            .await?;
        let instance_id = created.id;
        info!(%project_id, %region, %instance_id, "logs instance requested");

        model.region = Some(region.clone());
        model.instance_id = Some(instance_id.clone());
        model.id = Some(import::build_id(&[&project_id, &region, &instance_id]));
        let seeded = encode(&model)?;

        let finished = async {
            let instance = wait_until_active(
                &client,
                ctx,
                &project_id,
                &region,
                &instance_id,
                "logs instance creation",
            )
            .await?;
            map_instance(&mut model, &region, &instance)?;
            encode(&model)
        };
        finished.await.map_err(|err| err.with_state(seeded))
    }

    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>> {
        let mut model: InstanceModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&model.instance_id, "instance_id")?.clone();
        let region = model.region_or(ctx).to_string();

        let instance = ctx.logs().get_instance(&project_id, &region, &instance_id).await;
        let Some(instance) = found(instance)? else {
            return Ok(None);
        };
        if instance.status == STATUS_DELETING {
            return Ok(None);
        }
        map_instance(&mut model, &region, &instance)?;
        Ok(Some(encode(&model)?))
    }

    async fn update(&self, ctx: &ProviderData, prior: Value, planned: Value) -> Result<Value> {
        let prior: InstanceModel = decode(prior)?;
        let mut model: InstanceModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&prior.instance_id, "instance_id")?.clone();
        let region = model.region_or(ctx).to_string();
        let client = ctx.logs();

        let payload = to_payload(&model)?;
        if to_payload(&prior).ok().as_ref() == Some(&payload) {
            debug!(%instance_id, "logs instance unchanged, skipping update");
        } else {
            client
                .update_instance(&project_id, &region, &instance_id, &payload)
                .await?;
            info!(%project_id, %instance_id, "logs instance update requested");
        }

        let instance = wait_until_active(
            &client,
            ctx,
            &project_id,
            &region,
            &instance_id,
            "logs instance update",
        )
        .await?;
        model.instance_id = Some(instance_id);
        map_instance(&mut model, &region, &instance)?;
        encode(&model)
    }

    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()> {
        let model: InstanceModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?;
        let instance_id = required(&model.instance_id, "instance_id")?;
        let region = model.region_or(ctx);
        let client = ctx.logs();

        if found(client.delete_instance(project_id, region, instance_id).await)?.is_none() {
            debug!(%instance_id, "logs instance already gone");
            return Ok(());
        }

        let client = &client;
        wait::wait_for("logs instance deletion", ctx.config().wait, move || async move {
            match found(client.get_instance(project_id, region, instance_id).await)? {
                None => Ok(Poll::Done(())),
                Some(instance) => Ok(Poll::Pending(instance.status)),
            }
        })
        .await?;
        info!(%project_id, %instance_id, "logs instance deleted");
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
            .with_attribute("region", Attribute::optional_string().optional_computed())
    }

    fn is_beta(&self) -> bool {
        true
    }

    async fn read(&self, ctx: &ProviderData, config: Value) -> Result<Value> {
        let mut model: InstanceModel = decode(config)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let instance_id = required(&model.instance_id, "instance_id")?.clone();
        let region = model.region_or(ctx).to_string();

        let instance = ctx.logs().get_instance(&project_id, &region, &instance_id).await;
        let instance = found(instance)?
            .filter(|i| i.status != STATUS_DELETING)
            .ok_or_else(|| gone(&project_id, &region, &instance_id))?;
        map_instance(&mut model, &region, &instance)?;
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation;
    use serde_json::json;

    fn instance() -> LogsInstance {
        LogsInstance {
            id: "i-1".into(),
            display_name: "audit".into(),
            description: Some(String::new()),
            retention_days: Some(30),
            acl: vec!["192.168.0.0/16".into(), "10.0.0.0/8".into()],
            status: STATUS_ACTIVE.into(),
            query_url: Some("https://query.example".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_map_instance_builds_regional_id() {
        let mut model = InstanceModel {
            project_id: Some("pid".into()),
            ..Default::default()
        };
        map_instance(&mut model, "eu01", &instance()).unwrap();
        assert_eq!(model.id.as_deref(), Some("pid,eu01,i-1"));
        assert_eq!(model.description, None);
        assert_eq!(
            model.acl.as_ref().map(|acl| acl.iter().cloned().collect::<Vec<_>>()),
            Some(vec!["10.0.0.0/8".to_string(), "192.168.0.0/16".to_string()])
        );

        let payload = to_payload(&model).unwrap();
        assert_eq!(payload.acl, vec!["10.0.0.0/8", "192.168.0.0/16"]);
        assert_eq!(payload.retention_days, 30);
    }

    #[test]
    fn test_map_fails_closed_without_retention() {
        let mut model = InstanceModel {
            project_id: Some("pid".into()),
            ..Default::default()
        };
        let mut response = instance();
        response.retention_days = None;
        assert!(matches!(
            map_instance(&mut model, "eu01", &response),
            Err(ProviderError::Mapping(_))
        ));
    }

    #[test]
    fn test_import_uses_regional_format() {
        let state = InstanceResource.import_state("pid,eu02,i-1").unwrap();
        assert_eq!(state["project_id"], "pid");
        assert_eq!(state["region"], "eu02");
        assert_eq!(state["instance_id"], "i-1");

        let err = InstanceResource.import_state("pid,i-1").unwrap_err();
        assert!(err.to_string().contains("[project_id],[region],[instance_id]"));
        assert!(InstanceResource.import_state("pid,,i-1").is_err());
    }

    #[test]
    fn test_schema_bounds() {
        let schema = InstanceResource.schema();
        let config = |days: i64| {
            json!({
                "project_id": "2e4b4d8a-6d3c-4b43-9a4c-1f3b4f3f0e0a",
                "display_name": "audit",
                "retention_days": days
            })
        };
        assert!(validation::is_valid(&schema, &config(30)));
        assert!(!validation::is_valid(&schema, &config(0)));
        assert!(!validation::is_valid(&schema, &config(366)));

        let mut comma_region = config(30);
        comma_region["region"] = json!("eu01,x");
        assert!(!validation::is_valid(&schema, &comma_region));
    }
}
