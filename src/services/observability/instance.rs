//! `stackit_observability_instance` resource and data source.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::alertconfig::{self, AlertConfigModel, AlertConfigState};
use crate::client::found;
use crate::client::observability::{
    CreateInstancePayload, GetInstanceResponse, ObservabilityClient, Plan, RetentionConfig,
    UpdateInstancePayload, STATUS_CREATE_FAILED, STATUS_CREATE_SUCCEEDED, STATUS_DELETE_FAILED,
    STATUS_DELETE_SUCCEEDED, STATUS_UPDATE_FAILED, STATUS_UPDATE_SUCCEEDED,
};
use crate::config::WaitConfig;
use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::resource::{data_source_schema, decode, encode, required, DataSource, Resource};
use crate::schema::{Attribute, Diagnostic, Schema, Validator};
use crate::wait::{self, Poll};

const TYPE_NAME: &str = "stackit_observability_instance";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub instance_id: Option<String>,
    pub name: Option<String>,
    pub plan_name: Option<String>,
    pub plan_id: Option<String>,
    pub parameters: Option<BTreeMap<String, String>>,
    pub dashboard_url: Option<String>,
    pub is_updatable: Option<bool>,
    pub grafana_url: Option<String>,
    pub grafana_public_read_access: Option<bool>,
    pub grafana_initial_admin_user: Option<String>,
    pub grafana_initial_admin_password: Option<String>,
    pub metrics_url: Option<String>,
    pub metrics_push_url: Option<String>,
    pub targets_url: Option<String>,
    pub alerting_url: Option<String>,
    pub logs_url: Option<String>,
    pub logs_push_url: Option<String>,
    pub jaeger_traces_url: Option<String>,
    pub jaeger_ui_url: Option<String>,
    pub otlp_traces_url: Option<String>,
    pub zipkin_spans_url: Option<String>,
    pub metrics_retention_days: Option<i64>,
    pub metrics_retention_days_5m_downsampling: Option<i64>,
    pub metrics_retention_days_1h_downsampling: Option<i64>,
    pub logs_retention_days: Option<i64>,
    pub traces_retention_days: Option<i64>,
    pub acl: Option<BTreeSet<String>>,
    pub alert_config: Option<AlertConfigModel>,
}

impl InstanceModel {
    fn metrics_retention(&self) -> [Option<i64>; 3] {
        [
            self.metrics_retention_days,
            self.metrics_retention_days_5m_downsampling,
            self.metrics_retention_days_1h_downsampling,
        ]
    }
}

fn supports_alerting(plan: &Plan) -> bool {
    plan.alert_rules > 0 && plan.alert_receivers > 0
}

fn supports_metrics(plan: &Plan) -> bool {
    plan.total_metric_samples > 0
}

fn supports_logs(plan: &Plan) -> bool {
    plan.logs_storage > 0
}

fn supports_traces(plan: &Plan) -> bool {
    plan.traces_storage > 0
}

/// Find a plan by its display name.
pub fn find_plan<'a>(plans: &'a [Plan], name: &str) -> Result<&'a Plan> {
    plans.iter().find(|p| p.name == name).ok_or_else(|| {
        let available = plans.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ");
        ProviderError::attribute(
            "plan_name",
            "Invalid plan name",
            format!("Couldn't find plan {:?}; available plans: {}", name, available),
        )
    })
}

/// Reject configuration the selected plan cannot serve.
pub fn check_capabilities(model: &InstanceModel, plan: &Plan) -> Result<()> {
    let mut diagnostics = Vec::new();
    let mut reject = |attribute: &str, capability: &str| {
        diagnostics.push(
            Diagnostic::error(format!("Plan {:?} does not support {}", plan.name, capability))
                .with_detail(format!(
                    "Remove '{}' or choose a plan that supports {}.",
                    attribute, capability
                ))
                .with_attribute(attribute),
        );
    };

    if model.alert_config.is_some() && !supports_alerting(plan) {
        reject("alert_config", "alerting");
    }
    if !supports_metrics(plan) {
        let names = [
            "metrics_retention_days",
            "metrics_retention_days_5m_downsampling",
            "metrics_retention_days_1h_downsampling",
        ];
        for (name, value) in names.iter().zip(model.metrics_retention()) {
            if value.is_some() {
                reject(*name, "metrics storage");
            }
        }
    }
    if model.logs_retention_days.is_some() && !supports_logs(plan) {
        reject("logs_retention_days", "logs storage");
    }
    if model.traces_retention_days.is_some() && !supports_traces(plan) {
        reject("traces_retention_days", "traces storage");
    }

    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::Diagnostics(diagnostics))
    }
}

/// Parse a retention like `90d` or `720h` into whole days.
fn retention_days(attribute: &str, value: &str) -> Result<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = if let Some(days) = value.strip_suffix('d') {
        days.parse::<i64>().ok()
    } else if let Some(hours) = value.strip_suffix('h') {
        hours.parse::<i64>().ok().map(|h| h / 24)
    } else {
        None
    };
    parsed.map(Some).ok_or_else(|| {
        ProviderError::Mapping(format!("{}: unexpected retention {:?}", attribute, value))
    })
}

fn hours(days: i64) -> RetentionConfig {
    RetentionConfig {
        retention: format!("{}h", days * 24),
    }
}

/// Build the update payload the model would send.
pub fn to_update_payload(model: &InstanceModel, plan_id: &str) -> UpdateInstancePayload {
    UpdateInstancePayload {
        name: model.name.clone(),
        plan_id: plan_id.to_string(),
        parameter: model.parameters.clone(),
    }
}

/// Copy the fields of an API instance into the model.
pub fn map_instance(model: &mut InstanceModel, instance: &GetInstanceResponse) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?.clone();
    if instance.id.is_empty() {
        return Err(ProviderError::Mapping("instance id not present in response".into()));
    }
    model.id = Some(import::build_id(&[&project_id, &instance.id]));
    model.instance_id = Some(instance.id.clone());
    model.name = instance.name.clone();
    model.plan_id = Some(instance.plan_id.clone());
    model.plan_name = Some(instance.plan_name.clone());
    model.parameters = instance.parameters.clone().filter(|p| !p.is_empty());
    model.dashboard_url = instance.dashboard_url.clone();
    model.is_updatable = instance.is_updatable;

    let details = instance.instance.clone().unwrap_or_default();
    model.grafana_url = details.grafana_url;
    model.grafana_public_read_access = details.grafana_public_read_access;
    model.grafana_initial_admin_user = details.grafana_admin_user;
    if details.grafana_admin_password.is_some() {
        model.grafana_initial_admin_password = details.grafana_admin_password;
    }
    model.metrics_url = details.metrics_url;
    model.metrics_push_url = details.push_metrics_url;
    model.targets_url = details.targets_url;
    model.alerting_url = details.alerting_url;
    model.logs_url = details.logs_url;
    model.logs_push_url = details.logs_push_url;
    model.jaeger_traces_url = details.jaeger_traces_url;
    model.jaeger_ui_url = details.jaeger_ui_url;
    model.otlp_traces_url = details.otlp_traces_url;
    model.zipkin_spans_url = details.zipkin_spans_url;
    Ok(())
}

async fn wait_for_status(
    client: &ObservabilityClient,
    config: WaitConfig,
    project_id: &str,
    instance_id: &str,
    operation: &str,
    succeeded: &str,
    failed: &str,
) -> Result<()> {
    wait::wait_for(operation, config, move || async move {
        let instance = client.get_instance(project_id, instance_id).await?;
        match instance.status.as_str() {
            status if status == succeeded => Ok(Poll::Done(())),
            status if status == failed => Err(wait::failed(operation, status)),
            status => Ok(Poll::Pending(status.to_string())),
        }
    })
    .await
}

/// The plan an instance runs on. Its capabilities decide which settings exist.
fn plan_by_id<'a>(plans: &'a [Plan], plan_id: &str) -> Result<&'a Plan> {
    plans.iter().find(|p| p.plan_id == plan_id).ok_or_else(|| {
        ProviderError::Mapping(format!(
            "instance plan {:?} is not among the project's plans",
            plan_id
        ))
    })
}

/// Re-read the instance and its settings; `None` when it is gone.
async fn refresh(client: &ObservabilityClient, mut model: InstanceModel) -> Result<Option<InstanceModel>> {
    let project_id = required(&model.project_id, "project_id")?.clone();
    let instance_id = required(&model.instance_id, "instance_id")?.clone();

    let Some(instance) = found(client.get_instance(&project_id, &instance_id).await)? else {
        return Ok(None);
    };
    if instance.status == STATUS_DELETE_SUCCEEDED {
        return Ok(None);
    }
    map_instance(&mut model, &instance)?;

    let plans = client.list_plans(&project_id).await?;
    let plan = plan_by_id(&plans, &instance.plan_id)?;

    let acl = client.get_acl(&project_id, &instance_id).await?;
    model.acl = if acl.is_empty() { None } else { Some(acl.into_iter().collect()) };

    if supports_metrics(plan) {
        let retention = client.get_metrics_retention(&project_id, &instance_id).await?;
        model.metrics_retention_days =
            retention_days("metrics_retention_days", &retention.metrics_retention_time_raw)?;
        model.metrics_retention_days_5m_downsampling = retention_days(
            "metrics_retention_days_5m_downsampling",
            &retention.metrics_retention_time_5m,
        )?;
        model.metrics_retention_days_1h_downsampling = retention_days(
            "metrics_retention_days_1h_downsampling",
            &retention.metrics_retention_time_1h,
        )?;
    }
    if supports_logs(plan) {
        let logs = client.get_logs_config(&project_id, &instance_id).await?;
        model.logs_retention_days = retention_days("logs_retention_days", &logs.retention)?;
    }
    if supports_traces(plan) {
        let traces = client.get_traces_config(&project_id, &instance_id).await?;
        model.traces_retention_days = retention_days("traces_retention_days", &traces.retention)?;
    }
    if supports_alerting(plan) {
        let response = client.get_alert_config(&project_id, &instance_id).await?;
        model.alert_config =
            AlertConfigState::from_response(&response, model.alert_config.as_ref())?.into_model();
    } else {
        model.alert_config = None;
    }

    Ok(Some(model))
}

/// Push ACL, retention and alert settings that differ from `prior`.
async fn apply_settings(
    client: &ObservabilityClient,
    plan: &Plan,
    prior: Option<&InstanceModel>,
    model: &InstanceModel,
) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    let instance_id = required(&model.instance_id, "instance_id")?;

    if model.acl.as_ref() != prior.and_then(|p| p.acl.as_ref()) {
        debug!(%instance_id, "updating ACL");
        client
            .update_acl(
                project_id,
                instance_id,
                model.acl.iter().flatten().cloned().collect(),
            )
            .await?;
    }

    let metrics = model.metrics_retention();
    if supports_metrics(plan)
        && metrics.iter().any(Option::is_some)
        && Some(metrics) != prior.map(InstanceModel::metrics_retention)
    {
        let mut retention = client.get_metrics_retention(project_id, instance_id).await?;
        let [raw, five_minutes, one_hour] = metrics;
        if let Some(days) = raw {
            retention.metrics_retention_time_raw = format!("{}d", days);
        }
        if let Some(days) = five_minutes {
            retention.metrics_retention_time_5m = format!("{}d", days);
        }
        if let Some(days) = one_hour {
            retention.metrics_retention_time_1h = format!("{}d", days);
        }
        client
            .update_metrics_retention(project_id, instance_id, &retention)
            .await?;
    }

    if let Some(days) = model.logs_retention_days {
        if supports_logs(plan) && prior.and_then(|p| p.logs_retention_days) != Some(days) {
            client
                .update_logs_config(project_id, instance_id, &hours(days))
                .await?;
        }
    }
    if let Some(days) = model.traces_retention_days {
        if supports_traces(plan) && prior.and_then(|p| p.traces_retention_days) != Some(days) {
            client
                .update_traces_config(project_id, instance_id, &hours(days))
                .await?;
        }
    }

    let prior_alert = prior.and_then(|p| p.alert_config.as_ref());
    if supports_alerting(plan) && model.alert_config.as_ref() != prior_alert {
        let state = AlertConfigState::from_plan(model.alert_config.clone(), prior_alert);
        if let Some(payload) = state.to_payload()? {
            debug!(%instance_id, "updating alert config");
            client
                .update_alert_config(project_id, instance_id, &payload)
                .await?;
        }
    }
    Ok(())
}

fn gone(project_id: &str, instance_id: &str) -> ProviderError {
    ProviderError::NotFound(format!(
        "observability instance {}",
        import::build_id(&[project_id, instance_id])
    ))
}

pub struct InstanceResource;

#[async_trait::async_trait]
impl Resource for InstanceResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let computed = |description: &str| {
            Attribute::computed_string()
                .with_use_state_for_unknown()
                .with_description(description)
        };
        let retention = |description: &str| {
            Attribute::optional_int64()
                .optional_computed()
                .with_use_state_for_unknown()
                .with_description(description)
        };

        Schema::v0()
            .with_description("Observability instance: managed metrics, logs, traces and alerting.")
            .with_attribute("id", computed("Identifier `project_id,instance_id`."))
            .with_attribute(
                "project_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_validator(Validator::Uuid)
                    .with_description("STACKIT project ID the instance belongs to."),
            )
            .with_attribute("instance_id", computed("The observability instance ID."))
            .with_attribute(
                "name",
                Attribute::required_string().with_validator(Validator::LengthAtLeast(1)),
            )
            .with_attribute(
                "plan_name",
                Attribute::required_string()
                    .with_description("Name of the service plan, e.g. `Observability-Monitoring-Medium-EU01`."),
            )
            .with_attribute("plan_id", Attribute::computed_string())
            .with_attribute("parameters", Attribute::optional_string_map())
            .with_attribute("dashboard_url", computed("URL of the instance dashboard."))
            .with_attribute("is_updatable", Attribute::computed_bool())
            .with_attribute("grafana_url", computed("Grafana URL."))
            .with_attribute("grafana_public_read_access", Attribute::computed_bool())
            .with_attribute("grafana_initial_admin_user", computed("Initial Grafana admin user."))
            .with_attribute(
                "grafana_initial_admin_password",
                Attribute::computed_string().with_use_state_for_unknown().sensitive(),
            )
            .with_attribute("metrics_url", computed("Metrics query URL."))
            .with_attribute("metrics_push_url", computed("Metrics push URL."))
            .with_attribute("targets_url", computed("Scrape targets URL."))
            .with_attribute("alerting_url", computed("Alerting URL."))
            .with_attribute("logs_url", computed("Logs query URL."))
            .with_attribute("logs_push_url", computed("Logs push URL."))
            .with_attribute("jaeger_traces_url", computed("Jaeger traces URL."))
            .with_attribute("jaeger_ui_url", computed("Jaeger UI URL."))
            .with_attribute("otlp_traces_url", computed("OTLP traces URL."))
            .with_attribute("zipkin_spans_url", computed("Zipkin spans URL."))
            .with_attribute(
                "metrics_retention_days",
                retention("Retention of raw metrics, in days."),
            )
            .with_attribute(
                "metrics_retention_days_5m_downsampling",
                retention("Retention of 5m downsampled metrics, in days."),
            )
            .with_attribute(
                "metrics_retention_days_1h_downsampling",
                retention("Retention of 1h downsampled metrics, in days."),
            )
            .with_attribute("logs_retention_days", retention("Retention of logs, in days."))
            .with_attribute("traces_retention_days", retention("Retention of traces, in days."))
            .with_attribute(
                "acl",
                Attribute::optional_string_set()
                    .with_validator(Validator::Cidr)
                    .with_description("CIDR ranges allowed to access the instance."),
            )
            .with_attribute("alert_config", alertconfig::schema_attribute())
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
        if let Some(alert_config) = &model.alert_config {
            alertconfig::check_route_depth(alert_config)?;
        }
        let project_id = required(&model.project_id, "project_id")?;
        let plans = ctx.observability().list_plans(project_id).await?;
        let plan = find_plan(&plans, required(&model.plan_name, "plan_name")?)?;
        check_capabilities(&model, plan)?;
        model.plan_id = Some(plan.plan_id.clone());
        encode(&model)
    }

    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value> {
        let mut model: InstanceModel = decode(planned)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let client = ctx.observability();

        let plans = client.list_plans(&project_id).await?;
        let plan = find_plan(&plans, required(&model.plan_name, "plan_name")?)?.clone();
        check_capabilities(&model, &plan)?;

        let payload = CreateInstancePayload {
            name: model.name.clone(),
            plan_id: plan.plan_id.clone(),
            parameter: model.parameters.clone(),
        };
        let instance_id = client.create_instance(&project_id, &payload).await?.instance_id;
        info!(%project_id, %instance_id, "observability instance requested");

        model.instance_id = Some(instance_id.clone());
        model.id = Some(import::build_id(&[&project_id, &instance_id]));
        model.plan_id = Some(plan.plan_id.clone());
        let seeded = encode(&model)?;

        let finished = async {
            wait_for_status(
                &client,
                ctx.config().wait,
                &project_id,
                &instance_id,
                "observability instance creation",
                STATUS_CREATE_SUCCEEDED,
                STATUS_CREATE_FAILED,
            )
            .await?;
            apply_settings(&client, &plan, None, &model).await?;
            refresh(&client, model)
                .await?
                .ok_or_else(|| gone(&project_id, &instance_id))
        };
        let model = finished.await.map_err(|err| err.with_state(seeded))?;
        encode(&model)
    }

    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>> {
        let model: InstanceModel = decode(state)?;
        match refresh(&ctx.observability(), model).await? {
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
        let client = ctx.observability();

        let plans = client.list_plans(&project_id).await?;
        let plan = find_plan(&plans, required(&model.plan_name, "plan_name")?)?.clone();
        check_capabilities(&model, &plan)?;

        let payload = to_update_payload(&model, &plan.plan_id);
        let previous = to_update_payload(&prior, prior.plan_id.as_deref().unwrap_or_default());
        if payload == previous {
            debug!(%instance_id, "instance payload unchanged, skipping update");
        } else {
            client.update_instance(&project_id, &instance_id, &payload).await?;
            info!(%project_id, %instance_id, "observability instance update requested");
            wait_for_status(
                &client,
                ctx.config().wait,
                &project_id,
                &instance_id,
                "observability instance update",
                STATUS_UPDATE_SUCCEEDED,
                STATUS_UPDATE_FAILED,
            )
            .await?;
        }

        apply_settings(&client, &plan, Some(&prior), &model).await?;

        let model = refresh(&client, model)
            .await?
            .ok_or_else(|| gone(&project_id, &instance_id))?;
        encode(&model)
    }

    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()> {
        let model: InstanceModel = decode(state)?;
        let project_id = required(&model.project_id, "project_id")?;
        let instance_id = required(&model.instance_id, "instance_id")?;
        let client = ctx.observability();

        if found(client.delete_instance(project_id, instance_id).await)?.is_none() {
            debug!(%instance_id, "instance already gone");
            return Ok(());
        }

        let operation = "observability instance deletion";
        let client = &client;
        wait::wait_for(operation, ctx.config().wait, move || async move {
            let Some(instance) = found(client.get_instance(project_id, instance_id).await)? else {
                return Ok(Poll::Done(()));
            };
            match instance.status.as_str() {
                STATUS_DELETE_SUCCEEDED => Ok(Poll::Done(())),
                STATUS_DELETE_FAILED => Err(wait::failed(operation, STATUS_DELETE_FAILED)),
                status => Ok(Poll::Pending(status.to_string())),
            }
        })
        .await?;
        info!(%project_id, %instance_id, "observability instance deleted");
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
        let model = refresh(&ctx.observability(), model)
            .await?
            .ok_or_else(|| gone(&project_id, &instance_id))?;
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::observability::InstanceDetails;
    use crate::validation;
    use serde_json::json;

    fn plan(name: &str, alerting: bool, storage: bool) -> Plan {
        let n = if storage { 1 } else { 0 };
        Plan {
            plan_id: format!("{}-id", name),
            name: name.to_string(),
            alert_rules: if alerting { 10 } else { 0 },
            alert_receivers: if alerting { 5 } else { 0 },
            total_metric_samples: n,
            logs_storage: n,
            traces_storage: n,
        }
    }

    #[test]
    fn test_find_plan() {
        let plans = vec![plan("Basic", false, true), plan("Monitoring", true, true)];
        assert_eq!(find_plan(&plans, "Monitoring").unwrap().plan_id, "Monitoring-id");
        let err = find_plan(&plans, "Missing").unwrap_err();
        assert!(err.to_string().contains("plan_name"));
    }

    #[test]
    fn test_unknown_instance_plan_is_a_mapping_error() {
        let plans = vec![plan("Monitoring", true, true)];
        assert_eq!(plan_by_id(&plans, "Monitoring-id").unwrap().name, "Monitoring");
        let err = plan_by_id(&plans, "retired-id").unwrap_err();
        assert!(matches!(err, ProviderError::Mapping(_)));
        assert!(err.to_string().contains("retired-id"));
    }

    #[test]
    fn test_capabilities_reject_unsupported_fields() {
        let model = InstanceModel {
            alert_config: Some(AlertConfigModel::default()),
            metrics_retention_days: Some(90),
            logs_retention_days: Some(30),
            ..Default::default()
        };
        let err = check_capabilities(&model, &plan("Free", false, false)).unwrap_err();
        let diagnostics = err.into_diagnostics();
        let attributes: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(
            attributes,
            vec!["alert_config", "metrics_retention_days", "logs_retention_days"]
        );

        assert!(check_capabilities(&model, &plan("Monitoring", true, true)).is_ok());
    }

    #[test]
    fn test_retention_days() {
        assert_eq!(retention_days("x", "90d").unwrap(), Some(90));
        assert_eq!(retention_days("x", "720h").unwrap(), Some(30));
        assert_eq!(retention_days("x", "").unwrap(), None);
        assert!(retention_days("x", "ninety").is_err());
        assert_eq!(hours(30).retention, "720h");
    }

    #[test]
    fn test_map_instance_then_update_payload_round_trips() {
        let response = GetInstanceResponse {
            id: "iid".into(),
            name: Some("monitoring".into()),
            plan_id: "pid".into(),
            plan_name: "Monitoring".into(),
            status: STATUS_CREATE_SUCCEEDED.into(),
            parameters: Some(BTreeMap::from([("sgw_acl".to_string(), "10.0.0.0/8".to_string())])),
            instance: Some(InstanceDetails {
                grafana_url: Some("https://grafana".into()),
                grafana_admin_password: Some("pw".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut model = InstanceModel {
            project_id: Some("pid-1".into()),
            ..Default::default()
        };
        map_instance(&mut model, &response).unwrap();
        assert_eq!(model.id.as_deref(), Some("pid-1,iid"));
        assert_eq!(model.grafana_initial_admin_password.as_deref(), Some("pw"));

        let payload = to_update_payload(&model, model.plan_id.as_deref().unwrap());
        assert_eq!(payload.name, response.name);
        assert_eq!(payload.plan_id, response.plan_id);
        assert_eq!(payload.parameter, response.parameters);
    }

    #[test]
    fn test_map_instance_keeps_withheld_password() {
        let mut model = InstanceModel {
            project_id: Some("p".into()),
            grafana_initial_admin_password: Some("kept".into()),
            ..Default::default()
        };
        let response = GetInstanceResponse {
            id: "i".into(),
            ..Default::default()
        };
        map_instance(&mut model, &response).unwrap();
        assert_eq!(model.grafana_initial_admin_password.as_deref(), Some("kept"));
    }

    #[test]
    fn test_map_instance_fails_closed() {
        let mut model = InstanceModel::default();
        assert!(map_instance(&mut model, &GetInstanceResponse::default()).is_err());
    }

    #[test]
    fn test_schema_validation() {
        let schema = InstanceResource.schema();
        let config = json!({
            "project_id": "2e4b4d8a-6d3c-4b43-9a4c-1f3b4f3f0e0a",
            "name": "monitoring",
            "plan_name": "Observability-Monitoring-Medium-EU01",
            "acl": ["10.0.0.0/8"]
        });
        assert!(validation::is_valid(&schema, &config));
        assert!(!validation::is_valid(&schema, &json!({"project_id": "nope", "name": "x", "plan_name": "y"})));
    }

    #[test]
    fn test_data_source_schema_lookup_keys() {
        let schema = InstanceDataSource.schema();
        assert!(schema.attributes["project_id"].flags.required);
        assert!(schema.attributes["instance_id"].flags.required);
        assert!(schema.attributes["name"].flags.computed);
        assert!(!schema.attributes["name"].flags.required);
    }
}
