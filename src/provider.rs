//! The STACKIT provider: configuration, shared context and dispatch.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::logme::LogMeClient;
use crate::client::logs::LogsClient;
use crate::client::observability::ObservabilityClient;
use crate::client::scf::ScfClient;
use crate::client::serverupdate::ServerUpdateClient;
use crate::client::ApiClient;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::plan;
use crate::resource::{DataSource, Resource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::services;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Records which beta types have already passed the opt-in check.
///
/// The host may configure the provider more than once; the record lives on
/// the provider, not on the per-configure context, so the beta warning is
/// emitted once per type for the life of the provider.
#[derive(Debug, Default)]
pub struct BetaGate {
    checked: Mutex<HashSet<String>>,
}

impl BetaGate {
    /// Check that `type_name` may be used.
    ///
    /// Returns a warning the first time an enabled beta type is used, `None`
    /// afterwards, and an error when beta resources are not enabled.
    pub fn check(&self, type_name: &str, enabled: bool) -> Result<Option<Diagnostic>> {
        if !enabled {
            return Err(ProviderError::BetaNotEnabled(format!(
                "{} is in beta; set enable_beta_resources = true in the provider block \
                 or STACKIT_TF_ENABLE_BETA_RESOURCES=true to use it",
                type_name
            )));
        }
        let mut checked = self
            .checked
            .lock()
            .map_err(|_| ProviderError::Configuration("beta gate poisoned".into()))?;
        if !checked.insert(type_name.to_string()) {
            return Ok(None);
        }
        warn!(type_name, "using beta resource");
        Ok(Some(
            Diagnostic::warning(format!("{} is a beta resource", type_name)).with_detail(
                "Beta resources may change in backwards-incompatible ways between releases.",
            ),
        ))
    }
}

/// Everything a resource operation needs: configuration and API clients.
#[derive(Debug)]
pub struct ProviderData {
    config: ProviderConfig,
    http: reqwest::Client,
    beta: Arc<BetaGate>,
}

impl ProviderData {
    /// Build the context from a resolved configuration.
    pub fn new(config: ProviderConfig, beta: Arc<BetaGate>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stackit-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http, beta })
    }

    /// The resolved provider configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The region to use when a resource does not set one.
    pub fn default_region(&self) -> &str {
        &self.config.region
    }

    fn api(&self, base: &reqwest::Url) -> ApiClient {
        ApiClient::new(
            self.http.clone(),
            base.clone(),
            self.config.service_account_token.clone(),
        )
    }

    /// Client for the observability API.
    pub fn observability(&self) -> ObservabilityClient {
        ObservabilityClient::new(self.api(&self.config.observability_endpoint))
    }

    /// Client for the LogMe API.
    pub fn logme(&self) -> LogMeClient {
        LogMeClient::new(self.api(&self.config.logme_endpoint))
    }

    /// Client for the Logs API.
    pub fn logs(&self) -> LogsClient {
        LogsClient::new(self.api(&self.config.logs_endpoint))
    }

    /// Client for the SCF API.
    pub fn scf(&self) -> ScfClient {
        ScfClient::new(self.api(&self.config.scf_endpoint))
    }

    /// Client for the server update API.
    pub fn server_update(&self) -> ServerUpdateClient {
        ServerUpdateClient::new(self.api(&self.config.server_update_endpoint))
    }

    /// Run the beta opt-in check for `type_name`.
    pub fn check_beta(&self, type_name: &str) -> Result<Option<Diagnostic>> {
        self.beta.check(type_name, self.config.enable_beta_resources)
    }
}

/// The STACKIT provider.
pub struct StackitProvider {
    resources: HashMap<&'static str, Box<dyn Resource>>,
    data_sources: HashMap<&'static str, Box<dyn DataSource>>,
    data: RwLock<Option<Arc<ProviderData>>>,
    beta: Arc<BetaGate>,
}

impl Default for StackitProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StackitProvider {
    /// Create a provider serving every STACKIT resource and data source.
    pub fn new() -> Self {
        let resources = services::resources()
            .into_iter()
            .map(|r| (r.type_name(), r))
            .collect();
        let data_sources = services::data_sources()
            .into_iter()
            .map(|d| (d.type_name(), d))
            .collect();
        Self {
            resources,
            data_sources,
            data: RwLock::new(None),
            beta: Arc::new(BetaGate::default()),
        }
    }

    async fn context(&self) -> Result<Arc<ProviderData>> {
        self.data.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".into())
        })
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource> {
        self.data_sources
            .get(data_source_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    /// Context for an operation on `type_name`, after the beta check.
    async fn context_for(
        &self,
        type_name: &str,
        beta: bool,
    ) -> Result<(Arc<ProviderData>, Option<Diagnostic>)> {
        let ctx = self.context().await?;
        let warning = if beta { ctx.check_beta(type_name)? } else { None };
        Ok((ctx, warning))
    }
}

#[async_trait::async_trait]
impl ProviderService for StackitProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if diagnostics.is_empty() {
            if let Err(err) = ProviderConfig::from_value(config) {
                diagnostics.extend(err.into_diagnostics());
            }
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all, name = "provider.configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>> {
        let diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(ProviderError::Diagnostics(diagnostics));
        }
        let config = ProviderConfig::from_value(config)?;
        debug!(config = ?config, "configuring provider");
        let data = ProviderData::new(config, self.beta.clone())?;
        *self.data.write().await = Some(Arc::new(data));
        info!("provider configured");
        Ok(vec![])
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>> {
        Ok(self.resource(resource_type)?.validate(&config).await)
    }

    #[instrument(skip(self, prior_state, proposed_state, _config), name = "provider.plan")]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult> {
        let resource = self.resource(resource_type)?;
        if proposed_state.is_null() {
            return Ok(plan::plan_destroy(&prior_state.unwrap_or(Value::Null)));
        }

        let diagnostics = resource.validate(&proposed_state).await;
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(ProviderError::Diagnostics(diagnostics));
        }

        let (ctx, warning) = self.context_for(resource_type, resource.is_beta()).await?;
        let planned = resource
            .modify_plan(&ctx, prior_state.as_ref(), proposed_state)
            .await?;
        let result = plan::plan_changes(&resource.schema(), prior_state.as_ref(), planned);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "plan computed"
        );
        Ok(result.with_diagnostics(diagnostics.into_iter().chain(warning).collect()))
    }

    #[instrument(skip(self, planned_state), name = "provider.create")]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value> {
        let resource = self.resource(resource_type)?;
        let (ctx, _) = self.context_for(resource_type, resource.is_beta()).await?;
        match resource.create(&ctx, planned_state).await {
            Ok(state) => {
                info!("resource created");
                Ok(state)
            },
            Err(err) => {
                if err.partial_state().is_some() {
                    warn!(error = %err, "resource created remotely but not completed, keeping it as tainted");
                }
                Err(err)
            },
        }
    }

    #[instrument(skip(self, current_state), name = "provider.read")]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>> {
        let resource = self.resource(resource_type)?;
        let (ctx, _) = self.context_for(resource_type, resource.is_beta()).await?;
        let state = resource.read(&ctx, current_state).await?;
        if state.is_none() {
            warn!("resource no longer exists remotely, removing it from state");
        }
        Ok(state)
    }

    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value> {
        let resource = self.resource(resource_type)?;
        let (ctx, _) = self.context_for(resource_type, resource.is_beta()).await?;
        let state = resource.update(&ctx, prior_state, planned_state).await?;
        info!("resource updated");
        Ok(state)
    }

    #[instrument(skip(self, current_state), name = "provider.delete")]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<()> {
        let resource = self.resource(resource_type)?;
        let (ctx, _) = self.context_for(resource_type, resource.is_beta()).await?;
        resource.delete(&ctx, current_state).await?;
        info!("resource deleted");
        Ok(())
    }

    #[instrument(skip(self), name = "provider.import")]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>> {
        let resource = self.resource(resource_type)?;
        let state = resource.import_state(id)?;
        info!("resource import seeded");
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>> {
        Ok(self.data_source(data_source_type)?.validate(&config).await)
    }

    #[instrument(skip(self, config), name = "provider.read_data_source")]
    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value> {
        let data_source = self.data_source(data_source_type)?;
        let diagnostics = data_source.validate(&config).await;
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(ProviderError::Diagnostics(diagnostics));
        }
        let (ctx, _) = self
            .context_for(data_source_type, data_source.is_beta())
            .await?;
        data_source.read(&ctx, config).await
    }
}
