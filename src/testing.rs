//! Testing utilities for provider implementations.
//!
//! [`ProviderTester`] drives a `ProviderService` the way a host would, with
//! shortcuts for the usual plan/apply sequences. [`mock_config`] builds a
//! provider block that points every API at one mock server and polls fast.
//!
//! # Example
//!
//! ```ignore
//! use stackit_provider::testing::{mock_config, ProviderTester};
//! use stackit_provider::StackitProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_credential() {
//!     let server = wiremock::MockServer::start().await;
//!     let tester = ProviderTester::new(StackitProvider::new());
//!     tester.configure(mock_config(&server.uri())).await.unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("stackit_observability_credential", json!({
//!             "project_id": "...",
//!             "instance_id": "...",
//!         }))
//!         .await
//!         .unwrap();
//!     assert!(state.is_some());
//! }
//! ```

use crate::error::ProviderError;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use serde_json::{json, Value};

/// A provider block for tests: all endpoints on `base_url`, beta enabled,
/// and wait handlers polling every few milliseconds.
pub fn mock_config(base_url: &str) -> Value {
    json!({
        "region": "eu01",
        "service_account_token": "test-token",
        "observability_custom_endpoint": base_url,
        "logme_custom_endpoint": base_url,
        "logs_custom_endpoint": base_url,
        "scf_custom_endpoint": base_url,
        "server_update_custom_endpoint": base_url,
        "enable_beta_resources": true,
        "wait_poll_interval_ms": 5,
        "wait_timeout_secs": 5,
    })
}

/// Drives a [`ProviderService`] through the calls a host makes.
///
/// Methods mirror the service trait one to one. The `lifecycle_*` helpers
/// chain them the way an apply does: plan, then the write, then a refresh.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Configure the provider. Error diagnostics become [`TestError::Diagnostics`].
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        only_warnings(diagnostics)
    }

    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        only_warnings(diagnostics)
    }

    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        only_warnings(diagnostics)
    }

    /// Plan with no prior state. The config doubles as the proposed state.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior), config.clone(), config)
            .await
    }

    /// Plan removal: the host proposes a null state.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior), Value::Null, Value::Null)
            .await
    }

    pub async fn create(&self, resource_type: &str, planned: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned).await
    }

    /// Refresh; `None` means the object is gone and leaves state.
    pub async fn read(
        &self,
        resource_type: &str,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, state).await
    }

    pub async fn update(
        &self,
        resource_type: &str,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.update(resource_type, prior, planned).await
    }

    pub async fn delete(&self, resource_type: &str, state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, state).await
    }

    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    /// Plan, create, then refresh.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan against `prior`, update in place, then refresh.
    ///
    /// Fails with a validation error when the plan asks for replacement,
    /// since a host would destroy and create instead.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior: Value,
        config: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior.clone(), config)
            .await?;
        if plan.requires_replace {
            return Err(ProviderError::Validation(format!(
                "{} plan requires replacement",
                resource_type
            )));
        }
        let updated = self
            .update(resource_type, prior, plan.planned_state)
            .await?;
        self.read(resource_type, updated).await
    }

    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, state.clone()).await?;
        self.delete(resource_type, state).await
    }

    /// Import `id` and refresh the seeded state, as a host does after import.
    pub async fn lifecycle_import(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let mut imported = self.import_resource(resource_type, id).await?;
        let resource = imported.pop().ok_or_else(|| {
            ProviderError::Validation(format!("import of {} returned nothing", id))
        })?;
        self.read(resource_type, resource.state).await
    }
}

/// Failure of a tester call that reports diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("{}", render_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| {
            let mut line = format!("[{:?}] {}", d.severity, d.summary);
            if let Some(detail) = &d.detail {
                line.push_str(&format!(": {}", detail));
            }
            if let Some(attr) = &d.attribute {
                line.push_str(&format!(" (at {})", attr));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn only_warnings(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// What a plan is expected to do to an existing object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanShape {
    NoChanges,
    InPlace,
    Replace,
}

/// Assert the shape of `plan` and, for anything but [`PlanShape::NoChanges`],
/// that exactly `attributes` change.
pub fn assert_plan(plan: &PlanResult, shape: PlanShape, attributes: &[&str]) {
    let mut changed: Vec<&str> = plan.changes.iter().map(|c| c.path.as_str()).collect();
    changed.sort_unstable();
    let actual = match (changed.is_empty(), plan.requires_replace) {
        (true, _) => PlanShape::NoChanges,
        (false, false) => PlanShape::InPlace,
        (false, true) => PlanShape::Replace,
    };
    assert_eq!(actual, shape, "unexpected plan shape, changes: {:?}", changed);
    if shape != PlanShape::NoChanges {
        let mut expected = attributes.to_vec();
        expected.sort_unstable();
        assert_eq!(changed, expected, "unexpected changed attributes");
    }
}

/// Assert that diagnostics contain a warning with the given summary substring.
pub fn assert_warning_contains(diagnostics: &[Diagnostic], substring: &str) {
    let found = diagnostics
        .iter()
        .any(|d| d.severity == DiagnosticSeverity::Warning && d.summary.contains(substring));
    assert!(
        found,
        "expected a warning containing '{}', got: {:?}",
        substring,
        diagnostics.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error anchored at `attribute`.
pub fn assert_error_at(diagnostics: &[Diagnostic], attribute: &str) {
    let found = diagnostics
        .iter()
        .any(|d| d.is_error() && d.attribute.as_deref() == Some(attribute));
    assert!(
        found,
        "expected an error at '{}', got: {:?}",
        attribute,
        diagnostics
            .iter()
            .map(|d| (&d.summary, &d.attribute))
            .collect::<Vec<_>>()
    );
}
