//! Per-type resource and data source seams.
//!
//! Each STACKIT product module implements [`Resource`] or [`DataSource`] for
//! its types; [`crate::provider::StackitProvider`] dispatches host calls to
//! them by type name.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::schema::{AttributeFlags, Diagnostic, Schema};
use crate::validation;

/// A managed resource with a full CRUD lifecycle.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// The type name, e.g. `stackit_observability_instance`.
    fn type_name(&self) -> &'static str;

    /// The attribute schema.
    fn schema(&self) -> Schema;

    /// Beta resources require the provider-level opt-in.
    fn is_beta(&self) -> bool {
        false
    }

    /// The positional fields of the import identifier, if import is supported.
    fn import_fields(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Seed the minimal state for an import identifier.
    ///
    /// The default splits the identifier along [`Resource::import_fields`]
    /// and stores every part as a string attribute plus `id`.
    fn import_state(&self, id: &str) -> Result<Value> {
        let fields = self.import_fields().ok_or_else(|| {
            ProviderError::Validation(format!(
                "Import not supported for resource type: {}",
                self.type_name()
            ))
        })?;
        let parts = import::parse_id(id, fields)?;
        let mut state = Map::new();
        state.insert("id".into(), Value::String(id.to_string()));
        for (field, part) in fields.iter().zip(parts) {
            state.insert((*field).to_string(), Value::String(part.to_string()));
        }
        Ok(Value::Object(state))
    }

    /// Validate configuration before planning.
    async fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Adjust the proposed state before the generic plan diff runs.
    async fn modify_plan(
        &self,
        ctx: &ProviderData,
        prior: Option<&Value>,
        planned: Value,
    ) -> Result<Value> {
        let _ = (ctx, prior);
        Ok(planned)
    }

    /// Create the remote object and return the resulting state.
    async fn create(&self, ctx: &ProviderData, planned: Value) -> Result<Value>;

    /// Refresh the state; `Ok(None)` drops the resource from state.
    async fn read(&self, ctx: &ProviderData, state: Value) -> Result<Option<Value>>;

    /// Apply the planned state to the remote object.
    async fn update(&self, ctx: &ProviderData, prior: Value, planned: Value) -> Result<Value>;

    /// Delete the remote object. A vanished object is not an error.
    async fn delete(&self, ctx: &ProviderData, state: Value) -> Result<()>;
}

/// A read-only projection of remote state.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// The type name, e.g. `stackit_scf_platform`.
    fn type_name(&self) -> &'static str;

    /// The attribute schema.
    fn schema(&self) -> Schema;

    /// Beta data sources require the provider-level opt-in.
    fn is_beta(&self) -> bool {
        false
    }

    /// Validate configuration.
    async fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Read the remote object described by `config`.
    async fn read(&self, ctx: &ProviderData, config: Value) -> Result<Value>;
}

/// Derive a data source schema from a resource schema.
///
/// The `lookup` attributes become required inputs; everything else is
/// computed and loses its validators.
pub fn data_source_schema(resource: Schema, lookup: &[&str]) -> Schema {
    let mut schema = resource;
    for (name, attr) in schema.attributes.iter_mut() {
        attr.force_new = false;
        attr.use_state_for_unknown = false;
        if lookup.contains(&name.as_str()) {
            attr.flags = AttributeFlags::required();
        } else {
            attr.flags = AttributeFlags {
                sensitive: attr.flags.sensitive,
                ..AttributeFlags::computed()
            };
            attr.validators.clear();
        }
    }
    schema
}

/// Decode a state or plan object into a typed model.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    if !value.is_object() {
        return Err(ProviderError::Mapping(format!(
            "expected an object, got {}",
            if value.is_null() { "null" } else { "a non-object value" }
        )));
    }
    Ok(serde_json::from_value(value)?)
}

/// Encode a typed model as a state object.
pub fn encode<T: Serialize>(model: &T) -> Result<Value> {
    Ok(serde_json::to_value(model)?)
}

/// Take a required attribute out of a model, failing closed when absent.
pub fn required<'a, T>(value: &'a Option<T>, attribute: &str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| ProviderError::Mapping(format!("required attribute '{}' is not set", attribute)))
}
