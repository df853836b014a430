//! `stackit_scf_platform` data source.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::found;
use crate::client::scf::Platform;
use crate::error::{ProviderError, Result};
use crate::import;
use crate::provider::ProviderData;
use crate::resource::{decode, encode, required, DataSource};
use crate::schema::{Attribute, Schema, Validator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformModel {
    pub id: Option<String>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub platform_id: Option<String>,
    pub system_id: Option<String>,
    pub display_name: Option<String>,
    pub api_url: Option<String>,
    pub console_url: Option<String>,
}

/// Copy an API platform into the model.
pub fn map_platform(model: &mut PlatformModel, platform: &Platform) -> Result<()> {
    let project_id = required(&model.project_id, "project_id")?;
    if platform.guid.is_empty() {
        return Err(ProviderError::Mapping("platform guid not present in response".into()));
    }
    model.id = Some(import::build_id(&[project_id, &platform.region, &platform.guid]));
    model.region = Some(platform.region.clone());
    model.platform_id = Some(platform.guid.clone());
    model.system_id = Some(platform.system_id.clone());
    model.display_name = Some(platform.display_name.clone());
    model.api_url = Some(platform.api_url.clone());
    model.console_url = platform.console_url.clone();
    Ok(())
}

pub struct PlatformDataSource;

#[async_trait::async_trait]
impl DataSource for PlatformDataSource {
    fn type_name(&self) -> &'static str {
        "stackit_scf_platform"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Cloud Foundry platform of a region.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "project_id",
                Attribute::required_string().with_validator(Validator::Uuid),
            )
            .with_attribute("region", Attribute::optional_string().optional_computed())
            .with_attribute(
                "platform_id",
                Attribute::required_string().with_validator(Validator::Uuid),
            )
            .with_attribute("system_id", Attribute::computed_string())
            .with_attribute("display_name", Attribute::computed_string())
            .with_attribute("api_url", Attribute::computed_string())
            .with_attribute("console_url", Attribute::computed_string())
    }

    fn is_beta(&self) -> bool {
        true
    }

    async fn read(&self, ctx: &ProviderData, config: Value) -> Result<Value> {
        let mut model: PlatformModel = decode(config)?;
        let project_id = required(&model.project_id, "project_id")?.clone();
        let platform_id = required(&model.platform_id, "platform_id")?.clone();
        let region = model
            .region
            .clone()
            .unwrap_or_else(|| ctx.default_region().to_string());

        let platform = found(ctx.scf().get_platform(&project_id, &region, &platform_id).await)?
            .ok_or_else(|| ProviderError::NotFound(format!("SCF platform {}", platform_id)))?;
        map_platform(&mut model, &platform)?;
        encode(&model)
    }
}
