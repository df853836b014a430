//! STACKIT provider
//!
//! This crate implements an infrastructure-as-code provider for a subset of
//! the STACKIT cloud: Observability, Server Update, Cloud Foundry (SCF) and
//! LogMe. A host drives it through the [`ProviderService`] trait, passing
//! configuration and state as JSON objects keyed by attribute name.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **Schema types**: Descriptions of the provider, resource and data source schemas
//! - **ProviderService trait**: The interface a host engine drives
//! - **StackitProvider**: The provider itself, dispatching to one handler per resource type
//! - **API clients**: Typed `reqwest` clients for each STACKIT service
//! - **Wait handlers**: Polling helpers for asynchronous API operations
//! - **Error types**: A single [`ProviderError`] surfaced as diagnostics
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```ignore
//! use stackit_provider::{init_logging, ProviderService, StackitProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     let provider = StackitProvider::new();
//!     provider
//!         .configure(json!({
//!             "service_account_token": "token",
//!             "enable_beta_resources": true,
//!         }))
//!         .await?;
//!
//!     let planned = json!({
//!         "project_id": "5c6b2a1e-2a0b-4a43-9c58-3a4d6a2f8f11",
//!         "name": "monitoring",
//!         "plan_name": "Observability-Monitoring-Medium-EU01",
//!     });
//!     let plan = provider
//!         .plan("stackit_observability_instance", None, planned.clone(), planned)
//!         .await?;
//!     let state = provider
//!         .create("stackit_observability_instance", plan.planned_state)
//!         .await?;
//!     println!("{}", state["id"]);
//!     Ok(())
//! }
//! ```
//!
//! # Resources
//!
//! | Type | Kind |
//! |------|------|
//! | `stackit_observability_instance` | resource, data source |
//! | `stackit_observability_credential` | resource |
//! | `stackit_server_update_schedule` | resource (beta), data source (beta) |
//! | `stackit_server_update_schedules` | data source (beta) |
//! | `stackit_scf_organization` | resource (beta) |
//! | `stackit_scf_platform` | data source (beta) |
//! | `stackit_logme_instance` | resource, data source |
//! | `stackit_logme_credential` | resource |
//! | `stackit_logs_instance` | resource (beta), data source (beta) |
//!
//! Beta types are rejected unless `enable_beta_resources` is set in the
//! provider configuration or `STACKIT_TF_ENABLE_BETA_RESOURCES=true` is exported.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod service;
pub mod services;
pub mod testing;
pub mod types;
pub mod validation;
pub mod wait;

// Re-export main types at crate root
pub use config::{ProviderConfig, WaitConfig};
pub use error::{ProviderError, Result};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{ProviderData, StackitProvider};
pub use resource::{DataSource, Resource};
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
