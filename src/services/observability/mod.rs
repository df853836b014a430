//! Observability: managed metrics, logs, traces and alerting.

pub mod alertconfig;
pub mod credential;
pub mod instance;

pub use credential::CredentialResource;
pub use instance::{InstanceDataSource, InstanceResource};
