//! Logs: regional log-service instances.

pub mod instance;

pub use instance::{InstanceDataSource, InstanceResource};
