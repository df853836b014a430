//! LogMe: managed log aggregation instances and their credentials.

pub mod credential;
pub mod instance;

pub use credential::CredentialResource;
pub use instance::{InstanceDataSource, InstanceResource};
