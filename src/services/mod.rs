//! One module per STACKIT product.
//!
//! Every module owns the models, mappings and lifecycle of its resource and
//! data source types. [`resources`] and [`data_sources`] list every type the
//! provider serves.

pub mod logme;
pub mod logs;
pub mod observability;
pub mod scf;
pub mod serverupdate;

use crate::resource::{DataSource, Resource};

/// Every resource type served by the provider.
pub fn resources() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(observability::InstanceResource),
        Box::new(observability::CredentialResource),
        Box::new(serverupdate::ScheduleResource),
        Box::new(scf::OrganizationResource),
        Box::new(logme::InstanceResource),
        Box::new(logme::CredentialResource),
        Box::new(logs::InstanceResource),
    ]
}

/// Every data source type served by the provider.
pub fn data_sources() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(observability::InstanceDataSource),
        Box::new(serverupdate::ScheduleDataSource),
        Box::new(serverupdate::SchedulesDataSource),
        Box::new(scf::PlatformDataSource),
        Box::new(logme::InstanceDataSource),
        Box::new(logs::InstanceDataSource),
    ]
}
