//! SCF: STACKIT Cloud Foundry organizations and platforms.

pub mod organization;
pub mod platform;

pub use organization::OrganizationResource;
pub use platform::PlatformDataSource;
