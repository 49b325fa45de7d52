//! Installed workspace integrations and how actions look them up

mod store;
mod types;

pub use store::{InMemoryIntegrations, IntegrationRepository};
pub use types::{Integration, IntegrationId, IntegrationMetadata, OrganizationId, Project, Provider};
