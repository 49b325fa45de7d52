use crate::error::{NotifyError, Result};
use crate::integrations::types::{Integration, IntegrationId, OrganizationId, Provider};
use dashmap::DashMap;

/// Lookup of installed integrations, scoped by provider and organization
pub trait IntegrationRepository: Send + Sync {
    /// Fails with [`NotifyError::IntegrationNotFound`] when the integration
    /// does not exist, is for another provider, or is not installed in the
    /// organization.
    fn get(
        &self,
        provider: Provider,
        organization_id: OrganizationId,
        id: IntegrationId,
    ) -> Result<Integration>;

    /// All integrations of a provider in an organization, ordered by id
    fn list(&self, provider: Provider, organization_id: OrganizationId) -> Vec<Integration>;
}

/// Process-local repository, also used by tests and the CLI
#[derive(Default)]
pub struct InMemoryIntegrations {
    integrations: DashMap<IntegrationId, Integration>,
}

impl InMemoryIntegrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, integration: Integration) {
        tracing::debug!(
            integration_id = %integration.id,
            provider = %integration.provider,
            "Registered integration"
        );
        self.integrations.insert(integration.id, integration);
    }

    pub fn remove(&self, id: IntegrationId) -> Option<Integration> {
        self.integrations.remove(&id).map(|(_, integration)| integration)
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }
}

impl IntegrationRepository for InMemoryIntegrations {
    fn get(
        &self,
        provider: Provider,
        organization_id: OrganizationId,
        id: IntegrationId,
    ) -> Result<Integration> {
        self.integrations
            .get(&id)
            .filter(|i| i.provider == provider && i.belongs_to(organization_id))
            .map(|i| i.value().clone())
            .ok_or_else(|| NotifyError::IntegrationNotFound {
                provider: provider.to_string(),
                id: id.0,
            })
    }

    fn list(&self, provider: Provider, organization_id: OrganizationId) -> Vec<Integration> {
        let mut found: Vec<Integration> = self
            .integrations
            .iter()
            .filter(|i| i.provider == provider && i.belongs_to(organization_id))
            .map(|i| i.value().clone())
            .collect();
        found.sort_by_key(|i| i.id);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::types::IntegrationMetadata;

    fn integration(id: u64, provider: Provider, org: u64) -> Integration {
        Integration {
            id: IntegrationId(id),
            provider,
            name: format!("workspace-{}", id),
            organization_ids: vec![OrganizationId(org)],
            metadata: IntegrationMetadata {
                access_token: format!("xoxb-{}", id),
                domain_name: None,
            },
        }
    }

    #[test]
    fn test_get_scopes_by_provider_and_organization() {
        let store = InMemoryIntegrations::new();
        store.insert(integration(1, Provider::Slack, 10));

        let found = store
            .get(Provider::Slack, OrganizationId(10), IntegrationId(1))
            .unwrap();
        assert_eq!(found.access_token(), "xoxb-1");

        assert!(matches!(
            store.get(Provider::Jira, OrganizationId(10), IntegrationId(1)),
            Err(NotifyError::IntegrationNotFound { .. })
        ));
        assert!(matches!(
            store.get(Provider::Slack, OrganizationId(11), IntegrationId(1)),
            Err(NotifyError::IntegrationNotFound { id: 1, .. })
        ));
    }

    #[test]
    fn test_list_is_ordered_and_filtered() {
        let store = InMemoryIntegrations::new();
        store.insert(integration(3, Provider::Slack, 10));
        store.insert(integration(1, Provider::Slack, 10));
        store.insert(integration(2, Provider::Jira, 10));
        store.insert(integration(4, Provider::Slack, 99));

        let ids: Vec<u64> = store
            .list(Provider::Slack, OrganizationId(10))
            .iter()
            .map(|i| i.id.0)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_remove() {
        let store = InMemoryIntegrations::new();
        store.insert(integration(1, Provider::Slack, 10));
        assert_eq!(store.len(), 1);

        assert!(store.remove(IntegrationId(1)).is_some());
        assert!(store.is_empty());
        assert!(store.remove(IntegrationId(1)).is_none());
    }
}
