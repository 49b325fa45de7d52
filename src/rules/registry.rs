use crate::config::SlackConfig;
use crate::error::{NotifyError, Result};
use crate::integrations::IntegrationRepository;
use crate::rules::{JiraCreateTicketAction, NotificationAction, RuleContext, SlackNotifyAction};
use crate::slack::SlackClient;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Explicitly registered rule actions, keyed by action id
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Arc<dyn NotificationAction>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Slack and Jira actions
    pub fn with_builtin(
        integrations: Arc<dyn IntegrationRepository>,
        slack_client: Arc<SlackClient>,
        slack_config: &SlackConfig,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SlackNotifyAction::from_config(
            integrations.clone(),
            slack_client,
            slack_config,
        )));
        registry.register(Arc::new(JiraCreateTicketAction::new(integrations)));
        registry
    }

    pub fn register(&mut self, action: Arc<dyn NotificationAction>) {
        let id = action.id();
        if self.actions.insert(id, action).is_some() {
            tracing::warn!(action_id = id, "Replaced previously registered action");
        } else {
            tracing::debug!(action_id = id, "Registered action");
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn NotificationAction>> {
        self.actions
            .get(id)
            .cloned()
            .ok_or_else(|| NotifyError::UnknownAction(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.keys().copied()
    }

    /// Actions that can be offered for the project, in id order
    pub fn enabled(&self, ctx: &RuleContext) -> Vec<Arc<dyn NotificationAction>> {
        self.actions
            .values()
            .filter(|action| action.is_enabled(ctx))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{
        InMemoryIntegrations, Integration, IntegrationId, IntegrationMetadata, OrganizationId,
        Project, Provider,
    };

    fn registry_with(store: InMemoryIntegrations) -> ActionRegistry {
        let config = SlackConfig::default();
        let client = Arc::new(SlackClient::new(&config).unwrap());
        ActionRegistry::with_builtin(Arc::new(store), client, &config)
    }

    fn ctx() -> RuleContext {
        RuleContext::new(Project {
            id: 1,
            name: "backend".to_string(),
            organization_id: OrganizationId(1),
        })
    }

    #[test]
    fn test_builtin_actions_registered() {
        let registry = registry_with(InMemoryIntegrations::new());

        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["jira.create_ticket", "slack.notify_service"]
        );
        assert_eq!(registry.get("slack.notify_service").unwrap().provider(), Provider::Slack);
        assert!(matches!(
            registry.get("email.send"),
            Err(NotifyError::UnknownAction(id)) if id == "email.send"
        ));
    }

    #[test]
    fn test_enabled_follows_installed_integrations() {
        let store = InMemoryIntegrations::new();
        store.insert(Integration {
            id: IntegrationId(1),
            provider: Provider::Slack,
            name: "Acme".to_string(),
            organization_ids: vec![OrganizationId(1)],
            metadata: IntegrationMetadata::default(),
        });
        let registry = registry_with(store);

        let enabled: Vec<&str> = registry.enabled(&ctx()).iter().map(|a| a.id()).collect();
        assert_eq!(enabled, vec!["slack.notify_service"]);
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = registry_with(InMemoryIntegrations::new());
        let jira = registry.get("jira.create_ticket").unwrap();

        registry.register(jira);
        assert_eq!(registry.len(), 2);
    }
}
