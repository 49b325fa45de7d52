//! Alert rule actions
//!
//! Each provider implements [`NotificationAction`]; hosts register the
//! actions they want in an [`ActionRegistry`] and call them when a rule fires.

mod event;
mod form;
mod jira_action;
mod registry;
mod slack_action;

pub use event::{Event, Group, GroupStatus, Level, Rule};
pub use form::{
    FieldError, FieldSpec, FormData, FormErrors, RuleOptions, Validation, optional_text,
    required_choice, required_text, split_tags,
};
pub use jira_action::{HARDCODED_ISSUE_TYPES, JiraCreateTicketAction, JiraNotifyForm};
pub use registry::ActionRegistry;
pub use slack_action::{
    ChannelTransformer, SLACK_DEFAULT_TIMEOUT, SlackNotifyAction, SlackNotifyForm,
    SlackRuleConfig, notification_key,
};

use crate::error::Result;
use crate::integrations::{IntegrationId, IntegrationRepository, OrganizationId, Project, Provider};
use async_trait::async_trait;

/// The project a rule belongs to
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub project: Project,
}

impl RuleContext {
    pub fn new(project: Project) -> Self {
        Self { project }
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.project.organization_id
    }
}

/// Ordered form fields, as the rule editor should show them
pub type FormFields = Vec<(&'static str, FieldSpec)>;

#[async_trait]
pub trait NotificationAction: Send + Sync {
    /// Stable identifier rules store to refer to this action
    fn id(&self) -> &'static str;

    fn provider(&self) -> Provider;

    /// Short text shown in the "add action" menu
    fn prompt(&self) -> &'static str;

    /// Whether the action can be offered for this project
    fn is_enabled(&self, ctx: &RuleContext) -> bool;

    fn form_fields(&self, ctx: &RuleContext) -> FormFields;

    /// Human readable description of a saved configuration
    fn render_label(&self, ctx: &RuleContext, options: &RuleOptions) -> String;

    /// Validate submitted form data into the options to save
    async fn validate(&self, ctx: &RuleContext, data: &FormData) -> Validation<RuleOptions>;

    /// Deliver the notification for an event that matched `rules`
    async fn after(
        &self,
        ctx: &RuleContext,
        options: &RuleOptions,
        event: &Event,
        rules: &[Rule],
    ) -> Result<()>;
}

/// `(id, name)` choices for the provider's integrations in the organization
pub(crate) fn integration_choices(
    integrations: &dyn IntegrationRepository,
    provider: Provider,
    organization_id: OrganizationId,
) -> Vec<(String, String)> {
    integrations
        .list(provider, organization_id)
        .into_iter()
        .map(|i| (i.id.to_string(), i.name))
        .collect()
}

/// Integration name for labels, `[removed]` once it is gone
pub(crate) fn integration_name(
    integrations: &dyn IntegrationRepository,
    provider: Provider,
    organization_id: OrganizationId,
    raw_id: Option<&String>,
) -> String {
    raw_id
        .and_then(|id| id.parse::<u64>().ok())
        .and_then(|id| {
            integrations
                .get(provider, organization_id, IntegrationId(id))
                .ok()
        })
        .map(|i| i.name)
        .unwrap_or_else(|| "[removed]".to_string())
}
