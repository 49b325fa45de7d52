use crate::error::Result;
use crate::integrations::{IntegrationRepository, Provider};
use crate::rules::form::{FieldSpec, FormData, FormErrors, RuleOptions, Validation, required_choice};
use crate::rules::{
    Event, FormFields, NotificationAction, Rule, RuleContext, integration_choices, integration_name,
};
use async_trait::async_trait;
use std::sync::Arc;

pub const HARDCODED_ISSUE_TYPES: [(&str, &str); 3] =
    [("Bug", "Bug"), ("Issue", "Issue"), ("Task", "Task")];

fn issue_type_choices() -> Vec<(String, String)> {
    HARDCODED_ISSUE_TYPES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub struct JiraNotifyForm {
    projects: Vec<(String, String)>,
}

impl JiraNotifyForm {
    pub fn new(projects: Vec<(String, String)>) -> Self {
        Self { projects }
    }

    pub fn initial_project(&self) -> Option<&str> {
        self.projects.first().map(|(id, _)| id.as_str())
    }

    pub fn clean(&self, data: &FormData) -> Validation<RuleOptions> {
        let mut errors = FormErrors::new();

        let project = required_choice(data, "jira_project", &self.projects, &mut errors);
        let issue_type = required_choice(data, "issue_type", &issue_type_choices(), &mut errors);

        let mut options = RuleOptions::new();
        if let Some(project) = project {
            options.insert("jira_project".to_string(), project);
        }
        if let Some(issue_type) = issue_type {
            options.insert("issue_type".to_string(), issue_type);
        }

        errors.finish(options)
    }
}

pub struct JiraCreateTicketAction {
    integrations: Arc<dyn IntegrationRepository>,
}

impl JiraCreateTicketAction {
    pub fn new(integrations: Arc<dyn IntegrationRepository>) -> Self {
        Self { integrations }
    }

    fn form(&self, ctx: &RuleContext) -> JiraNotifyForm {
        JiraNotifyForm::new(integration_choices(
            self.integrations.as_ref(),
            Provider::Jira,
            ctx.organization_id(),
        ))
    }
}

#[async_trait]
impl NotificationAction for JiraCreateTicketAction {
    fn id(&self) -> &'static str {
        "jira.create_ticket"
    }

    fn provider(&self) -> Provider {
        Provider::Jira
    }

    fn prompt(&self) -> &'static str {
        "Create a Jira ticket"
    }

    fn is_enabled(&self, ctx: &RuleContext) -> bool {
        !self
            .integrations
            .list(Provider::Jira, ctx.organization_id())
            .is_empty()
    }

    fn form_fields(&self, ctx: &RuleContext) -> FormFields {
        let choices = integration_choices(
            self.integrations.as_ref(),
            Provider::Jira,
            ctx.organization_id(),
        );
        let default = choices.first().map(|(id, _)| id.clone());

        vec![
            (
                "jira_integration",
                FieldSpec::Choice {
                    choices: choices.clone(),
                    default: default.clone(),
                    updates_form: true,
                },
            ),
            (
                "jira_project",
                FieldSpec::Choice {
                    choices,
                    default,
                    updates_form: true,
                },
            ),
            (
                "issue_type",
                FieldSpec::Choice {
                    choices: issue_type_choices(),
                    default: Some(HARDCODED_ISSUE_TYPES[0].0.to_string()),
                    updates_form: false,
                },
            ),
        ]
    }

    fn render_label(&self, ctx: &RuleContext, options: &RuleOptions) -> String {
        let project = integration_name(
            self.integrations.as_ref(),
            Provider::Jira,
            ctx.organization_id(),
            options.get("jira_project"),
        );
        let issue_type = options
            .get("issue_type")
            .map(String::as_str)
            .unwrap_or(HARDCODED_ISSUE_TYPES[0].0);

        format!("Create a {} in the {} Jira project", issue_type, project)
    }

    async fn validate(&self, ctx: &RuleContext, data: &FormData) -> Validation<RuleOptions> {
        self.form(ctx).clean(data)
    }

    async fn after(
        &self,
        ctx: &RuleContext,
        options: &RuleOptions,
        event: &Event,
        _rules: &[Rule],
    ) -> Result<()> {
        tracing::debug!(
            project_id = ctx.project.id,
            event_id = %event.id,
            jira_project = ?options.get("jira_project"),
            issue_type = ?options.get("issue_type"),
            "Jira ticket creation skipped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{
        InMemoryIntegrations, Integration, IntegrationId, IntegrationMetadata, OrganizationId,
        Project,
    };

    fn setup() -> (JiraCreateTicketAction, RuleContext) {
        let store = InMemoryIntegrations::new();
        store.insert(Integration {
            id: IntegrationId(8),
            provider: Provider::Jira,
            name: "Platform".to_string(),
            organization_ids: vec![OrganizationId(1)],
            metadata: IntegrationMetadata::default(),
        });
        let ctx = RuleContext::new(Project {
            id: 1,
            name: "backend".to_string(),
            organization_id: OrganizationId(1),
        });
        (JiraCreateTicketAction::new(Arc::new(store)), ctx)
    }

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_validate_and_label() {
        let (action, ctx) = setup();

        let options = action
            .validate(&ctx, &data(&[("jira_project", "8"), ("issue_type", "Task")]))
            .await
            .unwrap();

        assert_eq!(
            action.render_label(&ctx, &options),
            "Create a Task in the Platform Jira project"
        );
    }

    #[tokio::test]
    async fn test_validate_rejects_unknown_issue_type() {
        let (action, ctx) = setup();

        let errors = action
            .validate(&ctx, &data(&[("jira_project", "8"), ("issue_type", "Epic")]))
            .await
            .unwrap_err();

        assert_eq!(errors.for_field("issue_type").next().unwrap().code, "invalid_choice");
        assert_eq!(errors.for_field("jira_project").count(), 0);
    }

    #[test]
    fn test_form_fields_default_to_first_integration() {
        let (action, ctx) = setup();

        let fields = action.form_fields(&ctx);
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["jira_integration", "jira_project", "issue_type"]);

        match &fields[1].1 {
            FieldSpec::Choice {
                default,
                updates_form,
                ..
            } => {
                assert_eq!(default.as_deref(), Some("8"));
                assert!(*updates_form);
            }
            other => panic!("unexpected field spec: {:?}", other),
        }
        assert!(action.is_enabled(&ctx));
    }

    #[test]
    fn test_label_for_removed_project() {
        let (action, ctx) = setup();
        let mut options = RuleOptions::new();
        options.insert("jira_project".to_string(), "99".to_string());

        assert_eq!(
            action.render_label(&ctx, &options),
            "Create a Bug in the [removed] Jira project"
        );
    }
}
