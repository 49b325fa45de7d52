use crate::config::SlackConfig;
use crate::error::{NotifyError, Result};
use crate::integrations::{Integration, IntegrationId, IntegrationRepository, OrganizationId, Provider};
use crate::logging::log_error;
use crate::rules::form::{
    FieldSpec, FormData, FormErrors, RuleOptions, Validation, optional_text, required_choice,
    required_text, split_tags,
};
use crate::rules::{
    Event, FormFields, NotificationAction, Rule, RuleContext, integration_choices, integration_name,
};
use crate::slack::{
    AddressKind, ChannelId, ChannelResolver, DirectoryMode, Resolution, SlackClient,
    build_attachment, strip_channel_name,
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

pub const SLACK_DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_SLACK_DOMAIN: &str = "https://slack.com";

/// Looks a channel or member name up inside a workspace
#[async_trait]
pub trait ChannelTransformer: Send + Sync {
    /// `None` when the workspace cannot be used at all
    async fn channel_id(&self, workspace: IntegrationId, name: &str) -> Option<Resolution>;
}

/// Validated Slack action configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackRuleConfig {
    pub workspace: IntegrationId,
    /// Prefixed name as the user should see it, e.g. `#critical`
    pub channel: String,
    /// Absent while a timed-out lookup is still pending
    pub channel_id: Option<ChannelId>,
    pub tags: Vec<String>,
    pub pending_save: bool,
}

impl SlackRuleConfig {
    pub fn into_options(self) -> RuleOptions {
        let mut options = RuleOptions::new();
        options.insert("workspace".to_string(), self.workspace.to_string());
        options.insert("channel".to_string(), self.channel);
        if let Some(channel_id) = self.channel_id {
            options.insert("channel_id".to_string(), channel_id.0);
        }
        options.insert("tags".to_string(), self.tags.join(","));
        options
    }
}

/// Form for the Slack notify action
///
/// Fields: `workspace` (integration id), `channel`, optional `tags`, and
/// optional `input_channel_id` for API clients that already know the id.
pub struct SlackNotifyForm {
    workspaces: Vec<(String, String)>,
    domains: HashMap<String, String>,
}

impl SlackNotifyForm {
    pub fn new(integrations: &[Integration]) -> Self {
        Self {
            workspaces: integrations
                .iter()
                .map(|i| (i.id.to_string(), i.name.clone()))
                .collect(),
            domains: integrations
                .iter()
                .filter_map(|i| {
                    let domain = i.metadata.domain_name.clone()?;
                    Some((i.id.to_string(), domain))
                })
                .collect(),
        }
    }

    pub fn choices(&self) -> &[(String, String)] {
        &self.workspaces
    }

    pub fn initial_workspace(&self) -> Option<&str> {
        self.workspaces.first().map(|(id, _)| id.as_str())
    }

    fn workspace_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.workspaces
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, name)| name.as_str())
            .unwrap_or(id)
    }

    fn workspace_domain(&self, id: &str) -> &str {
        self.domains
            .get(id)
            .map(|d| d.trim_end_matches('/'))
            .unwrap_or(DEFAULT_SLACK_DOMAIN)
    }

    pub async fn clean(
        &self,
        data: &FormData,
        transformer: &dyn ChannelTransformer,
    ) -> Validation<SlackRuleConfig> {
        let mut errors = FormErrors::new();

        let workspace = required_choice(data, "workspace", &self.workspaces, &mut errors);
        let raw_channel = required_text(data, "channel", &mut errors);
        let tags = split_tags(optional_text(data, "tags"));

        let (Some(workspace), Some(raw_channel)) = (workspace, raw_channel) else {
            return Err(errors);
        };

        let Ok(workspace_id) = workspace.parse::<u64>().map(IntegrationId) else {
            errors.invalid_choice("workspace", &workspace);
            return Err(errors);
        };

        let channel = strip_channel_name(raw_channel);
        if channel.is_empty() {
            errors.required("channel");
            return Err(errors);
        }

        let input_channel_id = optional_text(data, "input_channel_id");
        if !input_channel_id.is_empty() {
            tracing::info!(
                slack_integration_id = %workspace_id,
                channel_id = %input_channel_id,
                "rule.slack.provide_channel_id"
            );
            return Ok(SlackRuleConfig {
                workspace: workspace_id,
                channel: format!(
                    "{}{}",
                    AddressKind::from_input(raw_channel).prefix(),
                    channel
                ),
                channel_id: Some(ChannelId::new(input_channel_id)),
                tags,
                pending_save: false,
            });
        }

        let resolution = transformer
            .channel_id(workspace_id, channel)
            .await
            .unwrap_or(Resolution::NotFound {
                kind: AddressKind::from_input(raw_channel),
            });

        match resolution {
            Resolution::Found { kind, id, .. } => Ok(SlackRuleConfig {
                workspace: workspace_id,
                channel: format!("{}{}", kind.prefix(), channel),
                channel_id: Some(ChannelId::new(id)),
                tags,
                pending_save: false,
            }),
            Resolution::TimedOut { kind, .. } => Ok(SlackRuleConfig {
                workspace: workspace_id,
                channel: format!("{}{}", kind.prefix(), channel),
                channel_id: None,
                tags,
                pending_save: true,
            }),
            Resolution::Ambiguous { .. } => {
                errors.non_field(
                    "invalid",
                    format!(
                        "Multiple users were found with display name \"{}\". Please use your username, found at {}/account/settings.",
                        channel,
                        self.workspace_domain(&workspace)
                    ),
                );
                Err(errors)
            }
            Resolution::NotFound { .. } | Resolution::UpstreamError { .. } => {
                errors.non_field(
                    "invalid",
                    format!(
                        "The slack resource \"{}\" does not exist or has not been granted access in the {} Slack workspace.",
                        channel,
                        self.workspace_name(&workspace)
                    ),
                );
                Err(errors)
            }
        }
    }
}

/// Key grouping notifications for the same destination
pub fn notification_key(integration_id: IntegrationId, channel_id: &ChannelId) -> String {
    format!("slack:{}:{}", integration_id, channel_id)
}

pub struct SlackNotifyAction {
    integrations: Arc<dyn IntegrationRepository>,
    client: Arc<SlackClient>,
    resolver: ChannelResolver<SlackClient>,
    resolve_timeout: Duration,
}

impl SlackNotifyAction {
    pub fn new(
        integrations: Arc<dyn IntegrationRepository>,
        client: Arc<SlackClient>,
        mode: DirectoryMode,
    ) -> Self {
        let resolver = ChannelResolver::new(client.clone(), mode);
        Self {
            integrations,
            client,
            resolver,
            resolve_timeout: SLACK_DEFAULT_TIMEOUT,
        }
    }

    /// Action using the mode, timeout and page size from settings
    pub fn from_config(
        integrations: Arc<dyn IntegrationRepository>,
        client: Arc<SlackClient>,
        config: &SlackConfig,
    ) -> Self {
        Self::new(
            integrations,
            client,
            DirectoryMode::from_legacy_flag(config.legacy_app),
        )
        .with_resolve_timeout(config.resolve_timeout())
        .with_page_limit(config.page_limit)
    }

    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.resolver = self.resolver.with_page_limit(page_limit);
        self
    }

    pub fn form(&self, ctx: &RuleContext) -> SlackNotifyForm {
        SlackNotifyForm::new(
            &self
                .integrations
                .list(Provider::Slack, ctx.organization_id()),
        )
    }

    pub fn tags_list(options: &RuleOptions) -> Vec<String> {
        options
            .get("tags")
            .map(|t| split_tags(t))
            .unwrap_or_default()
    }

    /// Resolve a channel name inside one of the organization's workspaces
    pub async fn get_channel_id(
        &self,
        organization_id: OrganizationId,
        integration_id: IntegrationId,
        name: &str,
    ) -> Option<Resolution> {
        let integration = match self
            .integrations
            .get(Provider::Slack, organization_id, integration_id)
        {
            Ok(integration) => integration,
            Err(e) => {
                tracing::debug!(error = %e, "Slack workspace unavailable for channel lookup");
                return None;
            }
        };

        let resolution = self
            .resolver
            .lookup(integration.access_token(), name, self.resolve_timeout)
            .await;
        tracing::info!(
            slack_integration_id = %integration_id,
            target_name = %name,
            outcome = resolution.outcome(),
            "rule.slack.channel_lookup"
        );

        Some(resolution)
    }
}

/// Binds the action to one organization for form validation
struct OrganizationChannels<'a> {
    action: &'a SlackNotifyAction,
    organization_id: OrganizationId,
}

#[async_trait]
impl ChannelTransformer for OrganizationChannels<'_> {
    async fn channel_id(&self, workspace: IntegrationId, name: &str) -> Option<Resolution> {
        self.action
            .get_channel_id(self.organization_id, workspace, name)
            .await
    }
}

#[async_trait]
impl NotificationAction for SlackNotifyAction {
    fn id(&self) -> &'static str {
        "slack.notify_service"
    }

    fn provider(&self) -> Provider {
        Provider::Slack
    }

    fn prompt(&self) -> &'static str {
        "Send a Slack notification"
    }

    fn is_enabled(&self, ctx: &RuleContext) -> bool {
        !self
            .integrations
            .list(Provider::Slack, ctx.organization_id())
            .is_empty()
    }

    fn form_fields(&self, ctx: &RuleContext) -> FormFields {
        let choices = integration_choices(
            self.integrations.as_ref(),
            Provider::Slack,
            ctx.organization_id(),
        );
        let default = choices.first().map(|(id, _)| id.clone());

        vec![
            (
                "workspace",
                FieldSpec::Choice {
                    choices,
                    default,
                    updates_form: false,
                },
            ),
            (
                "channel",
                FieldSpec::Text {
                    placeholder: "i.e #critical".to_string(),
                },
            ),
            (
                "tags",
                FieldSpec::Text {
                    placeholder: "i.e environment,user,my_tag".to_string(),
                },
            ),
        ]
    }

    fn render_label(&self, ctx: &RuleContext, options: &RuleOptions) -> String {
        let workspace = integration_name(
            self.integrations.as_ref(),
            Provider::Slack,
            ctx.organization_id(),
            options.get("workspace"),
        );
        let channel = options.get("channel").map(String::as_str).unwrap_or_default();
        let tags = format!("[{}]", Self::tags_list(options).join(", "));

        format!(
            "Send a notification to the {} Slack workspace to {} and show tags {} in notification",
            workspace, channel, tags
        )
    }

    async fn validate(&self, ctx: &RuleContext, data: &FormData) -> Validation<RuleOptions> {
        let transformer = OrganizationChannels {
            action: self,
            organization_id: ctx.organization_id(),
        };

        let config = self.form(ctx).clean(data, &transformer).await?;
        if config.pending_save {
            tracing::info!(
                project_id = ctx.project.id,
                slack_integration_id = %config.workspace,
                channel = %config.channel,
                "rule.slack.channel_pending"
            );
        }

        Ok(config.into_options())
    }

    async fn after(
        &self,
        ctx: &RuleContext,
        options: &RuleOptions,
        event: &Event,
        rules: &[Rule],
    ) -> Result<()> {
        if event.group.is_ignored() {
            return Ok(());
        }

        let project = &ctx.project;
        let Some(integration_id) = options
            .get("workspace")
            .and_then(|w| w.parse::<u64>().ok())
            .map(IntegrationId)
        else {
            tracing::warn!(
                project_id = project.id,
                "rule.fail.slack_post: workspace option missing"
            );
            return Ok(());
        };

        let integration =
            match self
                .integrations
                .get(Provider::Slack, ctx.organization_id(), integration_id)
            {
                Ok(integration) => integration,
                Err(NotifyError::IntegrationNotFound { .. }) => {
                    // Integration removed, rule still active
                    tracing::debug!(
                        integration_id = %integration_id,
                        project_id = project.id,
                        "Skipping notification for removed Slack integration"
                    );
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

        let Some(channel_id) = options
            .get("channel_id")
            .filter(|c| !c.is_empty())
            .map(ChannelId::new)
        else {
            tracing::warn!(
                error = "channel is none",
                project_id = project.id,
                project_name = %project.name,
                "rule.fail.slack_post"
            );
            return Ok(());
        };

        let tags: BTreeSet<String> = Self::tags_list(options).into_iter().collect();
        let attachment = build_attachment(event, &tags, rules);

        tracing::info!(
            key = %notification_key(integration_id, &channel_id),
            instance = "slack.notification",
            "notifications.sent"
        );

        let reply = self
            .client
            .post_message(integration.access_token(), &channel_id, &[attachment])
            .await
            .inspect_err(|e| log_error("slack.post_message", e))?;

        if !reply.ok {
            tracing::error!(
                error = ?reply.error,
                channel = %channel_id,
                project_id = project.id,
                project_name = %project.name,
                "rule.fail.slack_post"
            );
        }

        Ok(())
    }
}
