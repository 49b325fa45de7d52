use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntegrationId(pub u64);

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganizationId(pub u64);

/// External service an integration talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Slack,
    Jira,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Slack => "slack",
            Provider::Jira => "jira",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationMetadata {
    pub access_token: String,
    /// Workspace URL, e.g. `https://acme.slack.com`
    #[serde(default)]
    pub domain_name: Option<String>,
}

/// An installed connection to an external workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: IntegrationId,
    pub provider: Provider,
    pub name: String,
    pub organization_ids: Vec<OrganizationId>,
    pub metadata: IntegrationMetadata,
}

impl Integration {
    pub fn belongs_to(&self, organization_id: OrganizationId) -> bool {
        self.organization_ids.contains(&organization_id)
    }

    pub fn access_token(&self) -> &str {
        &self.metadata.access_token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub organization_id: OrganizationId,
}
