use crate::integrations::Project;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Level {
    /// Attachment side-bar colour
    pub fn color(&self) -> &'static str {
        match self {
            Level::Debug => "#fbe14f",
            Level::Info => "#2788ce",
            Level::Warning => "#f18500",
            Level::Error | Level::Fatal => "#e03e2f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Unresolved,
    Resolved,
    Ignored,
}

/// An issue: the aggregate the event was grouped into
#[derive(Debug, Clone)]
pub struct Group {
    pub id: u64,
    pub title: String,
    pub culprit: Option<String>,
    pub project: Project,
    pub status: GroupStatus,
    pub level: Level,
    pub url: Option<String>,
}

impl Group {
    pub fn is_ignored(&self) -> bool {
        self.status == GroupStatus::Ignored
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub group: Group,
    pub message: String,
    pub tags: Vec<(String, String)>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The alert rule whose conditions fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: u64,
    pub label: String,
}
