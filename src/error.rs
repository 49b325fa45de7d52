use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Integration not found: provider={provider} id={id}")]
    IntegrationNotFound { provider: String, id: u64 },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
