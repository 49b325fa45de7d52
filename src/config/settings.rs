use crate::error::{NotifyError, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct Settings {
    pub slack: SlackConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub api_base_url: String,
    /// Only needed by the CLI; rule actions read tokens from their integration
    pub bot_token: Option<String>,
    pub legacy_app: bool,
    pub resolve_timeout_secs: u64,
    pub page_limit: u32,
    pub http_timeout_secs: u64,
}

impl SlackConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_SLACK_API_BASE_URL.to_string(),
            bot_token: None,
            legacy_app: false,
            resolve_timeout_secs: 30,
            page_limit: 100,
            http_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(NotifyError::Config(format!("Invalid LOG_FORMAT: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    Settings::from_lookup(|key| std::env::var(key).ok())
}

impl Settings {
    /// Build settings from an arbitrary key lookup (the process environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = SlackConfig::default();

        let slack = SlackConfig {
            api_base_url: lookup("SLACK_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            bot_token: lookup("SLACK_BOT_TOKEN").filter(|t| !t.trim().is_empty()),
            legacy_app: match lookup("SLACK_LEGACY_APP") {
                Some(value) => parse_bool(&value)
                    .ok_or_else(|| NotifyError::Config("Invalid SLACK_LEGACY_APP".to_string()))?,
                None => defaults.legacy_app,
            },
            resolve_timeout_secs: parse_or(
                &lookup,
                "SLACK_RESOLVE_TIMEOUT_SECS",
                defaults.resolve_timeout_secs,
            )?,
            page_limit: parse_or(&lookup, "SLACK_PAGE_LIMIT", defaults.page_limit)?,
            http_timeout_secs: parse_or(
                &lookup,
                "SLACK_HTTP_TIMEOUT_SECS",
                defaults.http_timeout_secs,
            )?,
        };

        if slack.page_limit == 0 {
            return Err(NotifyError::Config(
                "SLACK_PAGE_LIMIT must be greater than zero".to_string(),
            ));
        }

        let logging = LogConfig {
            format: match lookup("LOG_FORMAT") {
                Some(value) => value.parse()?,
                None => LogFormat::default(),
            },
        };

        Ok(Settings { slack, logging })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| NotifyError::Config(format!("Invalid {}", key))),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(settings.slack.api_base_url, "https://slack.com/api");
        assert_eq!(settings.slack.bot_token, None);
        assert!(!settings.slack.legacy_app);
        assert_eq!(settings.slack.resolve_timeout(), Duration::from_secs(30));
        assert_eq!(settings.slack.page_limit, 100);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SLACK_API_BASE_URL", "http://localhost:9000/api/"),
            ("SLACK_BOT_TOKEN", "xoxb-test"),
            ("SLACK_LEGACY_APP", "true"),
            ("SLACK_RESOLVE_TIMEOUT_SECS", "5"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(settings.slack.api_base_url, "http://localhost:9000/api");
        assert_eq!(settings.slack.bot_token.as_deref(), Some("xoxb-test"));
        assert!(settings.slack.legacy_app);
        assert_eq!(settings.slack.resolve_timeout_secs, 5);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = Settings::from_lookup(lookup_from(&[("SLACK_RESOLVE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, NotifyError::Config(msg) if msg.contains("SLACK_RESOLVE_TIMEOUT_SECS")));

        let err = Settings::from_lookup(lookup_from(&[("SLACK_LEGACY_APP", "maybe")])).unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));

        let err = Settings::from_lookup(lookup_from(&[("SLACK_PAGE_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));
    }
}
