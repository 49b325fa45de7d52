use crate::config::SlackConfig;
use crate::error::{NotifyError, Result};
use crate::slack::directory::{DirectoryApi, PageRequest, PageResponse};
use crate::slack::types::{ChannelId, DirectoryEntry, DirectoryPage};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Slack Web API client shared by the resolver and the notify action
///
/// One `reqwest::Client` (and so one connection pool) is reused for every
/// page and every directory.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    name: String,
    id: String,
    #[serde(default)]
    profile: Option<RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    display_name: Option<String>,
}

/// `chat.postMessage` reply
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self::with_http_client(http, &config.api_base_url))
    }

    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Post a message with legacy attachments to a channel or member
    pub async fn post_message(
        &self,
        token: &str,
        channel: &ChannelId,
        attachments: &[Value],
    ) -> Result<PostMessageResponse> {
        let attachments = serde_json::to_string(attachments)?;
        let form = [
            ("token", token),
            ("channel", channel.as_str()),
            ("attachments", attachments.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint("chat.postMessage"))
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        let reply: PostMessageResponse = response.json().await?;
        tracing::debug!(
            channel_id = %channel,
            ok = reply.ok,
            "chat.postMessage completed"
        );

        Ok(reply)
    }
}

#[async_trait]
impl DirectoryApi for SlackClient {
    async fn list_page(&self, token: &str, request: &PageRequest) -> Result<PageResponse> {
        let list_type = request.list_type;
        let limit = request.limit.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("token", token),
            ("cursor", request.cursor.as_str()),
            ("limit", limit.as_str()),
            ("exclude_archived", bool_param(request.exclude_archived)),
            ("exclude_members", bool_param(request.exclude_members)),
        ];
        if let Some(types) = request.types {
            query.push(("types", types));
        }

        tracing::trace!(
            list_type = %list_type,
            cursor = %request.cursor,
            "Fetching directory page"
        );

        let response = self
            .http
            .get(self.endpoint(&list_type.method()))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;

        let envelope: ListEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Rate-limit replies are not always JSON
                return match (status, retry_after) {
                    (StatusCode::TOO_MANY_REQUESTS, Some(retry_after)) => {
                        Ok(PageResponse::RateLimited { retry_after })
                    }
                    _ => Err(e.into()),
                };
            }
        };

        if !envelope.ok {
            if let Some(retry_after) = retry_after {
                return Ok(PageResponse::RateLimited { retry_after });
            }
            return Ok(PageResponse::Failed {
                error: envelope
                    .error
                    .unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        parse_page(envelope, list_type.result_name()).map(PageResponse::Page)
    }
}

fn parse_page(mut envelope: ListEnvelope, result_name: &str) -> Result<DirectoryPage> {
    let raw: Vec<RawEntry> = match envelope.rest.remove(result_name) {
        Some(value) => serde_json::from_value(value)?,
        None => {
            return Err(NotifyError::SlackApi(format!(
                "list response is missing `{}`",
                result_name
            )));
        }
    };

    let entries = raw
        .into_iter()
        .map(|entry| DirectoryEntry {
            name: entry.name,
            id: entry.id,
            display_name: entry.profile.and_then(|p| p.display_name),
        })
        .collect();

    let next_cursor = envelope
        .response_metadata
        .and_then(|m| m.next_cursor)
        .filter(|c| !c.is_empty());

    Ok(DirectoryPage {
        entries,
        next_cursor,
    })
}

fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Read a numeric `Retry-After` header (seconds, possibly fractional)
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?;
    let secs = value.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}
