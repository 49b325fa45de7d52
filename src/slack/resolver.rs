//! Channel and member name resolution against Slack's directory APIs
//!
//! A name is looked up in every directory of the configured mode, in order:
//! - an exact match on the unique `name` wins immediately
//! - a match on a member's `display_name` only wins once the whole directory
//!   has been scanned and no second member shares that display name
//!
//! Rate-limited pages are retried after the server's delay. Upstream errors
//! abort the lookup, and so does running past the deadline.

use crate::slack::directory::{DEFAULT_PAGE_LIMIT, DirectoryApi, PageRequest, PageResponse};
use crate::slack::types::{
    AddressKind, DirectoryMode, ListType, ResolvedAddress, strip_channel_name,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

/// How a found entry matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Name,
    DisplayName,
}

/// Detailed outcome of a lookup
///
/// Every failure collapses to an absent id in [`Resolution::address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        kind: AddressKind,
        id: String,
        matched_by: MatchKind,
    },
    NotFound {
        kind: AddressKind,
    },
    Ambiguous {
        kind: AddressKind,
    },
    UpstreamError {
        kind: AddressKind,
        list_type: ListType,
        error: String,
    },
    TimedOut {
        kind: AddressKind,
        list_type: ListType,
    },
}

impl Resolution {
    pub fn kind(&self) -> AddressKind {
        match self {
            Resolution::Found { kind, .. }
            | Resolution::NotFound { kind }
            | Resolution::Ambiguous { kind }
            | Resolution::UpstreamError { kind, .. }
            | Resolution::TimedOut { kind, .. } => *kind,
        }
    }

    pub fn address(&self) -> ResolvedAddress {
        match self {
            Resolution::Found { kind, id, .. } => ResolvedAddress::found(*kind, id.clone()),
            other => ResolvedAddress::absent(other.kind()),
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Found { .. } => "found",
            Resolution::NotFound { .. } => "not_found",
            Resolution::Ambiguous { .. } => "ambiguous",
            Resolution::UpstreamError { .. } => "upstream_error",
            Resolution::TimedOut { .. } => "timed_out",
        }
    }
}

pub struct ChannelResolver<D> {
    directory: Arc<D>,
    mode: DirectoryMode,
    page_limit: u32,
}

impl<D> Clone for ChannelResolver<D> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            mode: self.mode,
            page_limit: self.page_limit,
        }
    }
}

impl<D: DirectoryApi> ChannelResolver<D> {
    pub fn new(directory: Arc<D>, mode: DirectoryMode) -> Self {
        Self {
            directory,
            mode,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    pub fn mode(&self) -> DirectoryMode {
        self.mode
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Resolve `target` to a `(prefix, id)` address
    pub async fn resolve(&self, token: &str, target: &str, timeout: Duration) -> ResolvedAddress {
        let resolution = self.lookup(token, target, timeout).await;

        match &resolution {
            Resolution::Found { kind, id, matched_by } => tracing::info!(
                target_name = %target,
                prefix = %kind.prefix(),
                channel_id = %id,
                matched_by = ?matched_by,
                "Resolved Slack name"
            ),
            other => tracing::info!(
                target_name = %target,
                prefix = %other.kind().prefix(),
                outcome = other.outcome(),
                "Could not resolve Slack name"
            ),
        }

        resolution.address()
    }

    /// Same walk as [`resolve`](Self::resolve) but keeps the failure reason
    pub async fn lookup(&self, token: &str, target: &str, timeout: Duration) -> Resolution {
        let name = strip_channel_name(target);
        let deadline = Instant::now() + timeout;
        let mut scanned_item_count: usize = 0;
        let mut last_kind = AddressKind::Channel;

        for &list_type in self.mode.list_types() {
            let kind = list_type.address_kind();
            last_kind = kind;

            let mut candidate: Option<String> = None;
            let mut found_duplicate = false;
            let mut request = PageRequest::first(list_type, self.mode, self.page_limit);

            loop {
                let page = match self.directory.list_page(token, &request).await {
                    Ok(PageResponse::Page(page)) => page,
                    Ok(PageResponse::RateLimited { retry_after }) => {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        tracing::info!(
                            list_type = %list_type,
                            scanned_item_count,
                            time_until_timeout_ms = remaining.as_millis() as u64,
                            retry_after_ms = retry_after.as_millis() as u64,
                            "Slack directory list rate limited"
                        );
                        tokio::time::sleep(retry_after).await;
                        continue;
                    }
                    Ok(PageResponse::Failed { error }) => {
                        tracing::error!(
                            list_type = %list_type,
                            error = %error,
                            "Slack directory list failed"
                        );
                        return Resolution::UpstreamError {
                            kind,
                            list_type,
                            error,
                        };
                    }
                    Err(e) => {
                        tracing::error!(
                            list_type = %list_type,
                            error = %e,
                            "Slack directory request failed"
                        );
                        return Resolution::UpstreamError {
                            kind,
                            list_type,
                            error: e.to_string(),
                        };
                    }
                };

                for entry in &page.entries {
                    scanned_item_count += 1;

                    if entry.name == name {
                        return Resolution::Found {
                            kind,
                            id: entry.id.clone(),
                            matched_by: MatchKind::Name,
                        };
                    }

                    if list_type.matches_display_name()
                        && entry.display_name.as_deref() == Some(name)
                    {
                        if candidate.is_some() {
                            found_duplicate = true;
                        } else {
                            candidate = Some(entry.id.clone());
                        }
                    }
                }

                if Instant::now() > deadline {
                    tracing::error!(
                        list_type = %list_type,
                        scanned_item_count,
                        "Slack directory list timed out"
                    );
                    return Resolution::TimedOut { kind, list_type };
                }

                match page.next_cursor {
                    Some(cursor) if !cursor.is_empty() => request = request.with_cursor(cursor),
                    _ => break,
                }
            }

            if found_duplicate {
                tracing::warn!(
                    list_type = %list_type,
                    display_name = %name,
                    "Multiple members share this display name"
                );
                return Resolution::Ambiguous { kind };
            }
            if let Some(id) = candidate {
                return Resolution::Found {
                    kind,
                    id,
                    matched_by: MatchKind::DisplayName,
                };
            }
        }

        Resolution::NotFound { kind: last_kind }
    }
}
