//! Directory API seam between the resolver and the Slack Web API

use crate::error::Result;
use crate::slack::types::{DirectoryMode, DirectoryPage, ListType};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Parameters of one `<list_type>.list` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub list_type: ListType,
    pub cursor: String,
    pub limit: u32,
    pub exclude_archived: bool,
    pub exclude_members: bool,
    pub types: Option<&'static str>,
}

impl PageRequest {
    pub fn first(list_type: ListType, mode: DirectoryMode, limit: u32) -> Self {
        Self {
            list_type,
            cursor: String::new(),
            limit,
            exclude_archived: true,
            exclude_members: true,
            types: mode.types_filter(),
        }
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }
}

/// What a single list call produced
#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse {
    Page(DirectoryPage),
    /// Server asked us to back off before repeating the same request
    RateLimited { retry_after: Duration },
    /// `ok: false` without a retry hint
    Failed { error: String },
}

#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn list_page(&self, token: &str, request: &PageRequest) -> Result<PageResponse>;
}
