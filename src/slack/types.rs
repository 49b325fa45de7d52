use serde::{Deserialize, Serialize};
use std::fmt;

pub const CHANNEL_PREFIX: char = '#';
pub const MEMBER_PREFIX: char = '@';

/// Strip any leading `#`/`@` characters the user typed
pub fn strip_channel_name(name: &str) -> &str {
    name.trim_start_matches([CHANNEL_PREFIX, MEMBER_PREFIX])
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which kind of Slack destination an address points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Channel,
    Member,
}

impl AddressKind {
    pub fn prefix(&self) -> char {
        match self {
            AddressKind::Channel => CHANNEL_PREFIX,
            AddressKind::Member => MEMBER_PREFIX,
        }
    }

    /// Kind implied by what the user typed; defaults to channel
    pub fn from_input(name: &str) -> Self {
        if name.starts_with(MEMBER_PREFIX) {
            AddressKind::Member
        } else {
            AddressKind::Channel
        }
    }
}

/// Result of resolving a channel or member name
///
/// `id` is `None` when the name was not found, was ambiguous, or the lookup
/// failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub kind: AddressKind,
    pub id: Option<ChannelId>,
}

impl ResolvedAddress {
    pub fn found(kind: AddressKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(ChannelId::new(id)),
        }
    }

    pub fn absent(kind: AddressKind) -> Self {
        Self { kind, id: None }
    }

    pub fn prefix(&self) -> char {
        self.kind.prefix()
    }

    pub fn is_found(&self) -> bool {
        self.id.is_some()
    }

    /// The `(prefix, id)` pair handed back to hosts
    pub fn as_tuple(&self) -> (char, Option<&str>) {
        (self.prefix(), self.id.as_ref().map(|id| id.as_str()))
    }
}

/// One directory entry from a `*.list` response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Unique name (channel name, or username for members)
    pub name: String,
    pub id: String,
    /// Non-unique profile display name, members only
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryPage {
    pub entries: Vec<DirectoryEntry>,
    pub next_cursor: Option<String>,
}

impl DirectoryPage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// A listable Slack directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListType {
    Conversations,
    Channels,
    Groups,
    Users,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Conversations => "conversations",
            ListType::Channels => "channels",
            ListType::Groups => "groups",
            ListType::Users => "users",
        }
    }

    /// Web API method, e.g. `users.list`
    pub fn method(&self) -> String {
        format!("{}.list", self.as_str())
    }

    /// JSON key holding the entries in a list response
    pub fn result_name(&self) -> &'static str {
        match self {
            ListType::Conversations | ListType::Channels => "channels",
            ListType::Groups => "groups",
            ListType::Users => "members",
        }
    }

    pub fn address_kind(&self) -> AddressKind {
        match self {
            ListType::Users => AddressKind::Member,
            _ => AddressKind::Channel,
        }
    }

    pub fn matches_display_name(&self) -> bool {
        matches!(self, ListType::Users)
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the directory API the workspace app was installed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryMode {
    #[default]
    Current,
    /// Pre-conversations API: public channels and private groups are separate
    Legacy,
}

impl DirectoryMode {
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            DirectoryMode::Legacy
        } else {
            DirectoryMode::Current
        }
    }

    pub fn list_types(&self) -> &'static [ListType] {
        match self {
            DirectoryMode::Current => &[ListType::Conversations, ListType::Users],
            DirectoryMode::Legacy => &[ListType::Channels, ListType::Groups, ListType::Users],
        }
    }

    /// Conversation type filter sent with every list request
    pub fn types_filter(&self) -> Option<&'static str> {
        match self {
            DirectoryMode::Current => Some("public_channel,private_channel"),
            DirectoryMode::Legacy => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_channel_name() {
        assert_eq!(strip_channel_name("#general"), "general");
        assert_eq!(strip_channel_name("@jdoe"), "jdoe");
        assert_eq!(strip_channel_name("#@#general"), "general");
        assert_eq!(strip_channel_name("general#"), "general#");
    }

    #[test]
    fn test_address_kind_from_input() {
        assert_eq!(AddressKind::from_input("@jdoe"), AddressKind::Member);
        assert_eq!(AddressKind::from_input("#general"), AddressKind::Channel);
        assert_eq!(AddressKind::from_input("general"), AddressKind::Channel);
    }

    #[test]
    fn test_resolved_address_tuple() {
        let found = ResolvedAddress::found(AddressKind::Channel, "C1");
        assert_eq!(found.as_tuple(), ('#', Some("C1")));
        assert!(found.is_found());

        let absent = ResolvedAddress::absent(AddressKind::Member);
        assert_eq!(absent.as_tuple(), ('@', None));
    }

    #[test]
    fn test_mode_list_types() {
        assert_eq!(
            DirectoryMode::Current.list_types(),
            &[ListType::Conversations, ListType::Users]
        );
        assert_eq!(
            DirectoryMode::from_legacy_flag(true).list_types(),
            &[ListType::Channels, ListType::Groups, ListType::Users]
        );
        assert_eq!(DirectoryMode::Legacy.types_filter(), None);
    }

    #[test]
    fn test_list_type_metadata() {
        assert_eq!(ListType::Conversations.method(), "conversations.list");
        assert_eq!(ListType::Groups.result_name(), "groups");
        assert_eq!(ListType::Users.result_name(), "members");
        assert_eq!(ListType::Users.address_kind(), AddressKind::Member);
        assert!(!ListType::Channels.matches_display_name());
    }
}
