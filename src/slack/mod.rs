mod attachment;
mod client;
mod directory;
mod resolver;
mod types;

pub use attachment::build_attachment;
pub use client::{PostMessageResponse, SlackClient};
pub use directory::{DEFAULT_PAGE_LIMIT, DirectoryApi, PageRequest, PageResponse};
pub use resolver::{ChannelResolver, DEFAULT_RESOLVE_TIMEOUT, MatchKind, Resolution};
pub use types::{
    AddressKind, CHANNEL_PREFIX, ChannelId, DirectoryEntry, DirectoryMode, DirectoryPage,
    ListType, MEMBER_PREFIX, ResolvedAddress, strip_channel_name,
};
