//! Messaging service collaborators.
//!
//! The chat view only talks to the service through [`ChatBackend`], so the
//! core can be driven by an in-memory fake in tests. [`http::HttpBackend`] is
//! the real REST implementation; [`directory`] holds the channel listing
//! helpers used by the command line.

pub mod directory;
pub mod http;
pub mod model;

use anyhow::Result;

pub use http::HttpBackend;
pub use model::{
    Attachment, Channel, ChannelId, ChannelKind, Guild, GuildId, Message, MessageId,
    MessageReference, Profile, ReplyPreview, User, UserId,
};

/// Operations the chat view needs from the service.
///
/// `fetch_messages` returns up to `limit` of the most recent messages,
/// newest first.
#[allow(async_fn_in_trait)]
pub trait ChatBackend {
    async fn fetch_messages(&self, channel: &ChannelId, limit: usize) -> Result<Vec<Message>>;

    async fn send_message(
        &self,
        channel: &ChannelId,
        content: &str,
        reply: Option<&MessageReference>,
    ) -> Result<Message>;

    /// Best effort; callers ignore the outcome apart from logging it.
    async fn notify_typing(&self, channel: &ChannelId) -> Result<()>;
}
