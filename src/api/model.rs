//! Wire model for messages, channels and guilds.
//!
//! These types are decoded straight from the service's JSON. Fields the
//! service may omit or send as `null` default to empty values, and
//! [`decode_page`] skips any message that still fails to decode, so one
//! malformed message never fails a whole page of history.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

pub type ChannelId = String;
pub type GuildId = String;
pub type MessageId = String;
pub type UserId = String;

/// A user as embedded in messages and DM recipient lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl User {
    /// Preferred display name: the global name when set, else the username.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// What a reply points at. Only the author is kept, the quoted content is not
/// rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPreview {
    pub author: String,
}

impl<'de> Deserialize<'de> for ReplyPreview {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Referenced {
            #[serde(default, deserialize_with = "null_as_default")]
            author: User,
        }
        let referenced = Referenced::deserialize(deserializer)?;
        Ok(Self { author: referenced.author.username })
    }
}

/// A single fetched message. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: User,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    #[serde(default, rename = "referenced_message")]
    pub reply_to: Option<ReplyPreview>,
}

impl Message {
    /// Author label used in the transcript.
    pub fn author_name(&self) -> &str {
        &self.author.username
    }
}

/// Decode a page of history, dropping entries that are not messages at all.
pub fn decode_page(page: Vec<Value>) -> Vec<Message> {
    page.into_iter()
        .filter_map(|raw| match serde_json::from_value::<Message>(raw) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("skipping undecodable message: {e}");
                None
            }
        })
        .collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference attached to an outgoing reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    pub channel_id: ChannelId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    Text,
    DirectMessage,
    Voice,
    Group,
    Category,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            0 => ChannelKind::Text,
            1 => ChannelKind::DirectMessage,
            2 => ChannelKind::Voice,
            3 => ChannelKind::Group,
            4 => ChannelKind::Category,
            other => ChannelKind::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::DirectMessage => 1,
            ChannelKind::Voice => 2,
            ChannelKind::Group => 3,
            ChannelKind::Category => 4,
            ChannelKind::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    /// Weak link to the enclosing category, resolved by lookup.
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub last_message_id: Option<MessageId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipients: Vec<User>,
}

impl Channel {
    /// Header label: `#name` for text channels, the peer for DMs.
    pub fn label(&self) -> String {
        match (self.kind, &self.name) {
            (ChannelKind::Text, Some(name)) => format!("#{name}"),
            (ChannelKind::DirectMessage, _) => self
                .recipients
                .first()
                .map(|r| r.display_name().to_string())
                .unwrap_or_else(|| "direct message".to_string()),
            (ChannelKind::Group, None) => "group".to_string(),
            (_, Some(name)) => name.clone(),
            (_, None) => self.id.clone(),
        }
    }

    pub fn is_category(&self) -> bool {
        self.kind == ChannelKind::Category
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// The `/users/{id}/profile` payload, reduced to what `cadmium profile` shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: ProfileUser,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_profile: ProfileDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pronouns: String,
}

impl Profile {
    pub fn summary(&self) -> String {
        let user = &self.user.user;
        format!(
            "{} ({})\npronouns: {}\nbio:\n{}",
            user.display_name(),
            user.username,
            self.user_profile.pronouns,
            self.user.bio
        )
    }
}
