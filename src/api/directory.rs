//! Channel listing helpers for the command line: ordering guild channels
//! under their categories, ordering DMs by recency, and resolving the
//! `server:n` addresses users type to pick a channel.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};

use super::model::{Channel, ChannelKind};

/// Which list a channel address points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// 1-based index into the joined server list.
    Server(usize),
    Direct,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Server(n) => write!(f, "{n}"),
            Scope::Direct => write!(f, "d"),
        }
    }
}

impl FromStr for Scope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "d" {
            return Ok(Scope::Direct);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Scope::Server(n)),
            _ => bail!("invalid server id `{s}`"),
        }
    }
}

/// A `server:n` or `d:n` address, both parts 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAddress {
    pub scope: Scope,
    pub index: usize,
}

impl FromStr for ChannelAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (scope, index) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid chat id `{s}` (no colon)"))?;
        let scope = scope.parse::<Scope>()?;
        let index = match index.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => bail!("invalid chat id `{s}` (not a number)"),
        };
        Ok(Self { scope, index })
    }
}

/// Categories ordered by position, each followed by its children. Channels
/// with no category come first.
pub fn sort_guild_channels(channels: Vec<Channel>) -> Vec<Channel> {
    let (mut categories, mut rest): (Vec<_>, Vec<_>) =
        channels.into_iter().partition(Channel::is_category);
    categories.sort_by_key(|c| c.position);
    rest.sort_by_key(|c| c.position);

    let mut sorted: Vec<Channel> = Vec::with_capacity(categories.len() + rest.len());
    let (orphans, mut children): (Vec<_>, Vec<_>) = rest.into_iter().partition(|c| {
        c.parent_id
            .as_ref()
            .is_none_or(|parent| !categories.iter().any(|cat| &cat.id == parent))
    });
    sorted.extend(orphans);
    for category in categories {
        let id = category.id.clone();
        sorted.push(category);
        let (mine, others): (Vec<_>, Vec<_>) = children
            .into_iter()
            .partition(|c| c.parent_id.as_deref() == Some(id.as_str()));
        sorted.extend(mine);
        children = others;
    }
    sorted
}

/// Oldest conversation first, so the most recent DM ends up next to the prompt.
pub fn sort_direct_channels(mut channels: Vec<Channel>) -> Vec<Channel> {
    channels.sort_by_key(|c| {
        c.last_message_id
            .as_deref()
            .unwrap_or(&c.id)
            .parse::<u64>()
            .unwrap_or(0)
    });
    channels
}

/// Pick the addressed channel out of an already sorted list.
pub fn pick_channel(channels: &[Channel], address: ChannelAddress) -> Result<&Channel> {
    let channel = channels
        .get(address.index - 1)
        .ok_or_else(|| anyhow!("no channel {}:{}", address.scope, address.index))?;
    if channel.kind == ChannelKind::Category {
        bail!("you can't chat in a category");
    }
    Ok(channel)
}

/// One line per channel in the style of the interactive picker.
pub fn describe_channel(scope: Scope, index: usize, channel: &Channel) -> String {
    let id = format!("{scope}:{index}");
    match channel.kind {
        ChannelKind::Category => format!("         {}", channel.label()),
        ChannelKind::Group => {
            let members = channel
                .recipients
                .iter()
                .map(|r| format!("{} ({})", r.display_name(), r.username))
                .collect::<Vec<_>>()
                .join(", ");
            format!(" {id:>7}  {}  [{members}]", channel.label())
        }
        ChannelKind::DirectMessage => match channel.recipients.first() {
            Some(r) if r.global_name.is_some() => {
                format!(" {id:>7}  {} ({})", r.display_name(), r.username)
            }
            _ => format!(" {id:>7}  {}", channel.label()),
        },
        _ => format!(" {id:>7}  {}", channel.label()),
    }
}
