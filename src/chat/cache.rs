//! In-memory message history per channel.
//!
//! Each refresh replaces the channel's messages wholesale with whatever the
//! backend returns (newest first). A failed refresh leaves the previous
//! messages in place so the view keeps showing them.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::{ChannelId, ChatBackend, Message};

#[derive(Debug, Clone)]
struct History {
    messages: Arc<[Message]>,
    /// How many messages the next fetch asks for.
    limit: usize,
    /// Frames drawn since the last fetch attempt.
    frames: u32,
    stale: bool,
    /// The last fetch returned fewer messages than asked for.
    exhausted: bool,
    /// Bumped on every successful replacement.
    generation: u64,
}

impl History {
    fn new(limit: usize) -> Self {
        Self {
            messages: Arc::from(Vec::new()),
            limit,
            frames: 0,
            stale: true,
            exhausted: false,
            generation: 0,
        }
    }
}

pub struct MessageCache {
    histories: HashMap<ChannelId, History>,
    step: usize,
    refresh_frames: u32,
}

impl MessageCache {
    /// `step` is both the initial history limit and its growth increment.
    pub fn new(step: usize, refresh_frames: u32) -> Self {
        Self {
            histories: HashMap::new(),
            step: step.max(1),
            refresh_frames,
        }
    }

    fn history_mut(&mut self, channel: &ChannelId) -> &mut History {
        let step = self.step;
        self.histories
            .entry(channel.clone())
            .or_insert_with(|| History::new(step))
    }

    /// Count one rendered frame against the channel's freshness budget.
    pub fn tick(&mut self, channel: &ChannelId) {
        let history = self.history_mut(channel);
        history.frames = history.frames.saturating_add(1);
    }

    pub fn needs_refresh(&self, channel: &ChannelId) -> bool {
        match self.histories.get(channel) {
            Some(h) => h.stale || h.frames > self.refresh_frames,
            None => true,
        }
    }

    /// Refetch when the channel was never loaded, was invalidated, or has
    /// outlived its frame budget. Returns the current messages either way.
    pub async fn ensure_fresh<B: ChatBackend>(
        &mut self,
        backend: &B,
        channel: &ChannelId,
    ) -> Result<Arc<[Message]>> {
        if self.needs_refresh(channel) {
            self.refresh(backend, channel).await?;
        }
        Ok(self.snapshot(channel))
    }

    /// Unconditionally refetch. On failure the cached messages are kept.
    pub async fn refresh<B: ChatBackend>(&mut self, backend: &B, channel: &ChannelId) -> Result<()> {
        let history = self.history_mut(channel);
        let limit = history.limit;
        history.frames = 0;
        history.stale = false;

        debug!(channel = %channel, limit, "fetching messages");
        match backend.fetch_messages(channel, limit).await {
            Ok(messages) => {
                let history = self.history_mut(channel);
                history.exhausted = messages.len() < limit;
                history.messages = Arc::from(messages);
                history.generation += 1;
                info!(
                    channel = %channel,
                    limit,
                    count = history.messages.len(),
                    exhausted = history.exhausted,
                    "message cache refreshed"
                );
                Ok(())
            }
            Err(e) => {
                warn!(channel = %channel, "message fetch failed, keeping cached history: {e:#}");
                Err(e)
            }
        }
    }

    /// Mark the channel stale so the next `ensure_fresh` refetches.
    pub fn invalidate(&mut self, channel: &ChannelId) {
        self.history_mut(channel).stale = true;
    }

    /// Ask for one more page of older history on the next refresh.
    ///
    /// Returns false once the backend has shown there is nothing older.
    pub fn grow(&mut self, channel: &ChannelId) -> bool {
        let step = self.step;
        let history = self.history_mut(channel);
        if history.exhausted {
            return false;
        }
        history.limit += step;
        history.stale = true;
        debug!(channel = %channel, limit = history.limit, "history limit raised");
        true
    }

    pub fn snapshot(&self, channel: &ChannelId) -> Arc<[Message]> {
        self.histories
            .get(channel)
            .map(|h| Arc::clone(&h.messages))
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn len(&self, channel: &ChannelId) -> usize {
        self.histories.get(channel).map_or(0, |h| h.messages.len())
    }

    pub fn limit(&self, channel: &ChannelId) -> usize {
        self.histories.get(channel).map_or(self.step, |h| h.limit)
    }

    pub fn is_exhausted(&self, channel: &ChannelId) -> bool {
        self.histories.get(channel).is_some_and(|h| h.exhausted)
    }

    pub fn generation(&self, channel: &ChannelId) -> u64 {
        self.histories.get(channel).map_or(0, |h| h.generation)
    }
}
