//! The interactive chat view for a single channel.
//!
//! Data flows one way each frame: [`MessageCache`] → [`layout`] →
//! [`render`], with [`state::Interaction`] deciding what is selected and which
//! side effects a key press triggers. [`ChatSession`] owns all of it and runs
//! those effects against the backend and the link handler.
//!
//! # Submodules
//!
//! - `cache`: per-channel message history and refresh policy
//! - `cursor`: selection movement and scroll offsets
//! - `layout`: wrapping messages into terminal rows
//! - `render`: rows to draw operations, redraw guard
//! - `state`: modal key handling

pub mod cache;
pub mod cursor;
pub mod layout;
pub mod render;
pub mod state;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::{Channel, ChatBackend, Message, MessageReference};
use crate::config::KeyBindings;
use crate::links::LinkHandler;

pub use cache::MessageCache;
use layout::Transcript;
use render::{ChatFrame, FrameInput, RenderKey};
use state::{Action, Effect, Interaction, ReplyTarget, ViewContext};

/// Whether the event loop keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct ChatSession<B, L> {
    channel: Channel,
    backend: B,
    links: L,
    cache: MessageCache,
    interaction: Interaction,
    keys: KeyBindings,
    /// Last failure worth telling the user about.
    notice: Option<String>,
}

impl<B: ChatBackend, L: LinkHandler> ChatSession<B, L> {
    pub fn new(channel: Channel, backend: B, links: L, cache: MessageCache, keys: KeyBindings) -> Self {
        Self {
            channel,
            backend,
            links,
            cache,
            interaction: Interaction::new(),
            keys,
            notice: None,
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn cache(&self) -> &MessageCache {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn links(&self) -> &L {
        &self.links
    }

    pub fn keys(&self) -> &KeyBindings {
        &self.keys
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn messages(&self) -> Arc<[Message]> {
        self.cache.snapshot(&self.channel.id)
    }

    /// Refetch if the history is stale. Paused while a line is being composed.
    pub async fn refresh_if_stale(&mut self) {
        if self.interaction.is_composing() {
            return;
        }
        let before = self.cache.generation(&self.channel.id);
        match self.cache.ensure_fresh(&self.backend, &self.channel.id).await {
            Ok(_) if self.cache.generation(&self.channel.id) != before => self.notice = None,
            Ok(_) => {}
            Err(e) => self.notice = Some(format!("could not load messages: {e}")),
        }
    }

    /// Count one frame against the refresh budget.
    pub fn tick(&mut self) {
        if !self.interaction.is_composing() {
            self.cache.tick(&self.channel.id);
        }
    }

    fn transcript(&self, messages: &[Message], width: u16) -> Transcript {
        Transcript::build(messages, usize::from(width), |i| self.interaction.marks(i))
    }

    /// Bring the selection back in bounds for the current history and size.
    pub fn sync(&mut self, width: u16, height: u16) {
        let messages = self.messages();
        let heights = self.transcript(&messages, width).heights();
        let ctx = ViewContext {
            messages: &messages,
            heights: &heights,
            viewport: render::viewport_rows(height),
            history_exhausted: self.cache.is_exhausted(&self.channel.id),
        };
        self.interaction.clamp(&ctx);
    }

    pub fn render_key(&self, width: u16, height: u16) -> RenderKey {
        RenderKey {
            generation: self.cache.generation(&self.channel.id),
            mode: self.interaction.mode().clone(),
            size: (width, height),
            notice: self.notice.clone(),
        }
    }

    pub fn frame(&self, width: u16, height: u16) -> ChatFrame {
        let messages = self.messages();
        let transcript = self.transcript(&messages, width);
        let label = self.channel.label();
        let input = FrameInput {
            label: &label,
            topic: self.channel.topic.as_deref(),
            transcript: &transcript,
            mode: self.interaction.mode(),
            offset: self.interaction.offset(),
            notice: self.notice.as_deref(),
            keys: &self.keys,
        };
        render::build_frame(&input, width, height)
    }

    fn dispatch(&mut self, action: Action, width: u16, height: u16) -> Effect {
        self.sync(width, height);
        let messages = self.messages();
        let heights = self.transcript(&messages, width).heights();
        let ctx = ViewContext {
            messages: &messages,
            heights: &heights,
            viewport: render::viewport_rows(height),
            history_exhausted: self.cache.is_exhausted(&self.channel.id),
        };
        self.interaction.handle(action, &ctx)
    }

    /// Apply one key action for a terminal of the given size.
    pub async fn handle_action(&mut self, action: Action, width: u16, height: u16) -> Flow {
        self.notice = None;
        let effect = self.dispatch(action, width, height);
        match effect {
            Effect::None => {}
            Effect::Exit => return Flow::Exit,
            Effect::NotifyTyping => {
                if let Err(e) = self.backend.notify_typing(&self.channel.id).await {
                    warn!("typing indicator failed: {e:#}");
                }
            }
            Effect::Send { content, reply } => self.send(&content, reply).await,
            Effect::OpenLink(url) => {
                if let Err(e) = self.links.open_link(&url) {
                    warn!("{e:#}");
                }
            }
            Effect::CopyLink(url) => {
                if let Err(e) = self.links.copy_text(&url) {
                    warn!("{e:#}");
                }
            }
            Effect::FetchOlder => self.fetch_older(action, width, height).await,
        }
        Flow::Continue
    }

    async fn send(&mut self, content: &str, reply: Option<ReplyTarget>) {
        let reference = reply.map(|target| MessageReference {
            channel_id: self.channel.id.clone(),
            guild_id: self.channel.guild_id.clone(),
            message_id: target.message_id,
        });
        match self
            .backend
            .send_message(&self.channel.id, content, reference.as_ref())
            .await
        {
            Ok(sent) => {
                info!(channel = %self.channel.id, id = %sent.id, reply = reference.is_some(), "message sent");
                self.cache.invalidate(&self.channel.id);
            }
            Err(e) => {
                error!(channel = %self.channel.id, "send failed: {e:#}");
                self.notice = Some(format!("message not sent: {e}"));
            }
        }
    }

    /// Grow the history window, refetch, and retry the move that ran out.
    async fn fetch_older(&mut self, action: Action, width: u16, height: u16) {
        if !self.cache.grow(&self.channel.id) {
            return;
        }
        if let Err(e) = self.cache.refresh(&self.backend, &self.channel.id).await {
            self.notice = Some(format!("could not load older messages: {e}"));
            return;
        }
        // A second overrun means the refetch brought nothing older; leave it.
        let effect = self.dispatch(action, width, height);
        if effect != Effect::None {
            info!(?effect, "no older history after growing the limit");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Mutex, MutexGuard};

    use anyhow::{Result, bail};

    use crate::api::{ChannelId, ChatBackend, Message, MessageReference};
    use crate::chat::layout::tests::message;
    use crate::links::LinkHandler;

    #[derive(Default)]
    pub struct FakeState {
        /// Newest first.
        pub messages: Vec<Message>,
        pub failing: bool,
        pub fail_send: bool,
        pub fail_typing: bool,
        pub fetches: Vec<usize>,
        pub sent: Vec<(ChannelId, String, Option<MessageReference>)>,
        pub typing: usize,
    }

    /// In-memory service. Sent messages are not echoed back into history.
    #[derive(Default)]
    pub struct FakeBackend {
        state: Mutex<FakeState>,
    }

    impl FakeBackend {
        pub fn with_messages(count: usize) -> Self {
            let messages = (0..count)
                .map(|i| {
                    let id = count - i;
                    message(&id.to_string(), &format!("user{id}"), &format!("message {id}"))
                })
                .collect();
            Self::from_messages(messages)
        }

        pub fn from_messages(messages: Vec<Message>) -> Self {
            Self {
                state: Mutex::new(FakeState { messages, ..FakeState::default() }),
            }
        }

        pub fn state(&self) -> MutexGuard<'_, FakeState> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        pub fn set_failing(&self, failing: bool) {
            self.state().failing = failing;
        }

        pub fn fetch_limits(&self) -> Vec<usize> {
            self.state().fetches.clone()
        }
    }

    impl ChatBackend for FakeBackend {
        async fn fetch_messages(&self, _channel: &ChannelId, limit: usize) -> Result<Vec<Message>> {
            let mut state = self.state();
            state.fetches.push(limit);
            if state.failing {
                bail!("connection reset");
            }
            Ok(state.messages.iter().take(limit).cloned().collect())
        }

        async fn send_message(
            &self,
            channel: &ChannelId,
            content: &str,
            reply: Option<&MessageReference>,
        ) -> Result<Message> {
            let mut state = self.state();
            if state.fail_send {
                bail!("403 Forbidden");
            }
            state.sent.push((channel.clone(), content.to_string(), reply.cloned()));
            Ok(message("9999", "me", content))
        }

        async fn notify_typing(&self, _channel: &ChannelId) -> Result<()> {
            let mut state = self.state();
            state.typing += 1;
            if state.fail_typing {
                bail!("typing unavailable");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingLinks {
        pub opened: Vec<String>,
        pub copied: Vec<String>,
        pub fail: bool,
    }

    impl LinkHandler for RecordingLinks {
        fn open_link(&mut self, url: &str) -> Result<()> {
            if self.fail {
                bail!("no browser");
            }
            self.opened.push(url.to_string());
            Ok(())
        }

        fn copy_text(&mut self, text: &str) -> Result<()> {
            if self.fail {
                bail!("no clipboard");
            }
            self.copied.push(text.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChannelKind;
    use crate::chat::layout::tests::{message, with_attachments};
    use crate::chat::state::Mode;
    use testing::{FakeBackend, RecordingLinks};

    const W: u16 = 80;
    const H: u16 = 12;

    fn channel() -> Channel {
        Channel {
            id: "chan".into(),
            kind: ChannelKind::Text,
            name: Some("general".into()),
            topic: Some("all things".into()),
            parent_id: None,
            guild_id: Some("guild".into()),
            position: 0,
            last_message_id: None,
            recipients: Vec::new(),
        }
    }

    fn session(backend: FakeBackend) -> ChatSession<FakeBackend, RecordingLinks> {
        ChatSession::new(
            channel(),
            backend,
            RecordingLinks::default(),
            MessageCache::new(50, 500),
            KeyBindings::default(),
        )
    }

    async fn press(s: &mut ChatSession<FakeBackend, RecordingLinks>, actions: &[Action]) -> Flow {
        let mut flow = Flow::Continue;
        for action in actions {
            flow = s.handle_action(*action, W, H).await;
        }
        flow
    }

    async fn type_line(s: &mut ChatSession<FakeBackend, RecordingLinks>, text: &str) {
        for c in text.chars() {
            s.handle_action(Action::Char(c), W, H).await;
        }
        s.handle_action(Action::Submit, W, H).await;
    }

    #[tokio::test]
    async fn test_reply_send_carries_reference_then_clears() {
        let mut s = session(FakeBackend::with_messages(3));
        s.refresh_if_stale().await;
        press(&mut s, &[Action::Select, Action::Up, Action::Reply]).await;
        type_line(&mut s, "hello").await;
        assert_eq!(s.interaction().mode(), &Mode::Browse);

        press(&mut s, &[Action::Compose]).await;
        type_line(&mut s, "again").await;

        let sent = s.backend().state().sent.clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "chan");
        assert_eq!(sent[0].1, "hello");
        assert_eq!(
            sent[0].2,
            Some(MessageReference {
                channel_id: "chan".into(),
                guild_id: Some("guild".into()),
                message_id: "2".into(),
            })
        );
        assert_eq!(sent[1].1, "again");
        assert_eq!(sent[1].2, None);
        assert_eq!(s.backend().state().typing, 1);
    }

    #[tokio::test]
    async fn test_successful_send_refetches_history() {
        let mut s = session(FakeBackend::with_messages(3));
        s.refresh_if_stale().await;
        press(&mut s, &[Action::Compose]).await;
        type_line(&mut s, "hi").await;
        s.refresh_if_stale().await;
        assert_eq!(s.backend().fetch_limits(), [50, 50]);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_not_retried() {
        let backend = FakeBackend::with_messages(2);
        backend.state().fail_send = true;
        let mut s = session(backend);
        s.refresh_if_stale().await;
        press(&mut s, &[Action::Compose]).await;
        type_line(&mut s, "lost").await;
        assert_eq!(s.interaction().mode(), &Mode::Browse);
        assert!(s.notice().is_some_and(|n| n.starts_with("message not sent")));
        assert_eq!(s.messages().len(), 2);
        assert!(s.backend().state().sent.is_empty());

        // The user can compose again straight away.
        press(&mut s, &[Action::Compose]).await;
        assert!(s.interaction().is_composing());
        assert_eq!(s.notice(), None);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_stale_view() {
        let mut s = session(FakeBackend::with_messages(4));
        s.refresh_if_stale().await;
        s.backend().set_failing(true);
        for _ in 0..501 {
            s.tick();
        }
        s.refresh_if_stale().await;
        assert_eq!(s.messages().len(), 4);
        assert!(s.notice().is_some());
        let frame = s.frame(W, H);
        assert_eq!(frame.row(10), Some(" user4: message 4"));
    }

    #[tokio::test]
    async fn test_typing_failure_is_ignored() {
        let backend = FakeBackend::with_messages(1);
        backend.state().fail_typing = true;
        let mut s = session(backend);
        assert_eq!(press(&mut s, &[Action::Compose]).await, Flow::Continue);
        assert!(s.interaction().is_composing());
        assert_eq!(s.notice(), None);
    }

    #[tokio::test]
    async fn test_running_past_cache_grows_history_and_moves() {
        let mut s = session(FakeBackend::with_messages(60));
        s.refresh_if_stale().await;
        assert_eq!(s.messages().len(), 50);

        let mut ups = vec![Action::Select];
        ups.extend(std::iter::repeat_n(Action::Up, 49));
        press(&mut s, &ups).await;
        assert_eq!(s.interaction().selection().map(|sel| sel.message), Some(49));

        press(&mut s, &[Action::Up]).await;
        assert_eq!(s.backend().fetch_limits(), [50, 100]);
        assert_eq!(s.messages().len(), 60);
        assert_eq!(s.interaction().selection().map(|sel| sel.message), Some(50));

        // Everything is loaded now: the oldest message is a wall.
        press(&mut s, &std::iter::repeat_n(Action::Up, 12).collect::<Vec<_>>()).await;
        assert_eq!(s.interaction().selection().map(|sel| sel.message), Some(59));
        assert_eq!(s.backend().fetch_limits(), [50, 100]);
    }

    #[tokio::test]
    async fn test_small_channel_never_overfetches() {
        let mut s = session(FakeBackend::with_messages(3));
        s.refresh_if_stale().await;
        press(&mut s, &[Action::Select, Action::Up, Action::Up, Action::Up]).await;
        assert_eq!(s.interaction().selection().map(|sel| sel.message), Some(2));
        assert_eq!(s.backend().fetch_limits(), [50]);
    }

    #[tokio::test]
    async fn test_open_and_copy_attachment() {
        let backend = FakeBackend::from_messages(vec![
            message("2", "ann", "latest"),
            with_attachments(message("1", "bob", "pics"), &["cat.png", "dog.png"]),
        ]);
        let mut s = session(backend);
        s.refresh_if_stale().await;
        press(
            &mut s,
            &[Action::Select, Action::Up, Action::Attachments, Action::Up, Action::Open],
        )
        .await;
        press(&mut s, &[Action::Down, Action::Copy]).await;
        assert_eq!(s.links().opened, ["https://cdn.test/dog.png"]);
        assert_eq!(s.links().copied, ["https://cdn.test/cat.png"]);

        press(&mut s, &[Action::Escape]).await;
        assert_eq!(s.interaction().mode(), &Mode::Browse);
        assert_eq!(press(&mut s, &[Action::Quit]).await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_compose_pauses_refresh() {
        let mut s = session(FakeBackend::with_messages(2));
        s.refresh_if_stale().await;
        press(&mut s, &[Action::Compose]).await;
        for _ in 0..600 {
            s.tick();
        }
        s.refresh_if_stale().await;
        assert_eq!(s.backend().fetch_limits(), [50]);
    }

    #[tokio::test]
    async fn test_render_key_tracks_observable_state() {
        let mut s = session(FakeBackend::with_messages(3));
        s.refresh_if_stale().await;
        let first = s.render_key(W, H);
        assert_eq!(first, s.render_key(W, H));
        press(&mut s, &[Action::Select]).await;
        let selecting = s.render_key(W, H);
        assert_ne!(first, selecting);
        press(&mut s, &[Action::Up]).await;
        assert_ne!(selecting, s.render_key(W, H));
        assert_ne!(s.render_key(W, H), s.render_key(W + 1, H));
    }

    #[tokio::test]
    async fn test_selection_clamped_after_history_shrinks() {
        let mut s = session(FakeBackend::with_messages(5));
        s.refresh_if_stale().await;
        press(&mut s, &[Action::Select, Action::Up, Action::Up, Action::Up, Action::Up]).await;
        s.backend().state().messages.truncate(2);
        s.cache.invalidate(&s.channel.id);
        s.refresh_if_stale().await;
        s.sync(W, H);
        assert_eq!(s.interaction().selection().map(|sel| sel.message), Some(1));
    }

    #[tokio::test]
    async fn test_attachment_stays_on_its_message_across_refresh() {
        let backend = FakeBackend::from_messages(vec![with_attachments(
            message("1", "bob", "pics"),
            &["a.png", "b.png"],
        )]);
        let mut s = session(backend);
        s.refresh_if_stale().await;
        press(&mut s, &[Action::Select, Action::Attachments, Action::Down]).await;

        s.backend().state().messages.insert(
            0,
            with_attachments(message("2", "ann", "more"), &["x.png", "y.png"]),
        );
        for _ in 0..501 {
            s.tick();
        }
        s.refresh_if_stale().await;
        s.sync(W, H);

        let sel = s.interaction().selection().cloned();
        assert_eq!(sel.as_ref().map(|sel| sel.message), Some(1));
        assert_eq!(sel.and_then(|sel| sel.message_id), Some("1".to_string()));
        press(&mut s, &[Action::Open]).await;
        assert_eq!(s.links().opened, ["https://cdn.test/b.png"]);
    }
}
