//! Event loop for the chat view.
//!
//! One iteration per frame: refresh the history if it went stale, redraw if
//! anything observable changed, then wait for either a key or the next frame
//! tick. Fetches and sends are awaited inline, so at most one network
//! operation is in flight and the loop resumes only when it finishes.

use std::time::Duration;

use anyhow::{Context, Result};
use ratatui::backend::Backend;
use ratatui::{DefaultTerminal, Terminal};
use tokio::sync::mpsc::Receiver;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::api::ChatBackend;
use crate::chat::render::RenderKey;
use crate::chat::state::Action;
use crate::chat::{ChatSession, Flow};
use crate::event::{UserEvent, init_user_event, keys};
use crate::links::LinkHandler;

pub struct App<B, L> {
    session: ChatSession<B, L>,
    tick: Duration,
    user_events: Receiver<std::io::Result<UserEvent>>,
    /// Key of the last frame drawn; `None` forces the next draw.
    last_drawn: Option<RenderKey>,
    /// Repaint every cell on the next draw, not just the diff.
    repaint: bool,
    size: (u16, u16),
    exit: bool,
}

impl<B: ChatBackend, L: LinkHandler> App<B, L> {
    pub fn new(session: ChatSession<B, L>, tick: Duration) -> Self {
        Self::with_events(session, tick, init_user_event())
    }

    pub fn with_events(
        session: ChatSession<B, L>,
        tick: Duration,
        user_events: Receiver<std::io::Result<UserEvent>>,
    ) -> Self {
        Self {
            session,
            tick,
            user_events,
            last_drawn: None,
            repaint: false,
            size: (80, 24),
            exit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        info!(channel = %self.session.channel().id, "entering chat view");
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.exit {
                break;
            }
            self.session.refresh_if_stale().await;
            self.draw(terminal)?;
            self.session.tick();

            tokio::select! {
                res = self.user_events.recv() => {
                    let usr_evt = res.with_context(|| anyhow::anyhow!("User event stream is ended."))?;
                    self.handle_user_event(usr_evt?).await;
                }
                _ = ticker.tick() => {}
            }
        }
        info!("leaving chat view");
        Ok(())
    }

    /// Redraw only when the frame would differ from the last one drawn.
    pub fn draw<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> Result<()> {
        if self.repaint {
            terminal.clear()?;
            self.repaint = false;
            self.last_drawn = None;
        }
        let size = terminal.size()?;
        self.size = (size.width, size.height);
        self.session.sync(size.width, size.height);

        let key = self.session.render_key(size.width, size.height);
        if self.last_drawn.as_ref() == Some(&key) {
            return Ok(());
        }

        let frame = self.session.frame(size.width, size.height);
        terminal.draw(|f| {
            let area = f.area();
            f.render_widget(&frame, area);
            if let Some(pos) = frame.cursor_position(area) {
                f.set_cursor_position(pos);
            }
        })?;
        self.last_drawn = Some(key);
        Ok(())
    }

    async fn handle_user_event(&mut self, event: UserEvent) {
        match event {
            UserEvent::Key(key) => {
                let composing = self.session.interaction().is_composing();
                let Some(action) = keys::map_key(key, self.session.keys(), composing) else {
                    return;
                };
                let (width, height) = self.size;
                if self.session.handle_action(action, width, height).await == Flow::Exit {
                    self.exit = true;
                }
                // A launched opener may have written over the screen.
                if action == Action::Open {
                    self.repaint = true;
                }
            }
            // Size is re-read on every draw; this just makes sure one happens.
            UserEvent::Resize(_, _) => self.last_drawn = None,
            _ => {}
        }
    }
}
