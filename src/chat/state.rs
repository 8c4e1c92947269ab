//! Modal interaction state for the chat view.
//!
//! Key actions are interpreted against the current [`Mode`] and turned into an
//! [`Effect`] that the session carries out. The state itself never touches the
//! network or the terminal.

use tracing::debug;

use crate::api::{Message, MessageId};

use super::cursor::{self, Direction, Move};
use super::layout::{Gutter, Marks};

/// Abstract key actions. Bindings map physical keys onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Escape,
    Compose,
    Select,
    Reply,
    Attachments,
    Open,
    Copy,
    Quit,
    /// Ctrl+C: leave the view from any mode.
    Interrupt,
    // Line editing while composing.
    Char(char),
    Backspace,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub message_id: MessageId,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub message: usize,
    /// Id of the selected message, so a refresh that shifts indices can find it again.
    pub message_id: Option<MessageId>,
    /// Bottom-up row shown on the last line of the viewport.
    pub offset: usize,
    pub attachment: Option<usize>,
}

/// Waiting for a line of input. Navigation is suspended until it is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compose {
    pub input: String,
    pub reply: Option<ReplyTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Browse,
    Select(Selection),
    Compose(Compose),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Exit,
    NotifyTyping,
    Send {
        content: String,
        reply: Option<ReplyTarget>,
    },
    OpenLink(String),
    CopyLink(String),
    /// Selection ran past the oldest cached message.
    FetchOlder,
}

/// What the state machine needs to know about the current frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub messages: &'a [Message],
    /// Rows per message for the current width, newest first.
    pub heights: &'a [usize],
    /// Rows available for messages.
    pub viewport: usize,
    pub history_exhausted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Interaction {
    mode: Mode,
}

impl Selection {
    fn at(index: usize, offset: usize, messages: &[Message]) -> Self {
        Self {
            message: index,
            message_id: messages.get(index).map(|m| m.id.clone()),
            offset,
            attachment: None,
        }
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_composing(&self) -> bool {
        matches!(self.mode, Mode::Compose(_))
    }

    pub fn selection(&self) -> Option<&Selection> {
        match &self.mode {
            Mode::Select(sel) => Some(sel),
            _ => None,
        }
    }

    /// Scroll offset for the current frame. Only select mode scrolls.
    pub fn offset(&self) -> usize {
        self.selection().map_or(0, |sel| sel.offset)
    }

    /// Layout decorations for message `index`.
    pub fn marks(&self, index: usize) -> Marks {
        match &self.mode {
            Mode::Select(sel) if sel.message == index => Marks {
                gutter: match sel.attachment {
                    Some(_) => Gutter::Blank,
                    None => Gutter::Cursor,
                },
                attachment: sel.attachment,
            },
            Mode::Select(_) => Marks {
                gutter: Gutter::Blank,
                attachment: None,
            },
            _ => Marks::default(),
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        debug!(from = ?self.mode, to = ?mode, "mode change");
        self.mode = mode;
    }

    /// Pull indices back into range after the history or terminal changed.
    ///
    /// The selection follows its message by id. If that message is gone the
    /// index is clamped and the attachment selection dropped.
    pub fn clamp(&mut self, ctx: &ViewContext<'_>) {
        let Mode::Select(sel) = &mut self.mode else {
            return;
        };
        let count = ctx.messages.len();
        if count == 0 {
            *sel = Selection::default();
            return;
        }
        let found = sel
            .message_id
            .as_ref()
            .and_then(|id| ctx.messages.iter().position(|m| &m.id == id));
        match found {
            Some(index) => sel.message = index,
            None => {
                sel.message = sel.message.min(count - 1);
                sel.attachment = None;
            }
        }
        let selected = &ctx.messages[sel.message];
        sel.message_id = Some(selected.id.clone());
        let attachments = selected.attachments.len();
        sel.attachment = match sel.attachment {
            Some(i) if attachments > 0 => Some(i.min(attachments - 1)),
            _ => None,
        };
        sel.offset = cursor::fit_offset(ctx.heights, sel.message, sel.offset, ctx.viewport);
    }

    pub fn handle(&mut self, action: Action, ctx: &ViewContext<'_>) -> Effect {
        if action == Action::Interrupt {
            return Effect::Exit;
        }
        match self.mode.clone() {
            Mode::Browse => self.handle_browse(action, ctx),
            Mode::Select(sel) => self.handle_select(sel, action, ctx),
            Mode::Compose(compose) => self.handle_compose(compose, action),
        }
    }

    fn handle_browse(&mut self, action: Action, ctx: &ViewContext<'_>) -> Effect {
        match action {
            Action::Quit | Action::Escape => Effect::Exit,
            Action::Compose => {
                self.set_mode(Mode::Compose(Compose::default()));
                Effect::NotifyTyping
            }
            Action::Select => {
                self.set_mode(Mode::Select(Selection::at(0, 0, ctx.messages)));
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn handle_select(&mut self, mut sel: Selection, action: Action, ctx: &ViewContext<'_>) -> Effect {
        let current = ctx.messages.get(sel.message);
        match (action, sel.attachment) {
            (Action::Escape, _) => {
                self.set_mode(Mode::Browse);
                Effect::None
            }
            (Action::Up | Action::Down, None) => {
                let direction = match action {
                    Action::Up => Direction::Older,
                    _ => Direction::Newer,
                };
                match cursor::move_selection(
                    ctx.heights,
                    sel.message,
                    direction,
                    sel.offset,
                    ctx.viewport,
                    ctx.history_exhausted,
                ) {
                    Move::To { index, offset } => {
                        self.mode = Mode::Select(Selection::at(index, offset, ctx.messages));
                        Effect::None
                    }
                    Move::Stay => Effect::None,
                    Move::NeedMoreHistory => Effect::FetchOlder,
                }
            }
            (Action::Up | Action::Down, Some(i)) => {
                let count = current.map_or(0, |m| m.attachments.len());
                if count > 0 {
                    let next = match action {
                        Action::Up => (i + count - 1) % count,
                        _ => (i + 1) % count,
                    };
                    sel.attachment = Some(next);
                    self.mode = Mode::Select(sel);
                }
                Effect::None
            }
            (Action::Reply, _) => {
                if let Some(message) = current {
                    self.set_mode(Mode::Compose(Compose {
                        input: String::new(),
                        reply: Some(ReplyTarget {
                            message_id: message.id.clone(),
                            author: message.author_name().to_string(),
                        }),
                    }));
                }
                Effect::None
            }
            (Action::Attachments, _) => {
                if current.is_some_and(|m| !m.attachments.is_empty()) {
                    sel.attachment = Some(0);
                    self.mode = Mode::Select(sel);
                }
                Effect::None
            }
            (Action::Open | Action::Copy, Some(i)) => {
                let Some(attachment) = current.and_then(|m| m.attachments.get(i)) else {
                    return Effect::None;
                };
                let url = attachment.url.clone();
                if action == Action::Open {
                    Effect::OpenLink(url)
                } else {
                    Effect::CopyLink(url)
                }
            }
            _ => Effect::None,
        }
    }

    fn handle_compose(&mut self, mut compose: Compose, action: Action) -> Effect {
        match action {
            Action::Char(c) => {
                compose.input.push(c);
                self.mode = Mode::Compose(compose);
                Effect::None
            }
            Action::Backspace => {
                compose.input.pop();
                self.mode = Mode::Compose(compose);
                Effect::None
            }
            Action::Submit => {
                self.set_mode(Mode::Browse);
                if compose.input.trim().is_empty() {
                    Effect::None
                } else {
                    Effect::Send {
                        content: compose.input,
                        reply: compose.reply,
                    }
                }
            }
            // The line has to be submitted to leave compose mode.
            _ => Effect::None,
        }
    }
}
