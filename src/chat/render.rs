//! Turning the chat view into terminal rows.
//!
//! [`build_frame`] is pure: it maps the transcript, scroll offset and mode to
//! a list of row draws. [`ChatFrame`] paints those onto a ratatui buffer, and
//! [`RenderKey`] lets the event loop skip frames where nothing observable
//! changed.

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthChar;

use crate::config::KeyBindings;

use super::layout::{LineKind, Transcript, display_width};
use super::state::{Compose, Mode};

pub const EMPTY_CHANNEL: &str = "no messages. maybe start a conversation?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Header,
    Body,
    Selected,
    Attachment,
    Hint,
    Notice,
    Input,
}

impl RowStyle {
    fn style(self) -> Style {
        match self {
            RowStyle::Header => Style::default().add_modifier(Modifier::BOLD),
            RowStyle::Body => Style::default(),
            RowStyle::Selected => Style::default().add_modifier(Modifier::BOLD),
            RowStyle::Attachment => Style::default().fg(Color::Cyan),
            RowStyle::Hint => Style::default().fg(Color::DarkGray),
            RowStyle::Notice => Style::default().fg(Color::Red),
            RowStyle::Input => Style::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOp {
    pub row: u16,
    pub text: String,
    pub style: RowStyle,
}

/// Everything one frame shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatFrame {
    pub ops: Vec<DrawOp>,
    /// Terminal cursor, shown only while composing.
    pub cursor: Option<(u16, u16)>,
}

/// Inputs that determine a frame. Equal keys draw identical frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderKey {
    pub generation: u64,
    pub mode: Mode,
    pub size: (u16, u16),
    pub notice: Option<String>,
}

pub struct FrameInput<'a> {
    pub label: &'a str,
    pub topic: Option<&'a str>,
    pub transcript: &'a Transcript,
    pub mode: &'a Mode,
    pub offset: usize,
    pub notice: Option<&'a str>,
    pub keys: &'a KeyBindings,
}

/// Rows left for messages once the header and footer are taken.
pub fn viewport_rows(height: u16) -> usize {
    usize::from(height.saturating_sub(2))
}

/// `" <label>"` with the topic right-aligned when it fits.
pub fn header_line(label: &str, topic: Option<&str>, width: usize) -> String {
    let start = format!(" {label}");
    let Some(topic) = topic.filter(|t| !t.is_empty()) else {
        return start;
    };
    let used = display_width(&start) + display_width(topic);
    if used >= width {
        return start;
    }
    format!("{start}{}{topic}", " ".repeat(width - 1 - used))
}

fn legend_entry(key: char, word: &str) -> String {
    match word.strip_prefix(key) {
        Some(rest) => format!("[{key}]{rest}"),
        None => format!("[{key}] {word}"),
    }
}

/// Key legend for select mode.
pub fn select_legend(keys: &KeyBindings, browsing_attachments: bool) -> String {
    if browsing_attachments {
        format!(
            "[^] [v]; {}, {}",
            legend_entry(keys.open, "open"),
            legend_entry(keys.copy, "copy url")
        )
    } else {
        format!(
            "[^] [v]; {}, {}",
            legend_entry(keys.reply, "reply"),
            legend_entry(keys.attachments, "attachments")
        )
    }
}

/// The input line: prompt plus the page of input that holds the caret.
///
/// Returns the text and the caret column.
pub fn input_line(compose: &Compose, width: usize) -> (String, usize) {
    let prompt = match &compose.reply {
        Some(reply) => format!("@{} ~ ", reply.author),
        None => "~ ".to_string(),
    };
    let prompt_width = display_width(&prompt);
    let page_width = width.saturating_sub(prompt_width + 1).max(1);

    // Split the input into pages that each fit after the prompt.
    let mut pages: Vec<(usize, usize)> = vec![(0, 0)];
    for (idx, c) in compose.input.char_indices() {
        let w = c.width().unwrap_or(0);
        let Some(last) = pages.last_mut() else { break };
        if last.1 + w > page_width {
            pages.push((idx, w));
        } else {
            last.1 += w;
        }
    }
    let page_count = pages.len();
    let (start, used) = pages[page_count - 1];
    let tail = &compose.input[start..];
    let lead = if page_count == 1 {
        prompt
    } else {
        format!("{:<prompt_width$}", "- ")
    };
    (format!("{lead}{tail}"), prompt_width + used)
}

pub fn build_frame(input: &FrameInput<'_>, width: u16, height: u16) -> ChatFrame {
    let mut frame = ChatFrame::default();
    if height == 0 || width == 0 {
        return frame;
    }
    let cols = usize::from(width);
    frame.ops.push(DrawOp {
        row: 0,
        text: header_line(input.label, input.topic, cols),
        style: RowStyle::Header,
    });

    let viewport = viewport_rows(height);
    let footer = height - 1;
    if input.transcript.is_empty() {
        if viewport > 0 {
            frame.ops.push(DrawOp {
                row: footer - 1,
                text: EMPTY_CHANNEL.to_string(),
                style: RowStyle::Hint,
            });
        }
    } else {
        let selected = match input.mode {
            Mode::Select(sel) => Some(sel.message),
            _ => None,
        };
        for (k, line) in input
            .transcript
            .rows_bottom_up()
            .skip(input.offset)
            .take(viewport)
            .enumerate()
        {
            let style = match line.kind {
                LineKind::Attachment { highlighted: true, .. } => RowStyle::Selected,
                LineKind::Attachment { .. } | LineKind::AttachmentHeader => RowStyle::Attachment,
                LineKind::Body if selected == Some(line.message) => RowStyle::Selected,
                LineKind::Body => RowStyle::Body,
            };
            frame.ops.push(DrawOp {
                // k < viewport = height - 2, so this stays within rows 1..=height-2.
                row: footer - 1 - k as u16,
                text: line.text.clone(),
                style,
            });
        }
    }

    if height < 2 {
        return frame;
    }
    match input.mode {
        Mode::Select(sel) => frame.ops.push(DrawOp {
            row: footer,
            text: select_legend(input.keys, sel.attachment.is_some()),
            style: RowStyle::Hint,
        }),
        Mode::Compose(compose) => {
            let (text, caret) = input_line(compose, cols);
            frame.cursor = Some((caret.min(cols - 1) as u16, footer));
            frame.ops.push(DrawOp {
                row: footer,
                text,
                style: RowStyle::Input,
            });
        }
        Mode::Browse => {
            if let Some(notice) = input.notice {
                frame.ops.push(DrawOp {
                    row: footer,
                    text: notice.to_string(),
                    style: RowStyle::Notice,
                });
            }
        }
    }
    frame
}

impl Widget for &ChatFrame {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for op in &self.ops {
            if op.row >= area.height {
                continue;
            }
            buf.set_stringn(
                area.x,
                area.y + op.row,
                &op.text,
                usize::from(area.width),
                op.style.style(),
            );
        }
    }
}

impl ChatFrame {
    pub fn cursor_position(&self, area: Rect) -> Option<Position> {
        self.cursor
            .map(|(x, y)| Position::new(area.x + x, area.y + y))
    }

    /// Row text by screen row, for tests and debugging.
    pub fn row(&self, row: u16) -> Option<&str> {
        self.ops
            .iter()
            .rev()
            .find(|op| op.row == row)
            .map(|op| op.text.as_str())
    }
}
