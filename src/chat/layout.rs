//! Text layout for the chat transcript.
//!
//! A message becomes a block of fixed-width rows: the author label and the
//! wrapped content, then an optional attachment listing. Everything here is a
//! pure function of its inputs so the cursor and renderer can recompute the
//! layout every frame from the current terminal width.

use std::ops::Range;

use unicode_width::UnicodeWidthChar;

use crate::api::Message;

pub const ATTACHMENTS_HEADER: &str = "   attachments:";

/// Selection marker column shown in front of the author in select mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gutter {
    /// Not selecting: no marker column at all.
    #[default]
    None,
    /// Reserved but empty.
    Blank,
    /// The selected message.
    Cursor,
}

/// Per-message decorations that depend on the interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Marks {
    pub gutter: Gutter,
    /// Highlighted attachment, when this message's attachments are being browsed.
    pub attachment: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Body,
    AttachmentHeader,
    Attachment { index: usize, highlighted: bool },
}

/// One terminal row, tagged with the message it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLine {
    pub message: usize,
    pub kind: LineKind,
    pub text: String,
}

/// `" <author>: "`, preceded by the gutter marker when one is reserved.
pub fn author_label(author: &str, gutter: Gutter) -> String {
    let marker = match gutter {
        Gutter::None => "",
        Gutter::Blank => " ",
        Gutter::Cursor => ">",
    };
    format!("{marker} {author}: ")
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Hard-wrap `text` into rows of at most `width` columns.
///
/// Breaks fall exactly at the width limit, never on word boundaries, so the
/// rows concatenate back to the input minus its newlines. A `\n` always ends
/// the current row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut used = 0;
    for c in text.chars() {
        if c == '\n' {
            rows.push(std::mem::take(&mut row));
            used = 0;
            continue;
        }
        let w = c.width().unwrap_or(0);
        if used + w > width && !row.is_empty() {
            rows.push(std::mem::take(&mut row));
            used = 0;
        }
        row.push(c);
        used += w;
    }
    rows.push(row);
    rows
}

/// Lay out one message for a terminal `width` columns wide.
pub fn layout_message(index: usize, message: &Message, width: usize, marks: Marks) -> Vec<LayoutLine> {
    let label = author_label(message.author_name(), marks.gutter);
    let label_width = display_width(&label);
    let padding = " ".repeat(label_width);

    let content = match &message.reply_to {
        Some(reply) => format!("@{} {}", reply.author, message.content),
        None => message.content.clone(),
    };

    let mut lines: Vec<LayoutLine> = wrap(&content, width.saturating_sub(label_width))
        .into_iter()
        .enumerate()
        .map(|(i, row)| LayoutLine {
            message: index,
            kind: LineKind::Body,
            text: if i == 0 {
                format!("{label}{row}")
            } else {
                format!("{padding}{row}")
            },
        })
        .collect();

    if !message.attachments.is_empty() {
        lines.push(LayoutLine {
            message: index,
            kind: LineKind::AttachmentHeader,
            text: ATTACHMENTS_HEADER.to_string(),
        });
        for (i, attachment) in message.attachments.iter().enumerate() {
            let highlighted = marks.attachment == Some(i);
            let bullet = match marks.attachment {
                Some(_) if highlighted => ">",
                Some(_) => "|",
                None => " ",
            };
            lines.push(LayoutLine {
                message: index,
                kind: LineKind::Attachment { index: i, highlighted },
                text: format!("   {bullet} {}", attachment.filename),
            });
        }
    }
    lines
}

/// The whole channel laid out, newest message first.
///
/// Rows are addressed bottom-up: row 0 is the last line of the newest
/// message, which sits at the bottom of the viewport.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    blocks: Vec<Vec<LayoutLine>>,
}

impl Transcript {
    pub fn build<F>(messages: &[Message], width: usize, marks: F) -> Self
    where
        F: Fn(usize) -> Marks,
    {
        let blocks = messages
            .iter()
            .enumerate()
            .map(|(i, m)| layout_message(i, m, width, marks(i)))
            .collect();
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Row count of each message, by message index.
    pub fn heights(&self) -> Vec<usize> {
        self.blocks.iter().map(Vec::len).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    /// Bottom-up row range covered by message `index`.
    pub fn span(&self, index: usize) -> Range<usize> {
        let start: usize = self.blocks.iter().take(index).map(Vec::len).sum();
        let len = self.blocks.get(index).map_or(0, Vec::len);
        start..start + len
    }

    /// Rows from the bottom of the screen upward.
    pub fn rows_bottom_up(&self) -> impl Iterator<Item = &LayoutLine> {
        self.blocks.iter().flat_map(|block| block.iter().rev())
    }
}
