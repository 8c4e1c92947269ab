//! Key event to [`Action`] mapping.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::chat::state::Action;
use crate::config::KeyBindings;

/// Map a key press to an action.
///
/// While composing, printable characters are text rather than commands.
pub fn map_key(key: KeyEvent, bindings: &KeyBindings, composing: bool) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Some(Action::Interrupt);
    }

    if composing {
        return match key.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Esc => Some(Action::Escape),
            KeyCode::Char(c) if !ctrl => Some(Action::Char(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Esc => Some(Action::Escape),
        KeyCode::Char(c) if !ctrl => {
            let b = bindings;
            let action = if c == b.compose {
                Action::Compose
            } else if c == b.select {
                Action::Select
            } else if c == b.reply {
                Action::Reply
            } else if c == b.attachments {
                Action::Attachments
            } else if c == b.open {
                Action::Open
            } else if c == b.copy {
                Action::Copy
            } else if c == b.quit {
                Action::Quit
            } else {
                return None;
            };
            Some(action)
        }
        _ => None,
    }
}
