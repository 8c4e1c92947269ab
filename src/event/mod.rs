//! Terminal input.
//!
//! Key presses are read on a dedicated thread and forwarded over a channel so
//! the event loop can wait on input and the frame ticker together. The
//! [`keys`] submodule turns raw key events into chat actions.

pub mod keys;

use std::io::Result;
use std::thread;

use tokio::sync::mpsc::{self, Receiver};

/// Everything the terminal can report: keys, mouse, resize, focus.
pub type UserEvent = crossterm::event::Event;

/// Start the input thread.
///
/// The thread blocks on `crossterm::event::read()` and stops on its own once
/// the receiver is dropped.
pub fn init_user_event() -> Receiver<Result<UserEvent>> {
    let (tx, rx) = mpsc::channel(64);
    thread::spawn(move || {
        loop {
            if tx.blocking_send(crossterm::event::read()).is_err() {
                break;
            }
        }
    });
    rx
}
