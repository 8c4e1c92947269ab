//! Opening attachment links and copying them to the clipboard.

use anyhow::{Context, Result};
use arboard::Clipboard;
use tracing::info;

/// Side-effecting link capabilities. Failures are reported but never fatal.
pub trait LinkHandler {
    fn open_link(&mut self, url: &str) -> Result<()>;
    fn copy_text(&mut self, text: &str) -> Result<()>;
}

/// Uses the desktop's URL handler and the system clipboard.
#[derive(Default)]
pub struct SystemLinks {
    // Kept alive so the copied text stays available on X11/Wayland, where the
    // owning process serves clipboard requests.
    clipboard: Option<Clipboard>,
}

impl SystemLinks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkHandler for SystemLinks {
    /// The opener runs detached so its output cannot land on the chat view.
    fn open_link(&mut self, url: &str) -> Result<()> {
        open::that_detached(url).with_context(|| format!("Failed to open {url}"))?;
        info!("opened {url}");
        Ok(())
    }

    fn copy_text(&mut self, text: &str) -> Result<()> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new().context("Failed to access clipboard")?,
        };
        self.clipboard
            .insert(clipboard)
            .set_text(text)
            .context("Failed to copy to clipboard")?;
        info!("copied {} bytes to clipboard", text.len());
        Ok(())
    }
}
