use arboard::Clipboard;
use log::debug;

/// Destination for copied prompts.
pub trait ClipboardSink {
    /// Returns the platform's reason on failure.
    fn set_text(&mut self, text: &str) -> Result<(), String>;
}

/// The operating system clipboard. Opened on first use so that a missing
/// display only fails the copy, not startup.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), String> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new().map_err(|e| e.to_string())?,
        };
        let clipboard = self.inner.insert(clipboard);
        clipboard.set_text(text).map_err(|e| e.to_string())?;
        debug!("Copied {} chars to clipboard", text.chars().count());
        Ok(())
    }
}
