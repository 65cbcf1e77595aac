use anyhow::Result;

use super::{Display, Overlay};
use crate::frame::Frame;

/// Display without a window. Logs each decision change and never reports a key;
/// sessions using it stop on end of stream, the frame limit or an interrupt.
#[derive(Default)]
pub struct HeadlessDisplay {
    last_text: Option<String>,
    frames_presented: u64,
    closed: bool,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Display for HeadlessDisplay {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn present(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()> {
        self.frames_presented += 1;
        let text = overlay.decision().map(|decision| decision.text());
        log::debug!(
            "frame #{} {}x{}: {}",
            frame.sequence,
            frame.width(),
            frame.height(),
            text.as_deref().unwrap_or("no prediction")
        );
        if text != self.last_text {
            if let Some(text) = &text {
                log::info!("prediction: {}", text);
            }
            self.last_text = text;
        }
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>> {
        Ok(None)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            log::info!(
                "headless display closed after {} frames",
                self.frames_presented
            );
        }
    }
}
