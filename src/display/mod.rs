//! Presentation of annotated frames and keyboard polling.
//!
//! - `highgui`: OpenCV window (feature: opencv)
//! - `headless`: logs decisions instead of drawing them

mod headless;
#[cfg(feature = "opencv")]
mod highgui;
mod overlay;

use anyhow::Result;

use crate::config::DisplaySettings;
use crate::frame::Frame;

pub use headless::HeadlessDisplay;
#[cfg(feature = "opencv")]
pub use highgui::OpenCvWindow;
pub use overlay::{Color, Overlay, RectAnnotation, TextAnnotation};

/// Output surface for the session loop.
pub trait Display {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Draw `overlay` on `frame` and show the result.
    fn present(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()>;

    /// Key pressed since the last poll, if any.
    fn poll_key(&mut self) -> Result<Option<char>>;

    /// Close any windows. Safe to call more than once.
    fn close(&mut self);
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn present(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()> {
        (**self).present(frame, overlay)
    }

    fn poll_key(&mut self) -> Result<Option<char>> {
        (**self).poll_key()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Open the window described by `settings`, or a headless display.
pub fn open_display(settings: &DisplaySettings, headless: bool) -> Result<Box<dyn Display>> {
    if headless {
        return Ok(Box::new(HeadlessDisplay::new()));
    }

    #[cfg(feature = "opencv")]
    {
        Ok(Box::new(OpenCvWindow::open(&settings.window_title)?))
    }
    #[cfg(not(feature = "opencv"))]
    {
        log::warn!(
            "built without the opencv feature; '{}' runs headless, stop it with Ctrl-C",
            settings.window_title
        );
        Ok(Box::new(HeadlessDisplay::new()))
    }
}
