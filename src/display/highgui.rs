use anyhow::{Context, Result};
use opencv::core::{Mat, Point, Rect, Scalar, Vec3b};
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use super::{Color, Display, Overlay};
use crate::frame::Frame;

/// Titled OpenCV window. Keys are read with a 1 ms `wait_key`.
pub struct OpenCvWindow {
    title: String,
    open: bool,
}

impl OpenCvWindow {
    pub fn open(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("open window '{}'", title))?;
        Ok(Self {
            title: title.to_string(),
            open: true,
        })
    }

    fn to_bgr_mat(frame: &Frame) -> Result<Mat> {
        let pixels: Vec<Vec3b> = frame
            .image()
            .pixels()
            .map(|px| Vec3b::from([px[2], px[1], px[0]]))
            .collect();
        let borrowed =
            Mat::new_rows_cols_with_data(frame.height() as i32, frame.width() as i32, &pixels)
                .context("wrap frame pixels")?;
        borrowed.try_clone().context("copy frame pixels")
    }
}

fn scalar(color: Color) -> Scalar {
    Scalar::new(
        f64::from(color.b),
        f64::from(color.g),
        f64::from(color.r),
        0.0,
    )
}

impl Display for OpenCvWindow {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn present(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()> {
        let mut mat = Self::to_bgr_mat(frame)?;

        for rect in &overlay.rects {
            imgproc::rectangle(
                &mut mat,
                Rect::new(
                    rect.roi.x1 as i32,
                    rect.roi.y1 as i32,
                    rect.roi.width() as i32,
                    rect.roi.height() as i32,
                ),
                scalar(rect.color),
                rect.thickness,
                imgproc::LINE_8,
                0,
            )
            .context("draw roi")?;
        }
        for text in &overlay.texts {
            imgproc::put_text(
                &mut mat,
                &text.text,
                Point::new(text.x, text.y),
                imgproc::FONT_HERSHEY_SIMPLEX,
                text.scale,
                scalar(text.color),
                text.thickness,
                imgproc::LINE_AA,
                false,
            )
            .context("draw text")?;
        }

        highgui::imshow(&self.title, &mat).context("show frame")?;
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>> {
        let key = highgui::wait_key(1).context("poll keyboard")?;
        if key < 0 {
            return Ok(None);
        }
        Ok(Some(char::from((key & 0xFF) as u8)))
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(err) = highgui::destroy_all_windows() {
            log::warn!("failed to close window '{}': {}", self.title, err);
        }
    }
}

impl Drop for OpenCvWindow {
    fn drop(&mut self) {
        self.close();
    }
}
