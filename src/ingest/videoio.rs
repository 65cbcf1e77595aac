//! OpenCV capture source.
//!
//! Opens a camera by index through the platform's default `VideoCapture` backend
//! and converts the BGR frames OpenCV hands back into RGB `Frame`s.

use anyhow::{anyhow, Context, Result};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio;

use super::{FrameSource, SourceStats};
use crate::config::CameraSettings;
use crate::frame::Frame;

pub struct OpenCvCamera {
    index: u32,
    capture: Option<videoio::VideoCapture>,
    frame_count: u64,
}

impl OpenCvCamera {
    pub fn open(index: u32, settings: &CameraSettings) -> Result<Self> {
        let mut capture = videoio::VideoCapture::new(index as i32, videoio::CAP_ANY)
            .with_context(|| format!("open camera {}", index))?;
        if !capture.is_opened().context("query camera state")? {
            return Err(anyhow!("camera {} could not be opened", index));
        }
        for (prop, value) in [
            (videoio::CAP_PROP_FRAME_WIDTH, settings.width),
            (videoio::CAP_PROP_FRAME_HEIGHT, settings.height),
        ] {
            if let Err(err) = capture.set(prop, f64::from(value)) {
                log::warn!("OpenCvCamera: failed to set property {}: {}", prop, err);
            }
        }

        log::info!("OpenCvCamera: connected to camera {}", index);
        Ok(Self {
            index,
            capture: Some(capture),
            frame_count: 0,
        })
    }
}

impl FrameSource for OpenCvCamera {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(None);
        };
        let mut mat = Mat::default();
        let grabbed = capture.read(&mut mat).context("read camera frame")?;
        if !grabbed || mat.empty() {
            return Ok(None);
        }
        if mat.channels() != 3 {
            return Err(anyhow!(
                "expected a 3-channel BGR frame, got {} channels",
                mat.channels()
            ));
        }

        let width = mat.cols() as u32;
        let height = mat.rows() as u32;
        let mat = if mat.is_continuous() {
            mat
        } else {
            mat.try_clone().context("copy camera frame")?
        };
        let rgb: Vec<u8> = mat
            .data_bytes()
            .context("access camera frame bytes")?
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();

        self.frame_count += 1;
        Frame::from_rgb(rgb, width, height, self.frame_count).map(Some)
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(err) = capture.release() {
                log::warn!("OpenCvCamera: release failed: {}", err);
            }
            log::info!("OpenCvCamera: released camera {}", self.index);
        }
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            device: self.index.to_string(),
        }
    }
}
