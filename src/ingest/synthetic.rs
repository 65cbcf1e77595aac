//! Synthetic frame source.
//!
//! Serves generated frames for `stub://` devices so the whole loop can run without
//! camera hardware. An optional `?frames=N` suffix ends the stream after `N`
//! frames, e.g. `stub://demo?frames=100`.

use anyhow::{anyhow, Result};

use super::{FrameSource, SourceStats};
use crate::config::CameraSettings;
use crate::frame::Frame;

pub struct SyntheticSource {
    device: String,
    width: u32,
    height: u32,
    frame_bytes: usize,
    frame_limit: Option<u64>,
    frame_count: u64,
    /// Simulated scene state; shifts the pattern every 50 frames.
    scene_state: u8,
    released: bool,
}

impl SyntheticSource {
    pub fn open(settings: &CameraSettings) -> Result<Self> {
        let device = settings.device.trim();
        let rest = device
            .strip_prefix("stub://")
            .ok_or_else(|| anyhow!("synthetic source requires a stub:// device, got {}", device))?;
        let frame_limit = match rest.split_once('?') {
            Some((_, query)) => parse_frame_limit(query)?,
            None => None,
        };
        if settings.width == 0 || settings.height == 0 {
            return Err(anyhow!(
                "synthetic frame size must be non-zero, got {}x{}",
                settings.width,
                settings.height
            ));
        }
        let frame_bytes = (settings.width as usize)
            .checked_mul(settings.height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| {
                anyhow!(
                    "synthetic frame size {}x{} overflows",
                    settings.width,
                    settings.height
                )
            })?;

        log::info!(
            "SyntheticSource: connected to {} ({}x{})",
            device,
            settings.width,
            settings.height
        );
        Ok(Self {
            device: device.to_string(),
            width: settings.width,
            height: settings.height,
            frame_bytes,
            frame_limit,
            frame_count: 0,
            scene_state: 0,
            released: false,
        })
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; self.frame_bytes];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.released {
            return Ok(None);
        }
        if self
            .frame_limit
            .is_some_and(|limit| self.frame_count >= limit)
        {
            return Ok(None);
        }
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Frame::from_rgb(pixels, self.width, self.height, self.frame_count).map(Some)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            log::info!("SyntheticSource: released {}", self.device);
        }
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            device: self.device.clone(),
        }
    }
}

fn parse_frame_limit(query: &str) -> Result<Option<u64>> {
    for pair in query.split('&') {
        if let Some(("frames", value)) = pair.split_once('=') {
            let limit = value
                .parse()
                .map_err(|_| anyhow!("stub frames must be an integer, got '{}'", value))?;
            return Ok(Some(limit));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(device: &str) -> CameraSettings {
        CameraSettings {
            device: device.to_string(),
            width: 32,
            height: 24,
        }
    }

    #[test]
    fn produces_frames_until_limit() -> Result<()> {
        let mut source = SyntheticSource::open(&settings("stub://test?frames=2"))?;
        assert_eq!(source.next_frame()?.map(|f| f.sequence), Some(1));
        assert_eq!(source.next_frame()?.map(|f| f.sequence), Some(2));
        assert!(source.next_frame()?.is_none());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn unlimited_without_query() -> Result<()> {
        let mut source = SyntheticSource::open(&settings("stub://test"))?;
        for _ in 0..120 {
            assert!(source.next_frame()?.is_some());
        }
        Ok(())
    }

    #[test]
    fn released_source_reports_end_of_stream() -> Result<()> {
        let mut source = SyntheticSource::open(&settings("stub://test"))?;
        source.release();
        assert!(source.next_frame()?.is_none());
        Ok(())
    }

    #[test]
    fn rejects_oversized_frames() {
        let oversized = CameraSettings {
            device: "stub://huge".to_string(),
            width: u32::MAX,
            height: u32::MAX,
        };
        let err = SyntheticSource::open(&oversized).err().expect("must fail");
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn large_frames_are_sized_without_u32_wraparound() -> Result<()> {
        let wide = CameraSettings {
            device: "stub://wide".to_string(),
            width: 40_000,
            height: 40_000,
        };
        let source = SyntheticSource::open(&wide)?;
        assert_eq!(source.frame_bytes, 40_000usize * 40_000 * 3);
        Ok(())
    }

    #[test]
    fn rejects_bad_frame_limit() {
        assert!(SyntheticSource::open(&settings("stub://test?frames=many")).is_err());
    }
}
