//! Frame ingestion sources.
//!
//! This module provides the sources a session can pull frames from:
//! - USB/V4L2 devices (feature: ingest-v4l2)
//! - OpenCV `VideoCapture` devices (feature: opencv)
//! - Synthetic `stub://` source (testing, demos)
//!
//! Every source hands out packed RGB24 `Frame`s. A source is opened by its
//! constructor, yields frames until end of stream, and is released exactly once by
//! the session that owns it.

#[cfg(feature = "ingest-v4l2")]
mod normalize;
#[cfg(feature = "opencv")]
pub mod videoio;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::Result;

use crate::config::CameraSettings;
use crate::frame::Frame;

#[cfg(feature = "opencv")]
pub use videoio::OpenCvCamera;
pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub device: String,
}

/// Lazy, non-restartable sequence of frames.
pub trait FrameSource {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Next frame. `Ok(None)` marks end of stream; an error is a failed read.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release the underlying device. Further reads report end of stream.
    fn release(&mut self);

    fn stats(&self) -> SourceStats;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn stats(&self) -> SourceStats {
        (**self).stats()
    }
}

/// Capture backend a `camera.device` string resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraTarget {
    /// `stub://<name>[?frames=N]`
    Synthetic,
    /// OpenCV `VideoCapture` index.
    Index(u32),
    /// V4L2 device node.
    Node(String),
}

impl CameraTarget {
    /// A bare index (`0`) maps to OpenCV when built with the `opencv` feature,
    /// otherwise to `/dev/video<index>`. Anything else is a V4L2 device node.
    pub fn resolve(device: &str) -> Self {
        let device = device.trim();
        if device.starts_with("stub://") {
            return CameraTarget::Synthetic;
        }
        match device.parse::<u32>() {
            Ok(index) if cfg!(feature = "opencv") => CameraTarget::Index(index),
            Ok(index) => CameraTarget::Node(format!("/dev/video{}", index)),
            Err(_) => CameraTarget::Node(device.to_string()),
        }
    }
}

/// Open the camera named by `settings.device`. See [`CameraTarget::resolve`].
pub fn open_source(settings: &CameraSettings) -> Result<Box<dyn FrameSource>> {
    match CameraTarget::resolve(&settings.device) {
        CameraTarget::Synthetic => Ok(Box::new(SyntheticSource::open(settings)?)),
        CameraTarget::Index(index) => open_index(index, settings),
        CameraTarget::Node(node) => open_node(&node, settings),
    }
}

#[allow(unused_variables)]
fn open_index(index: u32, settings: &CameraSettings) -> Result<Box<dyn FrameSource>> {
    #[cfg(feature = "opencv")]
    {
        Ok(Box::new(OpenCvCamera::open(index, settings)?))
    }
    #[cfg(not(feature = "opencv"))]
    {
        Err(anyhow::anyhow!(
            "camera index {} needs the opencv feature",
            index
        ))
    }
}

#[allow(unused_variables)]
fn open_node(node: &str, settings: &CameraSettings) -> Result<Box<dyn FrameSource>> {
    #[cfg(feature = "ingest-v4l2")]
    {
        Ok(Box::new(V4l2Source::open(node, settings)?))
    }
    #[cfg(not(feature = "ingest-v4l2"))]
    {
        Err(anyhow::anyhow!(
            "cannot open camera {}: build with the ingest-v4l2 or opencv feature",
            node
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_device_opens_synthetic_source() {
        let settings = CameraSettings {
            device: "stub://test".to_string(),
            width: 64,
            height: 48,
        };
        let mut source = open_source(&settings).unwrap();
        assert_eq!(source.name(), "synthetic");
        let frame = source.next_frame().unwrap().expect("frame");
        assert_eq!((frame.width(), frame.height()), (64, 48));
    }

    #[test]
    fn bare_index_resolves_to_a_capture_backend() {
        let target = CameraTarget::resolve(" 0 ");
        if cfg!(feature = "opencv") {
            assert_eq!(target, CameraTarget::Index(0));
        } else {
            assert_eq!(target, CameraTarget::Node("/dev/video0".to_string()));
        }
    }

    #[test]
    fn device_paths_and_stubs_resolve_verbatim() {
        assert_eq!(
            CameraTarget::resolve("/dev/video2"),
            CameraTarget::Node("/dev/video2".to_string())
        );
        assert_eq!(
            CameraTarget::resolve("stub://demo?frames=3"),
            CameraTarget::Synthetic
        );
    }

    #[test]
    fn default_build_can_open_the_default_camera() {
        assert!(cfg!(feature = "ingest-v4l2") || cfg!(feature = "opencv"));
    }
}
