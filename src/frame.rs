//! Captured frames.
//!
//! A `Frame` is produced once per loop iteration by a `FrameSource`, owned by that
//! iteration and dropped at its end. Pixels are always stored as packed RGB24;
//! sources convert from their native format before handing a frame over.

use anyhow::{anyhow, Result};
use image::{imageops, RgbImage};

use crate::roi::Roi;

pub struct Frame {
    image: RgbImage,
    /// 1-based capture counter assigned by the source.
    pub sequence: u64,
}

impl Frame {
    /// Build a frame from packed RGB24 bytes.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("failed to wrap {}x{} RGB buffer", width, height))?;
        Ok(Self { image, sequence })
    }

    pub fn from_image(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Flip left to right for a natural self-view.
    pub fn mirror(&mut self) {
        imageops::flip_horizontal_in_place(&mut self.image);
    }

    /// Copy the pixels inside `roi`. Returns `None` for an empty ROI.
    pub fn crop(&self, roi: &Roi) -> Option<RgbImage> {
        if roi.is_empty() || roi.x2 > self.width() || roi.y2 > self.height() {
            return None;
        }
        Some(imageops::crop_imm(&self.image, roi.x1, roi.y1, roi.width(), roi.height()).to_image())
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        let image = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 7]));
        Frame::from_image(image, 1)
    }

    #[test]
    fn from_rgb_validates_length() {
        assert!(Frame::from_rgb(vec![0u8; 11], 2, 2, 1).is_err());
        let frame = Frame::from_rgb(vec![0u8; 12], 2, 2, 1).unwrap();
        assert_eq!((frame.width(), frame.height()), (2, 2));
    }

    #[test]
    fn mirror_flips_columns() {
        let mut frame = gradient(4, 2);
        frame.mirror();
        assert_eq!(frame.image().get_pixel(0, 0).0, [3, 0, 7]);
        assert_eq!(frame.image().get_pixel(3, 1).0, [0, 1, 7]);
    }

    #[test]
    fn crop_copies_roi_pixels() {
        let frame = gradient(10, 10);
        let roi = Roi {
            x1: 2,
            y1: 3,
            x2: 5,
            y2: 7,
        };
        let region = frame.crop(&roi).unwrap();
        assert_eq!(region.dimensions(), (3, 4));
        assert_eq!(region.get_pixel(0, 0).0, [2, 3, 7]);
        assert_eq!(region.get_pixel(2, 3).0, [4, 6, 7]);
    }

    #[test]
    fn crop_rejects_empty_roi() {
        let frame = gradient(10, 10);
        let roi = Roi {
            x1: 4,
            y1: 4,
            x2: 4,
            y2: 8,
        };
        assert!(frame.crop(&roi).is_none());
    }
}
