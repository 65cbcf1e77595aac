//! ROI to classifier tensor conversion.
//!
//! Resize to the classifier's square input size (bilinear), reorder channels to the
//! order the classifier was trained on, scale to `[0, 1]` and add a batch axis of
//! one. The layout is NHWC unless the model expects NCHW.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::Deserialize;

use crate::config::ModelSettings;

/// Channel order the classifier expects. Frames are always RGB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    #[default]
    Nhwc,
    Nchw,
}

impl TensorLayout {
    /// Shape of a single-sample batch of `size` x `size` RGB images.
    pub fn shape(self, size: usize) -> [usize; 4] {
        match self {
            TensorLayout::Nhwc => [1, size, size, 3],
            TensorLayout::Nchw => [1, 3, size, size],
        }
    }
}

/// Dense f32 tensor with a leading batch dimension of one.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    shape: [usize; 4],
}

impl InputTensor {
    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Preprocessor {
    size: u32,
    channel_order: ChannelOrder,
    layout: TensorLayout,
}

impl Preprocessor {
    pub fn new(size: u32, channel_order: ChannelOrder, layout: TensorLayout) -> Self {
        Self {
            size,
            channel_order,
            layout,
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self::new(settings.input_size, settings.channel_order, settings.layout)
    }

    pub fn input_shape(&self) -> [usize; 4] {
        self.layout.shape(self.size as usize)
    }

    pub fn prepare(&self, region: &RgbImage) -> Result<InputTensor> {
        if region.width() == 0 || region.height() == 0 {
            return Err(anyhow!("cannot preprocess an empty region"));
        }
        if region.dimensions() == (self.size, self.size) {
            return Ok(normalize(region, self.channel_order, self.layout));
        }
        let resized = imageops::resize(region, self.size, self.size, FilterType::Triangle);
        Ok(normalize(&resized, self.channel_order, self.layout))
    }
}

/// Scale an RGB image to `[0, 1]` floats in the requested order and layout.
/// Does not resize.
pub fn normalize(image: &RgbImage, order: ChannelOrder, layout: TensorLayout) -> InputTensor {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let channels: [usize; 3] = match order {
        ChannelOrder::Rgb => [0, 1, 2],
        ChannelOrder::Bgr => [2, 1, 0],
    };
    let raw = image.as_raw();
    let mut data = vec![0f32; width * height * 3];

    for y in 0..height {
        for x in 0..width {
            let src = (y * width + x) * 3;
            for (c, &from) in channels.iter().enumerate() {
                let dst = match layout {
                    TensorLayout::Nhwc => (y * width + x) * 3 + c,
                    TensorLayout::Nchw => c * width * height + y * width + x,
                };
                data[dst] = f32::from(raw[src + from]) / 255.0;
            }
        }
    }

    let shape = match layout {
        TensorLayout::Nhwc => [1, height, width, 3],
        TensorLayout::Nchw => [1, 3, height, width],
    };
    InputTensor { data, shape }
}
