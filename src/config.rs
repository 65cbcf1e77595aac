use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::preprocess::{ChannelOrder, TensorLayout};

const DEFAULT_MODEL_PATH: &str = "best_asl_model.onnx";
const DEFAULT_BACKEND: &str = "tract";
const DEFAULT_INPUT_SIZE: u32 = 224;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_DEVICE: &str = "0";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_ROI_ANCHOR_X: f32 = 0.5;
const DEFAULT_ROI_TOP: u32 = 50;
const DEFAULT_ROI_SIZE: u32 = 300;
const DEFAULT_WINDOW_TITLE: &str = "ASL Detection Real-time";
const DEFAULT_QUIT_KEY: char = 'q';

/// Class names in classifier output order.
pub const DEFAULT_LABELS: [&str; 29] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R",
    "S", "T", "U", "V", "W", "X", "Y", "Z", "del", "nothing", "space",
];

#[derive(Debug, Deserialize, Default)]
struct SignConfigFile {
    model: Option<ModelConfigFile>,
    camera: Option<CameraConfigFile>,
    roi: Option<RoiConfigFile>,
    display: Option<DisplayConfigFile>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    backend: Option<String>,
    input_size: Option<u32>,
    confidence_threshold: Option<f32>,
    labels: Option<Vec<String>>,
    channel_order: Option<ChannelOrder>,
    layout: Option<TensorLayout>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RoiConfigFile {
    anchor_x: Option<f32>,
    top: Option<u32>,
    size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    window_title: Option<String>,
    quit_key: Option<char>,
    mirror: Option<bool>,
}

/// Process configuration. Built once at start-up and passed into the session.
#[derive(Debug, Clone)]
pub struct SignConfig {
    pub model: ModelSettings,
    pub camera: CameraSettings,
    pub roi: RoiSettings,
    pub display: DisplaySettings,
    /// Stop after this many frames. `None` runs until quit or end of stream.
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub path: PathBuf,
    /// Classifier backend name ("tract" or "stub").
    pub backend: String,
    /// Square spatial size the classifier expects.
    pub input_size: u32,
    /// A prediction is shown only when its confidence is strictly above this.
    pub confidence_threshold: f32,
    pub labels: Vec<String>,
    pub channel_order: ChannelOrder,
    pub layout: TensorLayout,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Device index ("0"), device node ("/dev/video0") or "stub://<name>".
    pub device: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiSettings {
    /// Left edge as a fraction of the frame width.
    pub anchor_x: f32,
    pub top: u32,
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub window_title: String,
    pub quit_key: char,
    pub mirror: bool,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self::from_file(SignConfigFile::default())
    }
}

impl Default for RoiSettings {
    fn default() -> Self {
        Self {
            anchor_x: DEFAULT_ROI_ANCHOR_X,
            top: DEFAULT_ROI_TOP,
            size: DEFAULT_ROI_SIZE,
        }
    }
}

impl SignConfig {
    /// Load configuration from `SIGNCAM_CONFIG` (if set) and environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIGNCAM_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load configuration from an explicit file path plus environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SignConfigFile) -> Self {
        let model = file.model.unwrap_or_default();
        let camera = file.camera.unwrap_or_default();
        let roi = file.roi.unwrap_or_default();
        let display = file.display.unwrap_or_default();

        Self {
            model: ModelSettings {
                path: model
                    .path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
                backend: model
                    .backend
                    .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
                input_size: model.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
                confidence_threshold: model
                    .confidence_threshold
                    .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
                labels: model.labels.unwrap_or_else(default_labels),
                channel_order: model.channel_order.unwrap_or_default(),
                layout: model.layout.unwrap_or_default(),
            },
            camera: CameraSettings {
                device: camera
                    .device
                    .unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
            },
            roi: RoiSettings {
                anchor_x: roi.anchor_x.unwrap_or(DEFAULT_ROI_ANCHOR_X),
                top: roi.top.unwrap_or(DEFAULT_ROI_TOP),
                size: roi.size.unwrap_or(DEFAULT_ROI_SIZE),
            },
            display: DisplaySettings {
                window_title: display
                    .window_title
                    .unwrap_or_else(|| DEFAULT_WINDOW_TITLE.to_string()),
                quit_key: display.quit_key.unwrap_or(DEFAULT_QUIT_KEY),
                mirror: display.mirror.unwrap_or(true),
            },
            max_frames: file.max_frames,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("SIGNCAM_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model.path = PathBuf::from(path);
            }
        }
        if let Ok(backend) = std::env::var("SIGNCAM_BACKEND") {
            if !backend.trim().is_empty() {
                self.model.backend = backend.trim().to_lowercase();
            }
        }
        if let Ok(device) = std::env::var("SIGNCAM_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(threshold) = std::env::var("SIGNCAM_THRESHOLD") {
            self.model.confidence_threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("SIGNCAM_THRESHOLD must be a number between 0 and 1"))?;
        }
        if let Ok(labels) = std::env::var("SIGNCAM_LABELS") {
            let parsed = split_csv(&labels);
            if !parsed.is_empty() {
                self.model.labels = parsed;
            }
        }
        Ok(())
    }

    /// Check invariants. Called after every layer of overrides.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.model.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "confidence threshold must be within [0, 1], got {}",
                threshold
            ));
        }
        if self.model.input_size == 0 {
            return Err(anyhow!("model input size must be greater than zero"));
        }
        if self.model.labels.is_empty() {
            return Err(anyhow!("label set must not be empty"));
        }
        let mut seen = HashSet::new();
        for label in &self.model.labels {
            if !seen.insert(label.as_str()) {
                return Err(anyhow!("duplicate label '{}' in label set", label));
            }
        }
        if self.roi.size == 0 {
            return Err(anyhow!("roi size must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.roi.anchor_x) {
            return Err(anyhow!(
                "roi anchor_x must be within [0, 1], got {}",
                self.roi.anchor_x
            ));
        }
        if self.camera.device.trim().is_empty() {
            return Err(anyhow!("camera device must not be empty"));
        }
        Ok(())
    }
}

pub fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|label| label.to_string()).collect()
}

fn read_config_file(path: &Path) -> Result<SignConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
