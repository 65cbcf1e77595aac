//! signcam
//!
//! Live hand-sign classification from a camera feed.
//!
//! # Architecture
//!
//! One thread runs one loop: capture a frame, mirror it, crop a fixed region of
//! interest, preprocess it into a classifier tensor, run inference, overlay the
//! decision and present the frame. Each external collaborator sits behind a trait so
//! the loop runs without hardware or a model file:
//!
//! - `ingest`: frame sources (`FrameSource`): V4L2, OpenCV, synthetic `stub://`
//! - `classify`: classifier backends (`ClassifierBackend`): tract ONNX, stub
//! - `display`: windows and key polling (`Display`): OpenCV highgui, headless
//! - `pipeline`: per-frame work (ROI, preprocessing, decision, overlay)
//! - `session`: the capture/display loop and its cleanup guarantees
//! - `config`: immutable process configuration

pub mod classify;
pub mod config;
pub mod display;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod preprocess;
pub mod roi;
pub mod session;
pub mod ui;

pub use classify::{
    argmax, load_classifier, ClassifierBackend, Decision, Prediction, StubClassifier,
};
#[cfg(feature = "backend-tract")]
pub use classify::TractClassifier;
pub use config::{SignConfig, DEFAULT_LABELS};
pub use display::{open_display, Color, Display, HeadlessDisplay, Overlay};
pub use frame::Frame;
pub use ingest::{open_source, CameraTarget, FrameSource, SourceStats, SyntheticSource};
pub use pipeline::Pipeline;
pub use preprocess::{ChannelOrder, InputTensor, Preprocessor, TensorLayout};
pub use roi::Roi;
pub use session::{Session, SessionReport, SessionState, StopReason};
