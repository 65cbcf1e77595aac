//! Per-frame work: mirror, place the ROI, preprocess, classify, threshold and
//! build the overlay.

use anyhow::{Context, Result};
use image::RgbImage;

use crate::classify::{ClassifierBackend, Decision};
use crate::config::{RoiSettings, SignConfig};
use crate::display::Overlay;
use crate::frame::Frame;
use crate::preprocess::Preprocessor;
use crate::roi::Roi;

pub struct Pipeline<C> {
    roi: RoiSettings,
    mirror: bool,
    preprocessor: Preprocessor,
    labels: Vec<String>,
    threshold: f32,
    classifier: C,
}

impl<C: ClassifierBackend> Pipeline<C> {
    pub fn new(config: &SignConfig, classifier: C) -> Self {
        Self {
            roi: config.roi,
            mirror: config.display.mirror,
            preprocessor: Preprocessor::from_settings(&config.model),
            labels: config.model.labels.clone(),
            threshold: config.model.confidence_threshold,
            classifier,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Run one frame through the pipeline. The frame is mirrored in place when
    /// configured; the returned overlay carries the decision, if the ROI was
    /// classifiable.
    pub fn process(&mut self, frame: &mut Frame) -> Result<Overlay> {
        if self.mirror {
            frame.mirror();
        }

        let roi = Roi::compute(&self.roi, frame.width(), frame.height());
        let mut overlay = Overlay::new();
        overlay.mark_roi(&roi);

        if let Some(region) = frame.crop(&roi) {
            let decision = self.classify_region(&region)?;
            log::debug!(
                "frame #{}: {} (index {}, p={:.3})",
                frame.sequence,
                decision.text(),
                decision.prediction().index,
                decision.prediction().confidence
            );
            overlay.show_decision(&decision);
        }

        Ok(overlay)
    }

    /// Preprocess one ROI and decide on the classifier's answer.
    pub fn classify_region(&mut self, region: &RgbImage) -> Result<Decision> {
        let input = self.preprocessor.prepare(region)?;
        let probabilities = self
            .classifier
            .predict(&input)
            .with_context(|| format!("{} classifier failed", self.classifier.name()))?;
        Decision::from_probabilities(&probabilities, &self.labels, self.threshold)
    }
}
