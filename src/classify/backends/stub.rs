use anyhow::Result;

use crate::classify::backend::ClassifierBackend;
use crate::preprocess::InputTensor;

/// Stub backend. Returns the same probability vector for every input and counts
/// how often it was asked.
pub struct StubClassifier {
    probabilities: Vec<f32>,
    calls: u64,
}

impl StubClassifier {
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self {
            probabilities,
            calls: 0,
        }
    }

    /// Equal probability for each of `classes` classes; always below a 0.5 cutoff
    /// once there are three or more classes.
    pub fn uniform(classes: usize) -> Self {
        let p = if classes == 0 {
            0.0
        } else {
            1.0 / classes as f32
        };
        Self::new(vec![p; classes])
    }

    /// Number of `predict` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl ClassifierBackend for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn output_width(&self) -> Option<usize> {
        Some(self.probabilities.len())
    }

    fn predict(&mut self, _input: &InputTensor) -> Result<Vec<f32>> {
        self.calls += 1;
        Ok(self.probabilities.clone())
    }
}
