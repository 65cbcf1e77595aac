#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::classify::backend::ClassifierBackend;
use crate::preprocess::InputTensor;

/// Tract-based backend for ONNX classifiers.
///
/// Loads a local model file once and runs it on single-sample batches. The input
/// fact is pinned to the shape the preprocessor produces so tract can optimize the
/// graph for it.
pub struct TractClassifier {
    model: TypedRunnableModel<TypedModel>,
    input_shape: [usize; 4],
    output_width: Option<usize>,
}

impl TractClassifier {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_shape: [usize; 4]) -> Result<Self> {
        let model_path = model_path.as_ref();
        let optimized = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(
                    input_shape[0],
                    input_shape[1],
                    input_shape[2],
                    input_shape[3]
                )),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?;

        let output_width = optimized
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().and_then(|dims| dims.last().copied()));

        let model = optimized
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_shape,
            output_width,
        })
    }

    fn build_input(&self, input: &InputTensor) -> Result<Tensor> {
        if input.shape() != self.input_shape {
            return Err(anyhow!(
                "input shape {:?} does not match model input {:?}",
                input.shape(),
                self.input_shape
            ));
        }
        let array = tract_ndarray::Array4::from_shape_vec(
            (
                self.input_shape[0],
                self.input_shape[1],
                self.input_shape[2],
                self.input_shape[3],
            ),
            input.data().to_vec(),
        )
        .context("input tensor length does not match its shape")?;
        Ok(array.into_tensor())
    }

    fn extract_probabilities(&self, outputs: TVec<TValue>) -> Result<Vec<f32>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok(scores.iter().copied().collect())
    }
}

impl ClassifierBackend for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn output_width(&self) -> Option<usize> {
        self.output_width
    }

    fn predict(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        let tensor = self.build_input(input)?;
        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .context("ONNX inference failed")?;
        self.extract_probabilities(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        let zeros = tract_ndarray::Array4::<f32>::zeros((
            self.input_shape[0],
            self.input_shape[1],
            self.input_shape[2],
            self.input_shape[3],
        ));
        self.model
            .run(tvec!(zeros.into_tensor().into()))
            .context("ONNX warm-up run failed")?;
        Ok(())
    }
}
