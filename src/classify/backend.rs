use anyhow::Result;

use crate::preprocess::InputTensor;

/// Classifier backend trait.
///
/// A backend is an opaque function from a single-sample input tensor to a
/// probability vector over the label set. Index `i` of the returned vector must
/// correspond to label `i`; the backend cannot check label ordering, only width.
pub trait ClassifierBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Number of output classes, when the model declares it.
    fn output_width(&self) -> Option<usize> {
        None
    }

    /// Run the classifier on a batch of one.
    fn predict(&mut self, input: &InputTensor) -> Result<Vec<f32>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: ClassifierBackend + ?Sized> ClassifierBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn output_width(&self) -> Option<usize> {
        (**self).output_width()
    }

    fn predict(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        (**self).predict(input)
    }

    fn warm_up(&mut self) -> Result<()> {
        (**self).warm_up()
    }
}
