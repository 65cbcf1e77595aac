mod backend;
mod backends;
mod loader;
mod prediction;

pub use backend::ClassifierBackend;
pub use backends::StubClassifier;
#[cfg(feature = "backend-tract")]
pub use backends::TractClassifier;
pub use loader::load_classifier;
pub use prediction::{argmax, Decision, Prediction};
