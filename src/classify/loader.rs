use anyhow::{anyhow, Result};

use crate::classify::backend::ClassifierBackend;
use crate::classify::backends::StubClassifier;
use crate::config::ModelSettings;
#[cfg(feature = "backend-tract")]
use crate::preprocess::Preprocessor;

/// Build the configured classifier backend.
///
/// Every failure here is fatal: a missing model file, an artifact that does not
/// deserialize, or a model whose declared output width differs from the label
/// count. Nothing is retried.
pub fn load_classifier(settings: &ModelSettings) -> Result<Box<dyn ClassifierBackend>> {
    let mut backend: Box<dyn ClassifierBackend> = match settings.backend.as_str() {
        "stub" => {
            log::warn!("using stub classifier; every frame will be reported as uncertain");
            Box::new(StubClassifier::uniform(settings.labels.len()))
        }
        "tract" => load_tract(settings)?,
        other => {
            return Err(anyhow!(
                "unknown classifier backend '{}' (expected 'tract' or 'stub')",
                other
            ))
        }
    };

    if let Some(width) = backend.output_width() {
        if width != settings.labels.len() {
            return Err(anyhow!(
                "model emits {} classes but {} labels are configured",
                width,
                settings.labels.len()
            ));
        }
    } else {
        log::warn!(
            "model output width is not static; label count {} cannot be checked at load time",
            settings.labels.len()
        );
    }

    backend.warm_up()?;
    log::info!(
        "classifier ready (backend={}, labels={})",
        backend.name(),
        settings.labels.len()
    );
    Ok(backend)
}

fn load_tract(settings: &ModelSettings) -> Result<Box<dyn ClassifierBackend>> {
    if !settings.path.exists() {
        return Err(anyhow!(
            "model file '{}' not found; place the exported ONNX model there or set SIGNCAM_MODEL_PATH",
            settings.path.display()
        ));
    }

    #[cfg(feature = "backend-tract")]
    {
        log::info!("loading model from {}", settings.path.display());
        let shape = Preprocessor::from_settings(settings).input_shape();
        let backend = crate::classify::backends::TractClassifier::new(&settings.path, shape)
            .map_err(|e| anyhow!("failed to load model: {:#}", e))?;
        Ok(Box::new(backend))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow!(
            "the tract classifier requires the backend-tract feature"
        ))
    }
}
