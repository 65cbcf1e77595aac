use anyhow::{anyhow, Result};

/// Top class for one ROI.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Thresholded prediction. Each frame is decided on its own.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Confident(Prediction),
    Uncertain(Prediction),
}

impl Decision {
    /// Pick the arg-max class and compare its probability against `threshold`.
    ///
    /// Fails when the vector is empty, has no finite entry, or its width does not
    /// match the label set.
    pub fn from_probabilities(
        probabilities: &[f32],
        labels: &[String],
        threshold: f32,
    ) -> Result<Self> {
        if probabilities.len() != labels.len() {
            return Err(anyhow!(
                "classifier returned {} probabilities for {} labels",
                probabilities.len(),
                labels.len()
            ));
        }
        let (index, confidence) = argmax(probabilities)
            .ok_or_else(|| anyhow!("classifier returned no finite probabilities"))?;
        let prediction = Prediction {
            index,
            label: labels[index].clone(),
            confidence,
        };
        if confidence > threshold {
            Ok(Decision::Confident(prediction))
        } else {
            Ok(Decision::Uncertain(prediction))
        }
    }

    pub fn is_confident(&self) -> bool {
        matches!(self, Decision::Confident(_))
    }

    pub fn prediction(&self) -> &Prediction {
        match self {
            Decision::Confident(p) | Decision::Uncertain(p) => p,
        }
    }

    /// Text shown to the user, e.g. `"C (91.0%)"` or `"Uncertain"`.
    pub fn text(&self) -> String {
        match self {
            Decision::Confident(p) => format!("{} ({:.1}%)", p.label, p.confidence * 100.0),
            Decision::Uncertain(_) => "Uncertain".to_string(),
        }
    }
}

/// Index and value of the largest finite entry. The first maximum wins ties.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None::<(usize, f32)>, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}
