use crate::classify::Decision;
use crate::roi::Roi;

const ROI_CAPTION: &str = "Hand area";
const PREDICTION_ORIGIN: (i32, i32) = (10, 50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectAnnotation {
    pub roi: Roi,
    pub color: Color,
    pub thickness: i32,
}

/// Text anchored at its bottom-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct TextAnnotation {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub scale: f64,
    pub color: Color,
    pub thickness: i32,
}

/// Everything drawn on top of one frame. Rebuilt every iteration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub rects: Vec<RectAnnotation>,
    pub texts: Vec<TextAnnotation>,
    decision: Option<Decision>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outline the ROI and caption it. Visual aid only.
    pub fn mark_roi(&mut self, roi: &Roi) {
        self.rects.push(RectAnnotation {
            roi: *roi,
            color: Color::GREEN,
            thickness: 2,
        });
        self.texts.push(TextAnnotation {
            text: ROI_CAPTION.to_string(),
            x: roi.x1 as i32,
            y: roi.y1 as i32 - 10,
            scale: 0.6,
            color: Color::GREEN,
            thickness: 2,
        });
    }

    /// Show the decision: green label and percentage, or red "Uncertain".
    pub fn show_decision(&mut self, decision: &Decision) {
        let color = if decision.is_confident() {
            Color::GREEN
        } else {
            Color::RED
        };
        self.texts.push(TextAnnotation {
            text: format!("Prediction: {}", decision.text()),
            x: PREDICTION_ORIGIN.0,
            y: PREDICTION_ORIGIN.1,
            scale: 1.0,
            color,
            thickness: 2,
        });
        self.decision = Some(decision.clone());
    }

    pub fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }
}
