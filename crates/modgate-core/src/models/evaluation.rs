use serde::{Deserialize, Serialize};

/// Result of the toxicity evaluator for one text payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToxicityEvaluation {
    /// Confidence in [0, 1] that the text is toxic
    pub toxicity_score: f32,
}

/// Combined findings of the two image detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEvaluation {
    pub moderation_labels_found: bool,
    pub text_detected: bool,
}

impl ImageEvaluation {
    pub fn has_findings(&self) -> bool {
        self.moderation_labels_found || self.text_detected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationResult {
    Text(ToxicityEvaluation),
    Image(ImageEvaluation),
}

impl From<ToxicityEvaluation> for EvaluationResult {
    fn from(value: ToxicityEvaluation) -> Self {
        EvaluationResult::Text(value)
    }
}

impl From<ImageEvaluation> for EvaluationResult {
    fn from(value: ImageEvaluation) -> Self {
        EvaluationResult::Image(value)
    }
}
