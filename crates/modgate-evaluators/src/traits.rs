use async_trait::async_trait;
use modgate_core::models::ToxicityEvaluation;
use serde::{Deserialize, Serialize};

use crate::error::EvaluatorError;

/// Scores a text payload for toxicity.
#[async_trait]
pub trait ToxicityEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate_toxicity(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<ToxicityEvaluation, EvaluatorError>;
}

/// An unsafe-content label found in an image, at or above the confidence floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationLabel {
    pub name: String,
    #[serde(default)]
    pub parent_name: Option<String>,
    /// Percent
    pub confidence: f32,
}

/// A word or line of text found in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDetection {
    pub detected_text: String,
    /// Percent
    pub confidence: f32,
}

/// Detects unsafe-content labels in an uploaded image.
#[async_trait]
pub trait ModerationLabelDetector: Send + Sync {
    async fn detect_moderation_labels(
        &self,
        object_key: &str,
    ) -> Result<Vec<ModerationLabel>, EvaluatorError>;
}

/// Detects text embedded in an uploaded image.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_text(&self, object_key: &str) -> Result<Vec<TextDetection>, EvaluatorError>;
}
