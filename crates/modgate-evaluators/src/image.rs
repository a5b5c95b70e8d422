//! Combined image evaluation.

use std::sync::Arc;

use modgate_core::models::ImageEvaluation;

use crate::error::EvaluatorError;
use crate::traits::{ModerationLabelDetector, TextDetector};

/// Runs both image detectors against the same object concurrently.
#[derive(Clone)]
pub struct ImageContentEvaluator {
    label_detector: Arc<dyn ModerationLabelDetector>,
    text_detector: Arc<dyn TextDetector>,
}

impl ImageContentEvaluator {
    pub fn new(
        label_detector: Arc<dyn ModerationLabelDetector>,
        text_detector: Arc<dyn TextDetector>,
    ) -> Self {
        Self {
            label_detector,
            text_detector,
        }
    }

    /// Returns once both detectors finished. The first failure aborts the other call.
    pub async fn evaluate(&self, object_key: &str) -> Result<ImageEvaluation, EvaluatorError> {
        let (labels, detections) = tokio::try_join!(
            self.label_detector.detect_moderation_labels(object_key),
            self.text_detector.detect_text(object_key),
        )?;

        tracing::debug!(
            object_key = %object_key,
            labels = ?labels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
            text_detections = detections.len(),
            "Image detectors completed"
        );

        Ok(ImageEvaluation {
            moderation_labels_found: !labels.is_empty(),
            text_detected: !detections.is_empty(),
        })
    }
}
