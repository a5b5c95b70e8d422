//! AWS Rekognition image detectors
//!
//! Moderation-label detection and embedded-text detection against objects in
//! the upload bucket, both filtered by the same minimum confidence.

use async_trait::async_trait;
use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::types::{
    DetectTextFilters, DetectionFilter, Image, S3Object, TextTypes,
};
use aws_sdk_rekognition::Client as RekognitionClient;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::error::EvaluatorError;
use crate::traits::{ModerationLabel, ModerationLabelDetector, TextDetection, TextDetector};

const EVALUATOR_NAME: &str = "aws_rekognition";

/// Minimum confidence (percent) used when none is configured.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 50.0;

#[derive(Clone)]
pub struct RekognitionImageDetector {
    client: RekognitionClient,
    bucket: String,
    min_confidence: f32,
}

impl Debug for RekognitionImageDetector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RekognitionImageDetector")
            .field("bucket", &self.bucket)
            .field("min_confidence", &self.min_confidence)
            .finish()
    }
}

impl RekognitionImageDetector {
    pub fn new(client: RekognitionClient, bucket: impl Into<String>, min_confidence: f32) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            min_confidence,
        }
    }

    pub fn from_config(
        config: &aws_config::SdkConfig,
        bucket: impl Into<String>,
        min_confidence: f32,
    ) -> Self {
        Self::new(RekognitionClient::new(config), bucket, min_confidence)
    }

    fn image(&self, object_key: &str) -> Image {
        let s3_object = S3Object::builder()
            .bucket(&self.bucket)
            .name(object_key)
            .build();
        Image::builder().s3_object(s3_object).build()
    }
}

#[async_trait]
impl ModerationLabelDetector for RekognitionImageDetector {
    async fn detect_moderation_labels(
        &self,
        object_key: &str,
    ) -> Result<Vec<ModerationLabel>, EvaluatorError> {
        let response = self
            .client
            .detect_moderation_labels()
            .image(self.image(object_key))
            .min_confidence(self.min_confidence)
            .send()
            .await
            .map_err(|e| EvaluatorError::service(EVALUATOR_NAME, DisplayErrorContext(e).to_string()))?;

        let labels = response
            .moderation_labels()
            .iter()
            .map(|label| ModerationLabel {
                name: label.name().unwrap_or("Unknown").to_string(),
                parent_name: label
                    .parent_name()
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
                confidence: label.confidence().unwrap_or(0.0),
            })
            .collect();

        Ok(labels)
    }
}

#[async_trait]
impl TextDetector for RekognitionImageDetector {
    async fn detect_text(&self, object_key: &str) -> Result<Vec<TextDetection>, EvaluatorError> {
        let filters = DetectTextFilters::builder()
            .word_filter(
                DetectionFilter::builder()
                    .min_confidence(self.min_confidence)
                    .build(),
            )
            .build();

        let response = self
            .client
            .detect_text()
            .image(self.image(object_key))
            .filters(filters)
            .send()
            .await
            .map_err(|e| EvaluatorError::service(EVALUATOR_NAME, DisplayErrorContext(e).to_string()))?;

        // Lines repeat their words; count each word once.
        let detections = response
            .text_detections()
            .iter()
            .filter(|d| d.r#type() == Some(&TextTypes::Word))
            .map(|d| TextDetection {
                detected_text: d.detected_text().unwrap_or_default().to_string(),
                confidence: d.confidence().unwrap_or(0.0),
            })
            .collect();

        Ok(detections)
    }
}
