//! Modgate Evaluators
//!
//! Content-analysis capabilities the workflows call: text toxicity scoring,
//! image moderation-label detection and embedded-text detection. Each is a
//! trait with an AWS implementation behind a feature flag.

pub mod error;
pub mod image;
pub mod traits;

#[cfg(feature = "evaluator-aws-comprehend")]
pub mod aws_comprehend;
#[cfg(feature = "evaluator-aws-rekognition")]
pub mod aws_rekognition;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::EvaluatorError;
pub use image::ImageContentEvaluator;
pub use traits::{
    ModerationLabel, ModerationLabelDetector, TextDetection, TextDetector, ToxicityEvaluator,
};

#[cfg(feature = "evaluator-aws-comprehend")]
pub use aws_comprehend::ComprehendToxicityEvaluator;
#[cfg(feature = "evaluator-aws-rekognition")]
pub use aws_rekognition::RekognitionImageDetector;

/// Load shared AWS SDK configuration, optionally pinned to a region.
#[cfg(any(feature = "evaluator-aws-comprehend", feature = "evaluator-aws-rekognition"))]
pub async fn load_aws_config(region: Option<String>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    loader.load().await
}
