//! AWS Comprehend toxicity evaluator
//!
//! Sends the whole payload as a single text segment to `DetectToxicContent`
//! and reports the toxicity of that segment.

use async_trait::async_trait;
use aws_sdk_comprehend::error::DisplayErrorContext;
use aws_sdk_comprehend::types::{LanguageCode, TextSegment};
use aws_sdk_comprehend::Client as ComprehendClient;
use modgate_core::models::ToxicityEvaluation;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::error::EvaluatorError;
use crate::traits::ToxicityEvaluator;

const EVALUATOR_NAME: &str = "aws_comprehend";

pub struct ComprehendToxicityEvaluator {
    client: ComprehendClient,
}

impl Debug for ComprehendToxicityEvaluator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ComprehendToxicityEvaluator").finish()
    }
}

impl ComprehendToxicityEvaluator {
    pub fn new(client: ComprehendClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(ComprehendClient::new(config))
    }
}

#[async_trait]
impl ToxicityEvaluator for ComprehendToxicityEvaluator {
    fn name(&self) -> &'static str {
        EVALUATOR_NAME
    }

    async fn evaluate_toxicity(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<ToxicityEvaluation, EvaluatorError> {
        if text.is_empty() {
            return Err(EvaluatorError::InvalidInput(
                "text payload is empty".to_string(),
            ));
        }

        let segment = TextSegment::builder()
            .text(text)
            .build()
            .map_err(|e| EvaluatorError::InvalidInput(e.to_string()))?;

        let response = self
            .client
            .detect_toxic_content()
            .text_segments(segment)
            .language_code(LanguageCode::from(language_code))
            .send()
            .await
            .map_err(|e| EvaluatorError::service(EVALUATOR_NAME, DisplayErrorContext(e).to_string()))?;

        let toxicity_score = response
            .result_list()
            .first()
            .and_then(|labels| labels.toxicity())
            .ok_or_else(|| {
                EvaluatorError::invalid_response(EVALUATOR_NAME, "no toxicity score in result list")
            })?;

        tracing::debug!(
            toxicity_score = toxicity_score,
            text_length = text.len(),
            "Toxicity evaluated"
        );

        Ok(ToxicityEvaluation { toxicity_score })
    }
}
