//! Scripted evaluators for tests
//!
//! Each mock returns a fixed answer (or error), optionally after a delay, and
//! counts its calls.

use async_trait::async_trait;
use modgate_core::models::ToxicityEvaluation;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::EvaluatorError;
use crate::traits::{
    ModerationLabel, ModerationLabelDetector, TextDetection, TextDetector, ToxicityEvaluator,
};

const MOCK_NAME: &str = "mock";

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

pub struct MockToxicityEvaluator {
    outcome: Result<f32, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockToxicityEvaluator {
    pub fn scoring(score: f32) -> Self {
        Self {
            outcome: Ok(score),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToxicityEvaluator for MockToxicityEvaluator {
    fn name(&self) -> &'static str {
        MOCK_NAME
    }

    async fn evaluate_toxicity(
        &self,
        _text: &str,
        _language_code: &str,
    ) -> Result<ToxicityEvaluation, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        match &self.outcome {
            Ok(score) => Ok(ToxicityEvaluation {
                toxicity_score: *score,
            }),
            Err(message) => Err(EvaluatorError::service(MOCK_NAME, message.clone())),
        }
    }
}

pub struct MockLabelDetector {
    outcome: Result<Vec<ModerationLabel>, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockLabelDetector {
    pub fn empty() -> Self {
        Self::with_labels(&[])
    }

    pub fn with_labels(names: &[&str]) -> Self {
        let labels = names
            .iter()
            .map(|name| ModerationLabel {
                name: name.to_string(),
                parent_name: None,
                confidence: 90.0,
            })
            .collect();
        Self {
            outcome: Ok(labels),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModerationLabelDetector for MockLabelDetector {
    async fn detect_moderation_labels(
        &self,
        _object_key: &str,
    ) -> Result<Vec<ModerationLabel>, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.outcome
            .clone()
            .map_err(|message| EvaluatorError::service(MOCK_NAME, message))
    }
}

pub struct MockTextDetector {
    outcome: Result<Vec<TextDetection>, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockTextDetector {
    pub fn empty() -> Self {
        Self::with_text(&[])
    }

    pub fn with_text(words: &[&str]) -> Self {
        let detections = words
            .iter()
            .map(|word| TextDetection {
                detected_text: word.to_string(),
                confidence: 95.0,
            })
            .collect();
        Self {
            outcome: Ok(detections),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextDetector for MockTextDetector {
    async fn detect_text(&self, _object_key: &str) -> Result<Vec<TextDetection>, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.outcome
            .clone()
            .map_err(|message| EvaluatorError::service(MOCK_NAME, message))
    }
}
