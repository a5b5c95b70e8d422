//! Configuration module
//!
//! Settings are read once at startup from the environment (with `.env`
//! support) into typed sub-structs and validated before anything is wired.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::classifier::{ContentClassifier, DEFAULT_IMAGE_EXTENSIONS, DEFAULT_TEXT_EXTENSIONS};
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const VISIBILITY_TIMEOUT_SECS: u64 = 30;
const WAIT_TIME_SECS: u64 = 20;
const MAX_REDELIVERIES: u32 = 1;
const WORKER_CONSUMERS: usize = 1;
const WORKFLOW_TIMEOUT_SECS: u64 = 300;
const EXECUTION_RETENTION: usize = 10_000;
const TOXICITY_THRESHOLD: f32 = 0.9;
const HUMAN_REVIEW_LOWER_BOUND: f32 = 0.7;
const IMAGE_MIN_CONFIDENCE: f32 = 50.0;
const PRESIGNED_URL_EXPIRY_SECS: u64 = 3600;

pub const DEFAULT_TEXT_WORKFLOW_ID: &str = "ModerationPlatform-textModerationWorkflow";
pub const DEFAULT_IMAGE_WORKFLOW_ID: &str = "ModerationPlatform-imageModerationWorkflow";
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Server and process-wide settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub log_format: String,
    pub cors_origins: Vec<String>,
}

/// Upload bucket settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, LocalStack)
    pub endpoint: Option<String>,
    pub local_path: Option<String>,
    pub presigned_url_expiry_secs: u64,
}

/// Notification queue implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueBackend {
    Sqs,
    Memory,
}

impl FromStr for QueueBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqs" => Ok(QueueBackend::Sqs),
            "memory" => Ok(QueueBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid queue backend: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    pub queue_url: Option<String>,
    pub dead_letter_queue_url: Option<String>,
    pub visibility_timeout_secs: u64,
    pub wait_time_secs: u64,
    pub max_redeliveries: u32,
    pub consumers: usize,
}

impl QueueConfig {
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }
}

/// Decision thresholds and content routing
#[derive(Clone, Debug)]
pub struct ModerationConfig {
    pub toxicity_threshold: f32,
    pub human_review_enabled: bool,
    pub human_review_lower_bound: f32,
    /// Percent, passed to both image detectors
    pub image_min_confidence: f32,
    pub text_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub default_language_code: String,
}

impl ModerationConfig {
    pub fn classifier(&self) -> Result<ContentClassifier, anyhow::Error> {
        ContentClassifier::new(&self.text_extensions, &self.image_extensions)
    }
}

#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    pub text_workflow_id: String,
    pub image_workflow_id: String,
    pub timeout_secs: u64,
    /// Finished executions kept for inspection
    pub execution_retention: usize,
}

impl WorkflowConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub moderation: ModerationConfig,
    pub workflow: WorkflowConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let base = BaseConfig {
            server_port: get("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            log_format: get("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            cors_origins: get("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let storage = StorageConfig {
            backend: get("STORAGE_BACKEND")
                .map(|s| s.parse::<StorageBackend>())
                .transpose()?
                .unwrap_or(StorageBackend::S3),
            bucket: get("UPLOAD_BUCKET").or_else(|| get("S3_BUCKET")),
            region: get("S3_REGION").or_else(|| get("AWS_REGION")),
            endpoint: get("S3_ENDPOINT"),
            local_path: get("LOCAL_STORAGE_PATH"),
            presigned_url_expiry_secs: get("PRESIGNED_URL_EXPIRY_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PRESIGNED_URL_EXPIRY_SECS),
        };

        let queue = QueueConfig {
            backend: get("QUEUE_BACKEND")
                .map(|s| s.parse::<QueueBackend>())
                .transpose()?
                .unwrap_or(QueueBackend::Sqs),
            queue_url: get("UPLOAD_QUEUE_URL"),
            dead_letter_queue_url: get("UPLOAD_DLQ_URL"),
            visibility_timeout_secs: get("QUEUE_VISIBILITY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(VISIBILITY_TIMEOUT_SECS),
            wait_time_secs: get("QUEUE_WAIT_TIME_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(WAIT_TIME_SECS),
            max_redeliveries: get("QUEUE_MAX_REDELIVERIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_REDELIVERIES),
            consumers: get("WORKER_CONSUMERS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(WORKER_CONSUMERS),
        };

        let moderation = ModerationConfig {
            toxicity_threshold: get("TOXICITY_THRESHOLD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(TOXICITY_THRESHOLD),
            human_review_enabled: get("HUMAN_REVIEW_ENABLED")
                .map(|s| s.to_lowercase() == "true" || s == "1")
                .unwrap_or(false),
            human_review_lower_bound: get("HUMAN_REVIEW_LOWER_BOUND")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HUMAN_REVIEW_LOWER_BOUND),
            image_min_confidence: get("IMAGE_MIN_CONFIDENCE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(IMAGE_MIN_CONFIDENCE),
            text_extensions: get("TEXT_EXTENSIONS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|| to_owned_list(DEFAULT_TEXT_EXTENSIONS)),
            image_extensions: get("IMAGE_EXTENSIONS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|| to_owned_list(DEFAULT_IMAGE_EXTENSIONS)),
            default_language_code: get("DEFAULT_LANGUAGE_CODE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
        };

        let workflow = WorkflowConfig {
            text_workflow_id: get("TEXT_WORKFLOW_ID")
                .or_else(|| get("TEXT_WORKFLOW_ARN"))
                .unwrap_or_else(|| DEFAULT_TEXT_WORKFLOW_ID.to_string()),
            image_workflow_id: get("IMAGE_WORKFLOW_ID")
                .or_else(|| get("IMAGE_WORKFLOW_ARN"))
                .unwrap_or_else(|| DEFAULT_IMAGE_WORKFLOW_ID.to_string()),
            timeout_secs: get("WORKFLOW_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(WORKFLOW_TIMEOUT_SECS),
            execution_retention: get("EXECUTION_RETENTION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(EXECUTION_RETENTION),
        };

        Ok(Config {
            base,
            storage,
            queue,
            moderation,
            workflow,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let moderation = &self.moderation;
        if !(0.0..=1.0).contains(&moderation.toxicity_threshold) {
            return Err(anyhow::anyhow!(
                "TOXICITY_THRESHOLD must be between 0 and 1"
            ));
        }
        if moderation.human_review_enabled
            && !(0.0..moderation.toxicity_threshold).contains(&moderation.human_review_lower_bound)
        {
            return Err(anyhow::anyhow!(
                "HUMAN_REVIEW_LOWER_BOUND must be at least 0 and below TOXICITY_THRESHOLD"
            ));
        }
        if !(0.0..=100.0).contains(&moderation.image_min_confidence) {
            return Err(anyhow::anyhow!(
                "IMAGE_MIN_CONFIDENCE must be a percentage between 0 and 100"
            ));
        }
        if moderation.default_language_code.trim().is_empty() {
            return Err(anyhow::anyhow!("DEFAULT_LANGUAGE_CODE cannot be empty"));
        }
        moderation.classifier()?;

        // Image analysis reads uploads from the bucket whatever the storage backend.
        if self.storage.bucket.is_none() {
            return Err(anyhow::anyhow!(
                "UPLOAD_BUCKET (or S3_BUCKET) must be set: image analysis reads uploads from the bucket"
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.region.is_none() && self.storage.endpoint.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION, AWS_REGION or S3_ENDPOINT must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        if self.queue.backend == QueueBackend::Sqs
            && (self.queue.queue_url.is_none() || self.queue.dead_letter_queue_url.is_none())
        {
            return Err(anyhow::anyhow!(
                "QUEUE_BACKEND=sqs requires UPLOAD_QUEUE_URL and UPLOAD_DLQ_URL to be set"
            ));
        }
        if self.queue.visibility_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "QUEUE_VISIBILITY_TIMEOUT_SECS must be greater than 0"
            ));
        }
        if self.queue.consumers == 0 {
            return Err(anyhow::anyhow!("WORKER_CONSUMERS must be at least 1"));
        }

        if self.workflow.text_workflow_id.trim().is_empty()
            || self.workflow.image_workflow_id.trim().is_empty()
        {
            return Err(anyhow::anyhow!("Workflow identifiers cannot be empty"));
        }
        if self.workflow.timeout_secs == 0 {
            return Err(anyhow::anyhow!("WORKFLOW_TIMEOUT_SECS must be greater than 0"));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn local_memory() -> Vec<(&'static str, &'static str)> {
        vec![
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/modgate"),
            ("QUEUE_BACKEND", "memory"),
            ("UPLOAD_BUCKET", "modgate-uploads"),
        ]
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = config_from(&local_memory()).unwrap();
        assert_eq!(config.base.server_port, 4000);
        assert_eq!(config.queue.visibility_timeout_secs, 30);
        assert_eq!(config.queue.max_redeliveries, 1);
        assert_eq!(config.workflow.timeout_secs, 300);
        assert_eq!(
            config.workflow.text_workflow_id,
            "ModerationPlatform-textModerationWorkflow"
        );
        assert!((config.moderation.toxicity_threshold - 0.9).abs() < f32::EPSILON);
        assert!((config.moderation.image_min_confidence - 50.0).abs() < f32::EPSILON);
        assert!(!config.moderation.human_review_enabled);
        assert_eq!(config.moderation.default_language_code, "en");
        assert_eq!(config.storage.presigned_url_expiry_secs, 3600);
        config.validate().unwrap();
    }

    #[test]
    fn workflow_arn_aliases_are_honoured() {
        let mut vars = local_memory();
        vars.push(("TEXT_WORKFLOW_ARN", "arn:aws:states:text"));
        vars.push(("IMAGE_WORKFLOW_ID", "image-flow"));
        vars.push(("IMAGE_WORKFLOW_ARN", "ignored"));
        let config = config_from(&vars).unwrap();
        assert_eq!(config.workflow.text_workflow_id, "arn:aws:states:text");
        assert_eq!(config.workflow.image_workflow_id, "image-flow");
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let config = config_from(&[("QUEUE_BACKEND", "memory"), ("AWS_REGION", "us-east-1")])
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("UPLOAD_BUCKET"));
    }

    #[test]
    fn local_backend_still_requires_bucket() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/modgate"),
            ("QUEUE_BACKEND", "memory"),
        ])
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("UPLOAD_BUCKET"));
    }

    #[test]
    fn sqs_backend_requires_queue_urls() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/modgate"),
            ("UPLOAD_BUCKET", "modgate-uploads"),
            ("UPLOAD_QUEUE_URL", "https://sqs.local/uploads"),
        ])
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("UPLOAD_DLQ_URL"));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let mut vars = local_memory();
        vars.push(("TOXICITY_THRESHOLD", "1.5"));
        assert!(config_from(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn human_review_band_must_sit_below_threshold() {
        let mut vars = local_memory();
        vars.push(("HUMAN_REVIEW_ENABLED", "true"));
        vars.push(("HUMAN_REVIEW_LOWER_BOUND", "0.95"));
        assert!(config_from(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn overlapping_extensions_are_rejected() {
        let mut vars = local_memory();
        vars.push(("TEXT_EXTENSIONS", ".txt,.png"));
        let err = config_from(&vars).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains(".png"));
    }

    #[test]
    fn unknown_backends_fail_parsing() {
        assert!(config_from(&[("QUEUE_BACKEND", "kafka")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "gcs")]).is_err());
    }

    #[test]
    fn production_rejects_wildcard_cors() {
        let mut vars = local_memory();
        vars.push(("ENVIRONMENT", "production"));
        let config = config_from(&vars).unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }
}
