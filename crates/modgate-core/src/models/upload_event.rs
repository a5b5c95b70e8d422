use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::ModerationError;

const OBJECT_CREATED_PREFIX: &str = "ObjectCreated:";
const S3_EVENT_SOURCE: &str = "aws:s3";

/// Storage notification as delivered on the ingestion queue.
///
/// A body without `Records` (the storage layer's test event) parses to an
/// empty notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3EventNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

impl S3EventNotification {
    pub fn parse(body: &str) -> Result<Self, ModerationError> {
        serde_json::from_str(body)
            .map_err(|e| ModerationError::malformed(format!("notification is not valid JSON: {}", e)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: Option<S3BucketEntity>,
    #[serde(default)]
    pub object: Option<S3ObjectEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3BucketEntity {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3ObjectEntity {
    /// URL-encoded object key
    #[serde(default)]
    pub key: Option<String>,
}

impl S3EventRecord {
    pub fn event_name(&self) -> &str {
        self.event_name.as_deref().unwrap_or_default()
    }

    /// Only object-creation events from S3 are moderated.
    pub fn is_object_created(&self) -> bool {
        self.event_source.as_deref() == Some(S3_EVENT_SOURCE)
            && self.event_name().starts_with(OBJECT_CREATED_PREFIX)
    }

    pub fn raw_object_key(&self) -> Option<&str> {
        self.s3
            .as_ref()
            .and_then(|s3| s3.object.as_ref())
            .and_then(|object| object.key.as_deref())
    }

    /// Convert into an [`UploadEvent`] with a decoded object key.
    pub fn to_upload_event(&self) -> Result<UploadEvent, ModerationError> {
        let raw_key = self
            .raw_object_key()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ModerationError::malformed("record is missing s3.object.key"))?;

        let bucket_name = self
            .s3
            .as_ref()
            .and_then(|s3| s3.bucket.as_ref())
            .and_then(|bucket| bucket.name.clone())
            .filter(|name| !name.is_empty());

        Ok(UploadEvent {
            bucket_name,
            object_key: decode_object_key(raw_key)?,
            event_name: self.event_name().to_string(),
        })
    }
}

/// A single object-created event with its key decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEvent {
    /// Informational only; payloads are read from the configured upload bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    pub object_key: String,
    pub event_name: String,
}

/// Form-decode an object key: `+` is a space, then percent-escapes are resolved.
pub fn decode_object_key(raw: &str) -> Result<String, ModerationError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|_| {
            ModerationError::malformed(format!("object key {} is not valid UTF-8 once decoded", raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event_name: &str, key: Option<&str>) -> String {
        let object = match key {
            Some(key) => format!(r#"{{"key": "{}", "size": 12}}"#, key),
            None => r#"{"size": 12}"#.to_string(),
        };
        format!(
            r#"{{"Records": [{{"eventSource": "aws:s3", "eventName": "{}", "s3": {{"bucket": {{"name": "uploads"}}, "object": {}}}}}]}}"#,
            event_name, object
        )
    }

    #[test]
    fn parses_object_created_record() {
        let notification =
            S3EventNotification::parse(&record("ObjectCreated:Put", Some("abc-notes.txt"))).unwrap();
        assert_eq!(notification.records.len(), 1);
        let rec = &notification.records[0];
        assert!(rec.is_object_created());
        let event = rec.to_upload_event().unwrap();
        assert_eq!(event.bucket_name.as_deref(), Some("uploads"));
        assert_eq!(event.object_key, "abc-notes.txt");
        assert_eq!(event.event_name, "ObjectCreated:Put");
    }

    #[test]
    fn object_removed_is_not_created() {
        let notification =
            S3EventNotification::parse(&record("ObjectRemoved:Delete", Some("a.txt"))).unwrap();
        assert!(!notification.records[0].is_object_created());
    }

    #[test]
    fn foreign_event_source_is_not_created() {
        let body = r#"{"Records": [{"eventSource": "aws:sns", "eventName": "ObjectCreated:Put"}]}"#;
        let notification = S3EventNotification::parse(body).unwrap();
        assert!(!notification.records[0].is_object_created());
    }

    #[test]
    fn missing_key_is_malformed() {
        let notification =
            S3EventNotification::parse(&record("ObjectCreated:Put", None)).unwrap();
        let err = notification.records[0].to_upload_event().unwrap_err();
        assert!(matches!(err, ModerationError::MalformedEvent(_)));
    }

    #[test]
    fn missing_bucket_name_is_not_malformed() {
        let body = r#"{"Records": [{"eventSource": "aws:s3", "eventName": "ObjectCreated:Put", "s3": {"object": {"key": "abc-photo.png"}}}]}"#;
        let notification = S3EventNotification::parse(body).unwrap();
        let event = notification.records[0].to_upload_event().unwrap();
        assert_eq!(event.bucket_name, None);
        assert_eq!(event.object_key, "abc-photo.png");
    }

    #[test]
    fn test_event_without_records_is_empty() {
        let body = r#"{"Service": "Amazon S3", "Event": "s3:TestEvent", "Bucket": "uploads"}"#;
        assert!(S3EventNotification::parse(body).unwrap().records.is_empty());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = S3EventNotification::parse("not json").unwrap_err();
        assert!(matches!(err, ModerationError::MalformedEvent(_)));
    }

    #[test]
    fn keys_are_form_decoded() {
        assert_eq!(
            decode_object_key("uploads/my+holiday%20photo%2B1.png").unwrap(),
            "uploads/my holiday photo+1.png"
        );
        assert_eq!(decode_object_key("caf%C3%A9.txt").unwrap(), "café.txt");
        assert!(decode_object_key("bad%FF.txt").is_err());
    }
}
