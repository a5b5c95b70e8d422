use serde::{Deserialize, Serialize};

use crate::classifier::ContentKind;

/// Start input of the text workflow: `{"inputText": .., "languageCode": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRequest {
    #[serde(rename = "inputText")]
    pub text: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
}

/// Start input of the image workflow: `{"objectKey": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub object_key: String,
}

/// Input handed to exactly one workflow, chosen by content kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModerationRequest {
    Text(TextRequest),
    Image(ImageRequest),
}

impl ModerationRequest {
    pub fn text(text: impl Into<String>, language_code: impl Into<String>) -> Self {
        ModerationRequest::Text(TextRequest {
            text: text.into(),
            language_code: language_code.into(),
        })
    }

    pub fn image(object_key: impl Into<String>) -> Self {
        ModerationRequest::Image(ImageRequest {
            object_key: object_key.into(),
        })
    }

    pub fn content_kind(&self) -> ContentKind {
        match self {
            ModerationRequest::Text(_) => ContentKind::Text,
            ModerationRequest::Image(_) => ContentKind::Image,
        }
    }
}

impl From<TextRequest> for ModerationRequest {
    fn from(value: TextRequest) -> Self {
        ModerationRequest::Text(value)
    }
}

impl From<ImageRequest> for ModerationRequest {
    fn from(value: ImageRequest) -> Self {
        ModerationRequest::Image(value)
    }
}
