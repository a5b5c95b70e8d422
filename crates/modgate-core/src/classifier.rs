//! Content classification by object name suffix.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Suffixes routed to the text workflow when nothing else is configured.
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[".txt", ".md"];

/// Suffixes routed to the image workflow when nothing else is configured.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// Kind of content an uploaded object holds, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Unsupported,
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContentKind::Text => write!(f, "text"),
            ContentKind::Image => write!(f, "image"),
            ContentKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Maps object keys to a [`ContentKind`] using two disjoint suffix sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentClassifier {
    text_extensions: Vec<String>,
    image_extensions: Vec<String>,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self {
            text_extensions: DEFAULT_TEXT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ContentClassifier {
    /// Build a classifier from configured suffixes.
    ///
    /// Suffixes are lowercased and given a leading dot when missing. The two sets
    /// must not share a suffix, otherwise an object could route to both workflows.
    pub fn new<T, I>(text_extensions: T, image_extensions: I) -> Result<Self, anyhow::Error>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let text_extensions = normalize_extensions(text_extensions);
        let image_extensions = normalize_extensions(image_extensions);

        if let Some(shared) = text_extensions
            .iter()
            .find(|ext| image_extensions.contains(ext))
        {
            return Err(anyhow::anyhow!(
                "Extension {} is configured for both text and image content",
                shared
            ));
        }

        Ok(Self {
            text_extensions,
            image_extensions,
        })
    }

    pub fn text_extensions(&self) -> &[String] {
        &self.text_extensions
    }

    pub fn image_extensions(&self) -> &[String] {
        &self.image_extensions
    }

    /// Classify an object key. Total: anything unrecognised is `Unsupported`.
    pub fn classify(&self, object_key: &str) -> ContentKind {
        let Some(extension) = extension_of(object_key) else {
            return ContentKind::Unsupported;
        };

        if self.text_extensions.iter().any(|ext| *ext == extension) {
            ContentKind::Text
        } else if self.image_extensions.iter().any(|ext| *ext == extension) {
            ContentKind::Image
        } else {
            ContentKind::Unsupported
        }
    }
}

/// Lowercased suffix of the final path component, including the dot.
///
/// A leading dot is part of the name, not a suffix (`.env` has none).
fn extension_of(object_key: &str) -> Option<String> {
    let file_name = object_key.rsplit('/').next().unwrap_or(object_key);
    let stem_len = file_name.len() - file_name.trim_start_matches('.').len();
    let rest = &file_name[stem_len..];
    let dot = rest.rfind('.')?;
    Some(rest[dot..].to_lowercase())
}

fn normalize_extensions<I>(extensions: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized: Vec<String> = extensions
        .into_iter()
        .map(|ext| ext.as_ref().trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext != ".")
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}
