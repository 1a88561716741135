//! Generation result types held by the response cache.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::knowledge::core::errors::KnowledgeError;

/// Output modality of a generation model.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Text generation.
    Text,
    /// Image generation.
    Image,
    /// Video generation.
    Video,
    /// Audio generation.
    Audio,
}

impl ModelKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Text, Self::Image, Self::Video, Self::Audio];

    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = KnowledgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| raw.eq_ignore_ascii_case(kind.as_str()))
            .ok_or_else(|| KnowledgeError::Validation(format!("invalid model kind: {raw}")))
    }
}

/// Generated text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOutput {
    /// Model output.
    pub generated_text: String,
}

/// Generated image, as a URL or encoded payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOutput {
    /// Image reference.
    pub image: String,
}

/// Generated video, as a URL or encoded payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoOutput {
    /// Video reference.
    pub video: String,
}

/// Generated audio, as a URL or encoded payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioOutput {
    /// Audio reference.
    pub audio: String,
}

/// Result of one generation call. Only the field for the model's kind is
/// normally set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Text output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextOutput>,
    /// Image output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageOutput>,
    /// Video output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoOutput>,
    /// Audio output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioOutput>,
}

impl GenerationResponse {
    /// A text-only response.
    #[must_use]
    pub fn text(generated_text: impl Into<String>) -> Self {
        Self {
            text: Some(TextOutput {
                generated_text: generated_text.into(),
            }),
            ..Self::default()
        }
    }

    /// An image-only response.
    #[must_use]
    pub fn image(image: impl Into<String>) -> Self {
        Self {
            image: Some(ImageOutput {
                image: image.into(),
            }),
            ..Self::default()
        }
    }
}

/// Composite cache key `(model, kind, prompt)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    /// Model name.
    pub model: String,
    /// Output modality.
    pub kind: ModelKind,
    /// Prompt text, verbatim.
    pub prompt: String,
}

impl CacheKey {
    /// Build a key.
    #[must_use]
    pub fn new(model: impl Into<String>, kind: ModelKind, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            kind,
            prompt: prompt.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.model, self.kind, self.prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_wire_shape() {
        let response = GenerationResponse::text("Bir manzara");
        let raw = serde_json::to_string(&response).unwrap();
        assert_eq!(raw, r#"{"text":{"generated_text":"Bir manzara"}}"#);

        let parsed: GenerationResponse =
            serde_json::from_str(r#"{"image":{"image":"data:image/png;base64,AA=="}}"#).unwrap();
        assert_eq!(parsed, GenerationResponse::image("data:image/png;base64,AA=="));
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("Video".parse::<ModelKind>().unwrap(), ModelKind::Video);
        assert!("hologram".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_keys_with_colons_stay_distinct() {
        let a = CacheKey::new("m:x", ModelKind::Text, "p");
        let b = CacheKey::new("m", ModelKind::Text, "x:p");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "m:x:text:p");
    }
}
