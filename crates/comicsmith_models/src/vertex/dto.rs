//! Wire types for the Vertex AI `generateContent` endpoint.

use serde::{Deserialize, Serialize};

/// Harm categories the safety threshold is applied to.
pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// Finish reasons that mean the provider refused on policy grounds.
pub const POLICY_FINISH_REASONS: [&str; 7] = [
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "RECITATION",
];

/// Request body for `generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns (always a single user turn here)
    pub contents: Vec<Content>,
    /// Output configuration
    pub generation_config: GenerationConfig,
    /// Per-category safety thresholds
    pub safety_settings: Vec<SafetySetting>,
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Author role, `user` for requests
    #[serde(default)]
    pub role: Option<String>,
    /// Ordered parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Text or inline binary data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline binary content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    /// Text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Inline data part with base64 payload.
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// Base64-encoded binary content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Requested output modalities
    pub response_modalities: Vec<String>,
    /// Image-specific options
    pub image_config: ImageConfig,
}

/// Image-specific output options.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Aspect ratio such as `16:9`
    pub aspect_ratio: String,
    /// Person generation policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_generation: Option<String>,
}

/// Safety threshold for one harm category.
#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    /// Harm category
    pub category: String,
    /// Blocking threshold
    pub threshold: String,
}

/// Response body from `generateContent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate outputs
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback on the prompt itself
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One candidate output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Human-readable detail for the finish reason
    #[serde(default)]
    pub finish_message: Option<String>,
}

/// Prompt-level feedback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the prompt was blocked before generation
    #[serde(default)]
    pub block_reason: Option<String>,
    /// Human-readable detail for the block
    #[serde(default)]
    pub block_reason_message: Option<String>,
}
