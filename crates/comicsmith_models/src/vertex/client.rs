//! Vertex AI image client.

use crate::SynthesisConfig;
use crate::vertex::dto::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, HARM_CATEGORIES,
    ImageConfig, POLICY_FINISH_REASONS, Part, SafetySetting,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use comicsmith_core::{DEFAULT_IMAGE_MIME, GeneratedImage};
use comicsmith_error::{ConfigError, RetryableError, SynthesisError, SynthesisErrorKind};
use comicsmith_interface::{ImageSynthesizer, SynthesisResult};
use reqwest::Client;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, instrument, warn};

const PROVIDER: &str = "vertex";

/// Client for Gemini image models served by Vertex AI.
///
/// Each `generate` or `edit` issues one `generateContent` call. Transient
/// transport failures are retried with exponential backoff; rejections and
/// empty results are returned immediately.
#[derive(Debug, Clone)]
pub struct VertexImageClient {
    client: Client,
    config: SynthesisConfig,
    url: String,
}

impl VertexImageClient {
    /// Creates a client for the configured project, location and model.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    #[instrument(skip(config), fields(model = %config.model(), location = %config.location()))]
    pub fn new(config: SynthesisConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(*config.timeout())
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;
        let url = config.generate_content_url();

        debug!(url = %url, "Created Vertex image client");

        Ok(Self {
            client,
            config,
            url,
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    fn request_body(&self, parts: Vec<Part>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: self.config.aspect_ratio().to_string(),
                    person_generation: self
                        .config
                        .person_generation()
                        .map(|p| p.api_value().to_string()),
                },
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: self.config.safety_filter().threshold().to_string(),
                })
                .collect(),
        }
    }

    async fn call_once(&self, body: &GenerateContentRequest) -> SynthesisResult {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.config.access_token())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = ?e, "HTTP request failed");
                SynthesisError::new(SynthesisErrorKind::TransportError {
                    status_code: e.status().map(|s| s.as_u16()),
                    message: format!("Request failed: {}", e),
                })
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                provider = PROVIDER,
                status = %status,
                error = %error_text,
                "API error"
            );
            return Err(SynthesisError::new(SynthesisErrorKind::TransportError {
                status_code: Some(status.as_u16()),
                message: error_text,
            }));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = ?e, "Failed to parse response");
            SynthesisError::new(SynthesisErrorKind::transport(format!(
                "Failed to parse JSON: {}",
                e
            )))
        })?;

        interpret_response(parsed)
    }

    /// Issue a call, retrying transient transport failures.
    ///
    /// The first failure picks the backoff schedule; the retry count is capped
    /// by the configured budget.
    async fn call_with_retry(&self, body: &GenerateContentRequest) -> SynthesisResult {
        let err = match self.call_once(body).await {
            Ok(image) => return Ok(image),
            Err(err) => err,
        };

        let budget = *self.config.max_retries();
        if !err.is_retryable() || budget == 0 {
            return Err(err);
        }

        let (backoff_ms, retries, max_delay_secs) = err.retry_strategy_params();
        let attempts = retries.min(budget);
        warn!(
            provider = PROVIDER,
            error = %err.kind,
            attempts,
            backoff_ms,
            "Transient synthesis failure, retrying"
        );

        // Delays run backoff_ms, 2 * backoff_ms, ... capped at max_delay_secs.
        let strategy = ExponentialBackoff::from_millis(2)
            .factor((backoff_ms / 2).max(1))
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(attempts);

        Retry::spawn(strategy, move || async move {
            self.call_once(body).await.map_err(|e| {
                if e.is_retryable() {
                    debug!(provider = PROVIDER, error = %e.kind, "Retryable failure");
                    RetryError::Transient {
                        err: e,
                        retry_after: None,
                    }
                } else {
                    RetryError::Permanent(e)
                }
            })
        })
        .await
    }
}

/// Turn a parsed response into an image or a typed failure.
///
/// A prompt block or a policy finish reason is `Rejected`; a response that
/// carries no image part is `NoResult`.
pub fn interpret_response(response: GenerateContentResponse) -> SynthesisResult {
    let blocked = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref().map(|reason| (reason, feedback)));
    if let Some((reason, feedback)) = blocked {
        let detail = match &feedback.block_reason_message {
            Some(message) => format!("{}: {}", reason, message),
            None => reason.clone(),
        };
        warn!(provider = PROVIDER, reason = %detail, "Prompt blocked");
        return Err(SynthesisError::new(SynthesisErrorKind::Rejected(detail)));
    }

    let mut finish_reasons = Vec::new();
    for candidate in response.candidates {
        if let Some(reason) = &candidate.finish_reason {
            finish_reasons.push((reason.clone(), candidate.finish_message.clone()));
        }
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            let Some(inline) = part.inline_data else {
                continue;
            };
            if !inline.mime_type.starts_with("image/") {
                continue;
            }
            let bytes = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
                SynthesisError::new(SynthesisErrorKind::transport(format!(
                    "Invalid base64 image data: {}",
                    e
                )))
            })?;
            if bytes.is_empty() {
                continue;
            }
            let mime = if inline.mime_type.trim().is_empty() {
                DEFAULT_IMAGE_MIME.to_string()
            } else {
                inline.mime_type
            };
            debug!(provider = PROVIDER, mime = %mime, size = bytes.len(), "Received image");
            return Ok(GeneratedImage::new(bytes, mime));
        }
    }

    if let Some((reason, message)) = finish_reasons
        .iter()
        .find(|(reason, _)| POLICY_FINISH_REASONS.contains(&reason.as_str()))
    {
        let detail = match message {
            Some(message) => format!("{}: {}", reason, message),
            None => reason.clone(),
        };
        warn!(provider = PROVIDER, reason = %detail, "Generation blocked");
        return Err(SynthesisError::new(SynthesisErrorKind::Rejected(detail)));
    }

    let detail = match finish_reasons.first() {
        Some((reason, _)) => format!("finish reason {}", reason),
        None => "response contained no candidates".to_string(),
    };
    Err(SynthesisError::new(SynthesisErrorKind::NoResult(detail)))
}

#[async_trait]
impl ImageSynthesizer for VertexImageClient {
    #[instrument(skip(self, prompt), fields(provider = PROVIDER, model = %self.config.model()))]
    async fn generate(&self, prompt: &str) -> SynthesisResult {
        let body = self.request_body(vec![Part::text(prompt)]);
        self.call_with_retry(&body).await
    }

    #[instrument(
        skip(self, prompt, base),
        fields(provider = PROVIDER, model = %self.config.model(), base_size = base.bytes().len())
    )]
    async fn edit(&self, prompt: &str, base: &GeneratedImage) -> SynthesisResult {
        let body = self.request_body(vec![
            Part::inline(base.mime().clone(), STANDARD.encode(base.bytes())),
            Part::text(prompt),
        ]);
        self.call_with_retry(&body).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        self.config.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::dto::{Candidate, InlineData, PromptFeedback};

    fn image_candidate(data: &str) -> Candidate {
        Candidate {
            content: Some(Content {
                role: Some("model".to_string()),
                parts: vec![
                    Part::text("here you go"),
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png".to_string(),
                            data: data.to_string(),
                        }),
                    },
                ],
            }),
            finish_reason: Some("STOP".to_string()),
            finish_message: None,
        }
    }

    #[test]
    fn test_image_part_is_decoded() {
        let response = GenerateContentResponse {
            candidates: vec![image_candidate(&STANDARD.encode([1u8, 2, 3]))],
            prompt_feedback: None,
        };
        let image = interpret_response(response).unwrap();
        assert_eq!(image.bytes(), &vec![1u8, 2, 3]);
        assert_eq!(image.mime(), "image/png");
    }

    #[test]
    fn test_prompt_block_is_rejected() {
        let response = GenerateContentResponse {
            candidates: vec![],
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("SAFETY".to_string()),
                block_reason_message: None,
            }),
        };
        let err = interpret_response(response).unwrap_err();
        assert_eq!(err.kind, SynthesisErrorKind::Rejected("SAFETY".to_string()));
    }

    #[test]
    fn test_safety_finish_without_image_is_rejected() {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: None,
                finish_reason: Some("IMAGE_SAFETY".to_string()),
                finish_message: Some("blocked".to_string()),
            }],
            prompt_feedback: None,
        };
        let err = interpret_response(response).unwrap_err();
        assert!(matches!(err.kind, SynthesisErrorKind::Rejected(ref r) if r.starts_with("IMAGE_SAFETY")));
    }

    #[test]
    fn test_text_only_response_is_no_result() {
        let response = GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::text("I cannot draw that")],
                }),
                finish_reason: Some("STOP".to_string()),
                finish_message: None,
            }],
            prompt_feedback: None,
        };
        let err = interpret_response(response).unwrap_err();
        assert!(matches!(err.kind, SynthesisErrorKind::NoResult(_)));
    }

    #[test]
    fn test_bad_base64_is_transport_error() {
        let response = GenerateContentResponse {
            candidates: vec![image_candidate("not base64!!")],
            prompt_feedback: None,
        };
        let err = interpret_response(response).unwrap_err();
        assert!(matches!(err.kind, SynthesisErrorKind::TransportError { .. }));
    }
}
