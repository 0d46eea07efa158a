//! Gemini image models on Vertex AI.

mod client;
mod dto;

pub use client::{VertexImageClient, interpret_response};
pub use dto::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    HARM_CATEGORIES, ImageConfig, InlineData, POLICY_FINISH_REASONS, Part, PromptFeedback,
    SafetySetting,
};
