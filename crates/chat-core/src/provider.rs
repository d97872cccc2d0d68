//! LLM Provider Ports
//!
//! Completion and image generation are external services. The assistant only
//! talks to them through these traits, so a hosted API, a local model or a
//! test stub can be swapped in without touching chat logic.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_core::provider::{CompletionProvider, GenerationOptions};
//!
//! let provider = OpenAiProvider::from_env();
//! let completion = provider.complete(chat.messages(), &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// Configuration for text generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-3.5-turbo")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System prompt sent ahead of the chat history
    #[serde(default)]
    pub system_prompt: Option<String>,
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_max_tokens() -> u32 {
    1000
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

/// Configuration for image generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageOptions {
    pub model: String,
    pub size: String,
    pub quality: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            model: "dall-e-3".into(),
            size: "1024x1024".into(),
            quality: "standard".into(),
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    pub finish_reason: Option<FinishReason>,
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn parse(s: &str) -> Self {
        match s {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}

/// Text completion port
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs and health output
    fn name(&self) -> &str;

    /// Check if the provider is reachable and configured
    async fn health_check(&self) -> Result<bool>;

    /// Generate a reply to a chat history
    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion>;
}

/// Image generation port
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate one image and return its URL
    async fn generate(&self, prompt: &str, options: &ImageOptions) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 1000);
        assert_eq!(opts.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_finish_reason_parse() {
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("length"), FinishReason::Length);
        assert_eq!(FinishReason::parse("tool_calls"), FinishReason::Other);
    }
}
