//! OpenAI-compatible Provider
//!
//! Implementation of `CompletionProvider` and `ImageProvider` over the
//! OpenAI REST API (or anything that speaks it).

use std::time::Duration;

use async_trait::async_trait;
use chat_core::{
    error::{ChatError, Result},
    message::Message,
    provider::{
        Completion, CompletionProvider, FinishReason, GenerationOptions, ImageOptions,
        ImageProvider, TokenUsage,
    },
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key; without one every request fails and callers fall back
    pub api_key: Option<String>,

    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// Chat model
    pub model: String,

    /// Image model
    pub image_model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-3.5-turbo".into(),
            image_model: "dall-e-3".into(),
            timeout_secs: 60,
        }
    }
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: lookup("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: lookup("OPENAI_MODEL").unwrap_or(defaults.model),
            image_model: lookup("OPENAI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            timeout_secs: lookup("OPENAI_TIMEOUT_SECS")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn from_config(config: OpenAiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OpenAiConfig::from_env())
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::Config("OPENAI_API_KEY not set".into()))
    }

    /// Convert chat messages to the wire format, system prompt first
    fn convert_messages<'a>(
        messages: &'a [Message],
        options: &'a GenerationOptions,
    ) -> Vec<WireMessage<'a>> {
        options
            .system_prompt
            .as_deref()
            .map(|prompt| WireMessage {
                role: "system",
                content: prompt,
            })
            .into_iter()
            .chain(messages.iter().map(|m| WireMessage {
                role: match m.role {
                    chat_core::Role::User => "user",
                    chat_core::Role::Assistant => "assistant",
                },
                content: &m.content,
            }))
            .collect()
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned + Send>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let key = self.api_key()?;
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider(format!("{status}: {detail}")));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ChatError::Provider(format!("invalid response: {e}")))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn health_check(&self) -> Result<bool> {
        let Ok(key) = self.api_key() else {
            return Ok(false);
        };

        match self
            .client
            .get(format!("{}/models", self.config.base_url))
            .bearer_auth(key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("OpenAI health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let model = if options.model.is_empty() {
            self.config.model.as_str()
        } else {
            options.model.as_str()
        };

        let request = ChatCompletionRequest {
            model,
            messages: Self::convert_messages(messages, options),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response: ChatCompletionResponse = self.post("/chat/completions", &request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Provider("no choices returned".into()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, options: &ImageOptions) -> Result<String> {
        let model = if options.model.is_empty() {
            self.config.image_model.as_str()
        } else {
            options.model.as_str()
        };

        let request = ImageRequest {
            model,
            prompt,
            size: &options.size,
            quality: &options.quality,
            n: 1,
        };

        let response: ImageResponse = self.post("/images/generations", &request).await?;
        Ok(response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENAI_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let config = OpenAiConfig::from_lookup(|k| vars.get(k).map(ToString::to_string));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.image_model, "dall-e-3");
    }

    #[test]
    fn test_blank_key_treated_as_missing() {
        let config = OpenAiConfig::from_lookup(|k| (k == "OPENAI_API_KEY").then(|| "  ".to_string()));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![Message::user("Hello"), Message::assistant("Hi there")];
        let options = GenerationOptions {
            system_prompt: Some("Be brief.".into()),
            ..Default::default()
        };

        let converted = OpenAiProvider::convert_messages(&messages, &options);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].content, "Hi there");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let provider = OpenAiProvider::from_config(OpenAiConfig::default());
        assert!(!provider.health_check().await.unwrap());

        let result = provider
            .complete(&[Message::user("hi")], &GenerationOptions::default())
            .await;
        assert!(matches!(result, Err(ChatError::Config(_))));
    }
}
