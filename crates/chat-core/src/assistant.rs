//! Assistant
//!
//! Turns a chat into the next assistant message. Provider failures never
//! surface as errors here: the reply falls back to canned content and is
//! flagged `degraded`, so callers can tell a real answer from a stand-in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chat::Chat;
use crate::message::Message;
use crate::provider::{CompletionProvider, GenerationOptions, ImageOptions, ImageProvider};

const DEFAULT_SYSTEM_PROMPT: &str = "You are S-AI Chat, a friendly and knowledgeable assistant. \
Answer helpfully and in detail, use examples where they help, and reply in the language the user writes in.";

const EMPTY_COMPLETION: &str = "Sorry, I couldn't come up with a reply.";

const PLACEHOLDER_IMAGE_URL: &str = "https://images.pexels.com/photos/1103970/pexels-photo-1103970.jpeg?auto=compress&cs=tinysrgb&w=1024&h=1024&fit=crop";

const IMAGE_PROMPT_SUFFIX: &str = "(high quality, detailed, artistic)";

/// Assistant configuration
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub generation: GenerationOptions,

    pub image: ImageOptions,

    /// Canned replies used when the completion provider fails
    pub fallback_replies: Vec<String>,

    /// Image URL used when the image provider fails
    pub placeholder_image_url: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            generation: GenerationOptions {
                system_prompt: Some(DEFAULT_SYSTEM_PROMPT.into()),
                ..Default::default()
            },
            image: ImageOptions::default(),
            fallback_replies: vec![
                "Hello! How can I help you? I'm ready to answer your questions.".into(),
                "I'll do my best to help with this. If you ask a more specific question I can go into more detail.".into(),
                "Interesting topic! Which angle would you like me to take?".into(),
            ],
            placeholder_image_url: PLACEHOLDER_IMAGE_URL.into(),
        }
    }
}

/// Content for the next assistant message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// True when the content is a fallback, not provider output
    pub degraded: bool,
}

impl Reply {
    pub fn into_message(self) -> Message {
        let message = Message::assistant(self.content);
        match self.image_url {
            Some(url) => message.with_image(url),
            None => message,
        }
    }
}

pub struct Assistant {
    completion: Arc<dyn CompletionProvider>,
    images: Arc<dyn ImageProvider>,
    config: AssistantConfig,
}

impl Assistant {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        images: Arc<dyn ImageProvider>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            completion,
            images,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(
        completion: Arc<dyn CompletionProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Self {
        Self::new(completion, images, AssistantConfig::default())
    }

    pub fn completion_provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.completion
    }

    pub const fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Answer the last message of a chat using the whole history as context
    pub async fn reply(&self, chat: &Chat) -> Reply {
        match self
            .completion
            .complete(chat.messages(), &self.config.generation)
            .await
        {
            Ok(completion) if !completion.content.trim().is_empty() => Reply {
                content: completion.content,
                image_url: None,
                degraded: false,
            },
            Ok(_) => {
                tracing::warn!(provider = self.completion.name(), "Empty completion, using fallback");
                Reply {
                    content: EMPTY_COMPLETION.into(),
                    image_url: None,
                    degraded: true,
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.completion.name(),
                    error = %e,
                    "Completion failed, serving fallback reply"
                );
                Reply {
                    content: self.fallback_for(chat),
                    image_url: None,
                    degraded: true,
                }
            }
        }
    }

    /// Generate an image for a prompt
    pub async fn illustrate(&self, prompt: &str) -> Reply {
        let content = format!("Image generated: \"{prompt}\"");
        let full_prompt = format!("{prompt} {IMAGE_PROMPT_SUFFIX}");

        let (url, degraded) = match self.images.generate(&full_prompt, &self.config.image).await {
            Ok(url) if !url.is_empty() => (url, false),
            Ok(_) => {
                tracing::warn!("Image provider returned no URL, using placeholder");
                (self.config.placeholder_image_url.clone(), true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image generation failed, using placeholder");
                (self.config.placeholder_image_url.clone(), true)
            }
        };

        Reply {
            content,
            image_url: Some(url),
            degraded,
        }
    }

    fn fallback_for(&self, chat: &Chat) -> String {
        let replies = &self.config.fallback_replies;
        if replies.is_empty() {
            return EMPTY_COMPLETION.into();
        }
        replies[chat.len() % replies.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChatError, Result};
    use crate::provider::Completion;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(Completion {
                content: format!("echo: {last}"),
                model: options.model.clone(),
                usage: None,
                finish_reason: None,
            })
        }
    }

    struct Down;

    #[async_trait]
    impl CompletionProvider for Down {
        fn name(&self) -> &str {
            "down"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        async fn complete(&self, _: &[Message], _: &GenerationOptions) -> Result<Completion> {
            Err(ChatError::ProviderUnavailable("connection refused".into()))
        }
    }

    #[async_trait]
    impl ImageProvider for Down {
        async fn generate(&self, _: &str, _: &ImageOptions) -> Result<String> {
            Err(ChatError::Provider("quota exhausted".into()))
        }
    }

    struct Painter;

    #[async_trait]
    impl ImageProvider for Painter {
        async fn generate(&self, prompt: &str, _: &ImageOptions) -> Result<String> {
            Ok(format!("https://img.example/{}", prompt.len()))
        }
    }

    fn chat_with(text: &str) -> Chat {
        let mut chat = Chat::new();
        chat.push(Message::user(text));
        chat
    }

    #[tokio::test]
    async fn test_reply_from_provider() {
        let assistant = Assistant::with_defaults(Arc::new(Echo), Arc::new(Painter));
        let reply = assistant.reply(&chat_with("hi")).await;
        assert_eq!(reply.content, "echo: hi");
        assert!(!reply.degraded);
    }

    #[tokio::test]
    async fn test_provider_failure_is_flagged_degraded() {
        let assistant = Assistant::with_defaults(Arc::new(Down), Arc::new(Down));
        let reply = assistant.reply(&chat_with("hi")).await;
        assert!(reply.degraded);
        assert!(assistant.config().fallback_replies.contains(&reply.content));
    }

    #[tokio::test]
    async fn test_image_fallback_uses_placeholder() {
        let assistant = Assistant::with_defaults(Arc::new(Echo), Arc::new(Down));
        let reply = assistant.illustrate("a red fox").await;
        assert!(reply.degraded);
        assert_eq!(reply.image_url.as_deref(), Some(PLACEHOLDER_IMAGE_URL));
        assert_eq!(reply.content, "Image generated: \"a red fox\"");
    }

    #[tokio::test]
    async fn test_image_prompt_suffixed() {
        let assistant = Assistant::with_defaults(Arc::new(Echo), Arc::new(Painter));
        let reply = assistant.illustrate("fox").await;
        let expected = format!("fox {IMAGE_PROMPT_SUFFIX}").len();
        assert_eq!(reply.image_url, Some(format!("https://img.example/{expected}")));
        assert!(!reply.degraded);

        let message = reply.into_message();
        assert!(message.image_url.is_some());
    }
}
