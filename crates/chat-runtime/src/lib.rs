//! # chat-runtime
//!
//! Provider implementations for the sai-chat ports.
//!
//! ## Providers
//!
//! - **OpenAI** (default): any OpenAI-compatible `/chat/completions` and
//!   `/images/generations` endpoint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_runtime::openai::OpenAiProvider;
//!
//! let provider = Arc::new(OpenAiProvider::from_env());
//! let assistant = Assistant::with_defaults(provider.clone(), provider);
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use chat_core::{
    Assistant, ChatError, CompletionProvider, ImageProvider, Message, Result, Role,
};
