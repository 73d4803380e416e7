//! Text-generation integration for Askbase.
//!
//! Provides a provider-agnostic, chat-shaped client abstraction plus the
//! per-stage model settings read from `config_llm.yaml`.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Claude**: Anthropic Messages API
//! - **Bedrock**: AWS Bedrock Converse API (`bedrock` feature)
//!
//! # Example
//! ```no_run
//! use askbase_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("List three search queries", "llama3.2").with_prefill("{");
//! let response = client.complete(&request).await?;
//! println!("{{{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ClientOptions};
pub use providers::{ClaudeClient, OllamaClient};
pub use types::{ModelArgs, ModelSettings, ProviderType, StageSettings};
