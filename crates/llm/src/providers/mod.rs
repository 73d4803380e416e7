//! LLM provider implementations.

#[cfg(feature = "bedrock")]
pub mod bedrock;
pub mod claude;
pub mod ollama;

#[cfg(feature = "bedrock")]
pub use bedrock::BedrockClient;
pub use claude::ClaudeClient;
pub use ollama::OllamaClient;
