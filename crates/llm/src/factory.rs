//! LLM provider factory.
//!
//! Builds the configured text-generation client. Construction never makes a
//! network request; the first call happens when a pipeline stage runs.

use crate::client::LlmClient;
use crate::providers::{ClaudeClient, OllamaClient};
use crate::types::ProviderType;
use askbase_core::config::LlmConnectionConfig;
use askbase_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Everything needed to construct a client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Provider identifier ("ollama", "claude", "bedrock")
    pub provider: String,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// API key (for providers that require it)
    pub api_key: Option<String>,

    /// Cloud region (Bedrock)
    pub region: Option<String>,

    /// Credentials profile (Bedrock)
    pub profile: Option<String>,

    /// Request timeout
    pub timeout: Duration,
}

impl ClientOptions {
    /// Build options from the application's LLM connection settings.
    pub fn from_config(config: &LlmConnectionConfig, api_key: Option<String>) -> Self {
        Self {
            provider: config.provider.clone(),
            endpoint: config.endpoint.clone(),
            api_key,
            region: config.region.clone(),
            profile: config.profile.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Create an LLM client for the configured provider.
///
/// # Errors
/// Returns `AppError::Config` if:
/// - Provider is unknown
/// - Required secrets are missing
/// - The provider was not compiled in
pub async fn create_client(options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&options.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", options.provider)))?;

    tracing::debug!(provider = provider.as_str(), "Creating LLM client");

    match provider {
        ProviderType::Ollama => {
            let base_url = options
                .endpoint
                .as_deref()
                .unwrap_or(crate::providers::ollama::DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_timeout(base_url, options.timeout)?))
        }
        ProviderType::Claude => {
            let api_key = options.api_key.as_deref().ok_or_else(|| {
                AppError::Config("Claude provider requires API key".to_string())
            })?;
            Ok(Arc::new(ClaudeClient::new(
                api_key,
                options.endpoint.as_deref(),
                options.timeout,
            )?))
        }
        ProviderType::Bedrock => create_bedrock_client(options).await,
    }
}

#[cfg(feature = "bedrock")]
async fn create_bedrock_client(options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let client = crate::providers::BedrockClient::new(
        options.region.as_deref(),
        options.profile.as_deref(),
    )
    .await;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "bedrock"))]
async fn create_bedrock_client(_options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    Err(AppError::Config(
        "Bedrock provider not compiled in; rebuild with `--features bedrock`".to_string(),
    ))
}
