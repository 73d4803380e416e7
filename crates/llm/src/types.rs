//! Model settings and provider types.
//!
//! `ModelSettings` mirrors `config_llm.yaml`: one model id plus, for every
//! pipeline stage, the system/assistant message text and invocation args.

use crate::client::LlmRequest;
use askbase_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of `config_llm.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model identifier used by every stage
    pub model_id: String,

    /// Query expansion stage
    pub query_expansion: StageSettings,

    /// Answer generation stage
    pub answer: StageSettings,

    /// Relevance filter stage (only needed when filtering is enabled)
    #[serde(default)]
    pub relevance_filter: Option<StageSettings>,

    /// Keyword rewrite stage (only needed in keyword expansion mode)
    #[serde(default)]
    pub keyword_rewrite: Option<StageSettings>,
}

/// Per-stage message text and model arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageSettings {
    /// System message sent with every request of this stage
    #[serde(default)]
    pub system_message: Option<String>,

    /// Assistant prefill the model continues from (e.g. "{")
    #[serde(default)]
    pub assistant_message: Option<String>,

    /// Model invocation parameters
    #[serde(default)]
    pub args: ModelArgs,
}

/// Model invocation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArgs {
    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub top_p: Option<f32>,

    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

impl ModelArgs {
    /// Copy these arguments onto a request.
    pub fn apply(&self, mut request: LlmRequest) -> LlmRequest {
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(top_p) = self.top_p {
            request = request.with_top_p(top_p);
        }
        if !self.stop_sequences.is_empty() {
            request = request.with_stop_sequences(self.stop_sequences.clone());
        }
        request
    }
}

impl ModelSettings {
    /// Load and validate `config_llm.yaml`.
    ///
    /// Missing required keys (such as `model_id`) are configuration errors,
    /// never silent defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        tracing::debug!("Loading model settings from: {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read model settings {:?}: {}", path, e))
        })?;

        Self::from_yaml(&contents)
            .map_err(|e| AppError::Config(format!("Invalid model settings {:?}: {}", path, e)))
    }

    /// Parse model settings from a YAML string.
    pub fn from_yaml(contents: &str) -> Result<Self, String> {
        let settings: ModelSettings =
            serde_yaml::from_str(contents).map_err(|e| e.to_string())?;

        if settings.model_id.trim().is_empty() {
            return Err("model_id cannot be empty".to_string());
        }

        Ok(settings)
    }

    /// Replace the model id (CLI/env override).
    pub fn with_model_override(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model {
            self.model_id = model.to_string();
        }
        self
    }
}

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Ollama,
    Claude,
    Bedrock,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "claude" | "anthropic" => Some(Self::Claude),
            "bedrock" => Some(Self::Bedrock),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Claude => "claude",
            Self::Bedrock => "bedrock",
        }
    }
}
