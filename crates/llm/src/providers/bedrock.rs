//! AWS Bedrock Converse API provider.
//!
//! Authenticates through the standard AWS credential chain. A trailing
//! assistant turn is forwarded as a prefill message.

use crate::client::{ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use askbase_core::{AppError, AppResult};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types as bedrock;
use aws_sdk_bedrockruntime::Client;

/// Region used when the config does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Bedrock Runtime client.
pub struct BedrockClient {
    client: Client,
    region: String,
}

impl BedrockClient {
    /// Load AWS credentials and create a Bedrock Runtime client.
    pub async fn new(region: Option<&str>, profile: Option<&str>) -> Self {
        let region = region.unwrap_or(DEFAULT_REGION).to_string();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()));

        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        let aws_config = loader.load().await;
        tracing::info!(region = %region, "Bedrock client initialized");

        Self {
            client: Client::new(&aws_config),
            region,
        }
    }

    /// Region the client talks to.
    pub fn region(&self) -> &str {
        &self.region
    }

    fn to_messages(request: &LlmRequest) -> AppResult<Vec<bedrock::Message>> {
        request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    ChatRole::User => bedrock::ConversationRole::User,
                    ChatRole::Assistant => bedrock::ConversationRole::Assistant,
                };
                bedrock::Message::builder()
                    .role(role)
                    .content(bedrock::ContentBlock::Text(m.content.clone()))
                    .build()
                    .map_err(|e| AppError::Generation(format!("Failed to build message: {}", e)))
            })
            .collect()
    }

    fn inference_config(request: &LlmRequest) -> bedrock::InferenceConfiguration {
        let mut builder = bedrock::InferenceConfiguration::builder();
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(max_tokens as i32);
        }
        if let Some(top_p) = request.top_p {
            builder = builder.top_p(top_p);
        }
        if !request.stop_sequences.is_empty() {
            builder = builder.set_stop_sequences(Some(request.stop_sequences.clone()));
        }
        builder.build()
    }
}

#[async_trait::async_trait]
impl LlmClient for BedrockClient {
    fn provider_name(&self) -> &str {
        "bedrock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, region = %self.region, "Calling Bedrock Converse API");
        tracing::debug!("Request: {:?}", request);

        let mut call = self
            .client
            .converse()
            .model_id(&request.model)
            .set_messages(Some(Self::to_messages(request)?))
            .inference_config(Self::inference_config(request));

        if let Some(ref system) = request.system {
            call = call.system(bedrock::SystemContentBlock::Text(system.clone()));
        }

        let output = call.send().await.map_err(|e| {
            AppError::Generation(format!(
                "Bedrock Converse call failed: {}",
                DisplayErrorContext(&e)
            ))
        })?;

        let content = match output.output() {
            Some(bedrock::ConverseOutput::Message(message)) => message
                .content()
                .iter()
                .filter_map(|block| match block {
                    bedrock::ContentBlock::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
            _ => {
                return Err(AppError::Generation(
                    "No message output in Bedrock response".to_string(),
                ))
            }
        };

        let usage = output
            .usage()
            .map(|u| {
                LlmUsage::new(
                    u.input_tokens().max(0) as u32,
                    u.output_tokens().max(0) as u32,
                )
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefill_becomes_assistant_message() {
        let request = LlmRequest::new("question", "anthropic.claude-3-haiku-20240307-v1:0")
            .with_prefill("{");
        let messages = BedrockClient::to_messages(&request).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role(), &bedrock::ConversationRole::Assistant);
    }

    #[test]
    fn test_inference_config() {
        let request = LlmRequest::new("q", "m")
            .with_temperature(0.0)
            .with_max_tokens(512);
        let config = BedrockClient::inference_config(&request);
        assert_eq!(config.temperature(), Some(0.0));
        assert_eq!(config.max_tokens(), Some(512));
        assert_eq!(config.top_p(), None);
    }
}
