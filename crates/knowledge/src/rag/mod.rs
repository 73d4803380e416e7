//! Retrieval-augmented answering.
//!
//! Expand → Retrieve (one call per query) → optional relevance filter → Generate.

pub mod answer;
pub mod expand;
pub mod filter;
pub mod merge;
pub mod pipeline;
pub mod types;

pub use answer::AnswerGenerator;
pub use expand::{KeywordRewriter, QueryExpander};
pub use filter::RelevanceFilter;
pub use merge::merge_results;
pub use pipeline::{PipelineOptions, RagPipeline};
pub use types::{ExpandedQuerySet, RagResponse, RelevanceJudgment, ORIGINAL_QUERY_KEY};

use askbase_llm::{LlmClient, LlmRequest, StageSettings};
use askbase_prompt::{build_chat_prompt, Bindings, BuiltPrompt, PromptTemplate};
use askbase_core::AppResult;
use std::sync::Arc;

/// One model-backed stage: client, model, per-stage settings and template.
#[derive(Clone)]
pub(crate) struct Stage {
    client: Arc<dyn LlmClient>,
    model: String,
    settings: StageSettings,
    template: PromptTemplate,
}

impl Stage {
    pub(crate) fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        settings: StageSettings,
        template: PromptTemplate,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            settings,
            template,
        }
    }

    /// Render the template and build the chat triple.
    pub(crate) fn prompt(&self, bindings: Bindings) -> AppResult<BuiltPrompt> {
        build_chat_prompt(
            &self.template,
            bindings,
            self.settings.system_message.as_deref(),
            self.settings.assistant_message.as_deref(),
        )
    }

    /// Send a built prompt and return the assistant turn: seed + continuation.
    pub(crate) async fn generate(&self, prompt: BuiltPrompt) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt.user, self.model.as_str());
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }
        if let Some(ref seed) = prompt.assistant_seed {
            request = request.with_prefill(seed.as_str());
        }
        let request = self.settings.args.apply(request);

        tracing::debug!(
            template = %prompt.metadata.template_name,
            provider = self.client.provider_name(),
            "Calling text generation"
        );

        let response = self.client.complete(&request).await?;

        let mut text = prompt.assistant_seed.unwrap_or_default();
        text.push_str(&response.content);
        Ok(text)
    }
}

pub(crate) fn bindings<const N: usize>(pairs: [(&str, String); N]) -> Bindings {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
