//! Answer generation.

use crate::rag::{bindings, Stage};
use askbase_core::AppResult;
use askbase_llm::{LlmClient, StageSettings};
use askbase_prompt::AnswerPrompt;
use std::sync::Arc;

/// Default separator between excerpts in the context block.
pub const DEFAULT_CONTEXT_DELIMITER: &str = "\n\n";

/// Produces the final answer from a question and context excerpts.
#[derive(Clone)]
pub struct AnswerGenerator {
    stage: Stage,
    delimiter: String,
}

impl AnswerGenerator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        settings: StageSettings,
        prompt: &AnswerPrompt,
    ) -> AppResult<Self> {
        Ok(Self {
            stage: Stage::new(client, model, settings, prompt.template()?),
            delimiter: DEFAULT_CONTEXT_DELIMITER.to_string(),
        })
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Excerpts joined with the configured delimiter; empty when there are none.
    pub fn build_context(&self, excerpts: &[String]) -> String {
        excerpts.join(&self.delimiter)
    }

    /// Generate the answer text, returned exactly as the model produced it.
    pub async fn answer(&self, question: &str, excerpts: &[String]) -> AppResult<String> {
        if excerpts.is_empty() {
            tracing::info!("Answering without context");
        }

        let prompt = self.stage.prompt(bindings([
            ("context", self.build_context(excerpts)),
            ("question", question.to_string()),
        ]))?;

        self.stage.generate(prompt).await
    }
}
