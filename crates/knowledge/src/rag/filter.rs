//! Relevance filtering of retrieved excerpts.

use crate::rag::types::RelevanceJudgment;
use crate::rag::{bindings, Stage};
use crate::types::RetrievedDocument;
use askbase_core::AppResult;
use askbase_llm::{LlmClient, StageSettings};
use askbase_prompt::FilterPrompt;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Asks the model whether each excerpt helps answer the question.
#[derive(Clone)]
pub struct RelevanceFilter {
    stage: Stage,
    output_format: String,
}

impl RelevanceFilter {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        settings: StageSettings,
        prompt: &FilterPrompt,
    ) -> AppResult<Self> {
        Ok(Self {
            stage: Stage::new(client, model, settings, prompt.template()?),
            output_format: prompt.output_format.clone(),
        })
    }

    /// Judge one excerpt.
    ///
    /// A label that is neither `relevant` nor `not_relevant` counts as
    /// `NotRelevant`.
    pub async fn judge(&self, question: &str, document: &str) -> AppResult<RelevanceJudgment> {
        let prompt = self.stage.prompt(bindings([
            ("question", question.to_string()),
            ("document", document.to_string()),
            ("output_format", self.output_format.clone()),
        ]))?;

        let label = self.stage.generate(prompt).await?;

        Ok(RelevanceJudgment::parse(&label).unwrap_or_else(|| {
            tracing::warn!("Unrecognized relevance label, treating as not relevant: {}", label);
            RelevanceJudgment::NotRelevant
        }))
    }

    /// Keep the excerpts judged relevant, preserving order.
    ///
    /// Returns the kept excerpts and the number dropped. Up to `concurrency`
    /// judgments run at once.
    pub async fn filter(
        &self,
        question: &str,
        documents: Vec<RetrievedDocument>,
        concurrency: usize,
    ) -> AppResult<(Vec<RetrievedDocument>, usize)> {
        let judgments: Vec<RelevanceJudgment> = stream::iter(documents.iter())
            .map(|doc| self.judge(question, &doc.content))
            .buffered(concurrency.max(1))
            .try_collect()
            .await?;

        let total = documents.len();
        let kept: Vec<RetrievedDocument> = documents
            .into_iter()
            .zip(judgments)
            .filter_map(|(doc, judgment)| judgment.is_relevant().then_some(doc))
            .collect();

        let dropped = total - kept.len();
        tracing::info!(kept = kept.len(), dropped, "Relevance filter applied");

        Ok((kept, dropped))
    }
}
