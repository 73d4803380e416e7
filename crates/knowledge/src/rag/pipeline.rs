//! Pipeline driver.

use crate::rag::answer::AnswerGenerator;
use crate::rag::expand::{KeywordRewriter, QueryExpander};
use crate::rag::filter::RelevanceFilter;
use crate::rag::merge::merge_results;
use crate::rag::types::{ExpandedQuerySet, RagResponse};
use crate::retriever::{create_retriever, Retriever};
use crate::types::RetrievedDocument;
use askbase_core::config::{ExpansionMode, RetrievalErrorPolicy};
use askbase_core::{AppConfig, AppError, AppResult};
use askbase_llm::{create_client, ClientOptions, LlmClient, ModelSettings};
use askbase_prompt::PromptSettings;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::Instrument;

/// Run-time knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub n_queries: usize,
    pub output_format: String,
    pub top_k: usize,
    pub max_concurrency: usize,
    pub on_retrieval_error: RetrievalErrorPolicy,
    pub expansion: ExpansionMode,
    pub relevance_filter: bool,
    pub context_delimiter: String,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig, prompts: &PromptSettings) -> Self {
        Self {
            n_queries: prompts.query_expansion.n_queries,
            output_format: prompts.query_expansion.output_format.clone(),
            top_k: config.knowledge.top_k,
            max_concurrency: config.pipeline.max_concurrency,
            on_retrieval_error: config.pipeline.on_retrieval_error,
            expansion: config.pipeline.expansion,
            relevance_filter: config.pipeline.relevance_filter,
            context_delimiter: config.pipeline.context_delimiter.clone(),
        }
    }
}

/// Load `config_llm.yaml` and `prompt_template.yaml` for `config`.
///
/// The `--model`/`ASKBASE_MODEL` override is applied to the model settings.
pub fn load_settings(config: &AppConfig) -> AppResult<(ModelSettings, PromptSettings)> {
    let models = ModelSettings::load(&config.llm_settings_path())?
        .with_model_override(config.model.as_deref());
    let prompts = PromptSettings::load(&config.prompt_settings_path())?;
    Ok((models, prompts))
}

/// Expand → Retrieve → (Filter) → Generate.
pub struct RagPipeline {
    retriever: Arc<dyn Retriever>,
    expander: QueryExpander,
    keyword_rewriter: Option<KeywordRewriter>,
    filter: Option<RelevanceFilter>,
    answerer: AnswerGenerator,
    options: PipelineOptions,
}

impl RagPipeline {
    /// Build a pipeline from configuration.
    ///
    /// Every file is loaded and validated before any client is created, so
    /// configuration mistakes surface without network traffic.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        let (models, prompts) = load_settings(config)?;
        let options = PipelineOptions::from_config(config, &prompts);

        let retriever =
            create_retriever(&config.knowledge, config.resolve_retrieval_token()?)?;
        let client = create_client(&ClientOptions::from_config(
            &config.llm,
            config.resolve_api_key(),
        ))
        .await?;

        Self::new(client, retriever, &models, &prompts, options)
    }

    /// Assemble a pipeline from already-built collaborators.
    pub fn new(
        client: Arc<dyn LlmClient>,
        retriever: Arc<dyn Retriever>,
        models: &ModelSettings,
        prompts: &PromptSettings,
        options: PipelineOptions,
    ) -> AppResult<Self> {
        let model = models.model_id.as_str();

        let expander = QueryExpander::new(
            client.clone(),
            model,
            models.query_expansion.clone(),
            &prompts.query_expansion,
        )?;

        let keyword_rewriter = match options.expansion {
            ExpansionMode::Structured => None,
            ExpansionMode::Keywords => {
                let prompt = prompts.keyword_rewrite.as_ref().ok_or_else(|| {
                    AppError::Config(
                        "keyword expansion requires a keyword_rewrite prompt template".to_string(),
                    )
                })?;
                Some(KeywordRewriter::new(
                    client.clone(),
                    model,
                    models.keyword_rewrite.clone().unwrap_or_default(),
                    prompt,
                )?)
            }
        };

        let filter = if options.relevance_filter {
            let prompt = prompts.relevance_filter.as_ref().ok_or_else(|| {
                AppError::Config(
                    "relevance filtering requires a relevance_filter prompt template".to_string(),
                )
            })?;
            Some(RelevanceFilter::new(
                client.clone(),
                model,
                models.relevance_filter.clone().unwrap_or_default(),
                prompt,
            )?)
        } else {
            None
        };

        let answerer = AnswerGenerator::new(client, model, models.answer.clone(), &prompts.answer)?
            .with_delimiter(options.context_delimiter.as_str());

        Ok(Self {
            retriever,
            expander,
            keyword_rewriter,
            filter,
            answerer,
            options,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the whole pipeline for one question.
    pub async fn run(&self, question: &str) -> AppResult<RagResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("rag", request_id = %request_id);

        async move {
            tracing::info!("Answering: {}", question);

            let queries = self.expand(question).await?;
            let documents = self.retrieve_all(&queries).await?;

            let (documents, filtered_out) = match self.filter {
                Some(ref filter) => {
                    filter
                        .filter(question, documents, self.options.max_concurrency)
                        .await?
                }
                None => (documents, 0),
            };

            let excerpts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
            let answer = self.answerer.answer(question, &excerpts).await?;

            tracing::info!(
                documents = documents.len(),
                filtered_out,
                "Answer generated"
            );

            Ok(RagResponse {
                request_id,
                answer,
                queries,
                documents,
                filtered_out,
            })
        }
        .instrument(span)
        .await
    }

    /// Expansion stage only.
    pub async fn expand(&self, question: &str) -> AppResult<ExpandedQuerySet> {
        match self.keyword_rewriter {
            Some(ref rewriter) => rewriter.rewrite(question).await,
            None => {
                self.expander
                    .expand(question, self.options.n_queries, &self.options.output_format)
                    .await
            }
        }
    }

    /// Retrieve for every query and merge the results.
    ///
    /// Up to `max_concurrency` calls run at once; results are merged in query
    /// order regardless of completion order.
    pub async fn retrieve_all(&self, queries: &ExpandedQuerySet) -> AppResult<Vec<RetrievedDocument>> {
        let top_k = self.options.top_k;
        let retriever = &self.retriever;

        let results: Vec<(&str, AppResult<Vec<RetrievedDocument>>)> =
            stream::iter(queries.queries())
                .map(|query| async move { (query, retriever.retrieve(query, top_k).await) })
                .buffered(self.options.max_concurrency.max(1))
                .collect()
                .await;

        let mut batches = Vec::with_capacity(results.len());
        for (query, result) in results {
            match (result, self.options.on_retrieval_error) {
                (Ok(documents), _) => batches.push(documents),
                (Err(e), RetrievalErrorPolicy::Empty) => {
                    tracing::warn!("Retrieval failed for '{}', continuing without it: {}", query, e);
                    batches.push(Vec::new());
                }
                (Err(e), RetrievalErrorPolicy::Fail) => return Err(e),
            }
        }

        let retrieved: usize = batches.iter().map(Vec::len).sum();
        let merged = merge_results(batches);
        tracing::info!(
            queries = queries.len(),
            retrieved,
            unique = merged.len(),
            "Retrieval complete"
        );

        Ok(merged)
    }
}
