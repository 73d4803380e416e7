//! Expand command handler.

use super::ask::resolve_question;
use askbase_core::config::{AppConfig, ExpansionMode};
use askbase_core::{AppError, AppResult};
use askbase_knowledge::rag::pipeline::load_settings;
use askbase_knowledge::{KeywordRewriter, QueryExpander};
use askbase_llm::{create_client, ClientOptions};
use clap::Args;

/// Expand a question into search queries
#[derive(Args, Debug)]
pub struct ExpandCommand {
    /// The question (default: pipeline.question from config.yaml)
    pub question: Option<String>,

    /// Number of queries to generate (default: n_queries from prompt_template.yaml)
    #[arg(long)]
    pub n_queries: Option<usize>,
}

impl ExpandCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing expand command");

        let question = resolve_question(self.question.as_deref(), config)?;
        config.validate_llm()?;
        let (models, prompts) = load_settings(config)?;

        let client = create_client(&ClientOptions::from_config(
            &config.llm,
            config.resolve_api_key(),
        ))
        .await?;

        let queries = match config.pipeline.expansion {
            ExpansionMode::Structured => {
                let n_queries = self.n_queries.unwrap_or(prompts.query_expansion.n_queries);
                if n_queries == 0 {
                    return Err(AppError::Config(
                        "--n-queries must be at least 1".to_string(),
                    ));
                }
                QueryExpander::new(
                    client,
                    models.model_id.as_str(),
                    models.query_expansion.clone(),
                    &prompts.query_expansion,
                )?
                .expand(&question, n_queries, &prompts.query_expansion.output_format)
                .await?
            }
            ExpansionMode::Keywords => {
                let prompt = prompts.keyword_rewrite.as_ref().ok_or_else(|| {
                    AppError::Config(
                        "keyword expansion requires a keyword_rewrite prompt template"
                            .to_string(),
                    )
                })?;
                KeywordRewriter::new(
                    client,
                    models.model_id.as_str(),
                    models.keyword_rewrite.clone().unwrap_or_default(),
                    prompt,
                )?
                .rewrite(&question)
                .await?
            }
        };

        super::print_json(&queries)
    }
}
