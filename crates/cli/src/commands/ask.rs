//! Ask command handler.
//!
//! Runs the full pipeline: expand, retrieve, optionally filter, answer.

use askbase_core::{config::AppConfig, AppError, AppResult};
use askbase_knowledge::RagPipeline;
use clap::Args;

/// Answer a question with the full pipeline
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question (default: pipeline.question from config.yaml)
    pub question: Option<String>,

    /// Judge every retrieved excerpt for relevance before answering
    #[arg(long, overrides_with = "no_filter")]
    pub filter: bool,

    /// Skip relevance filtering even if enabled in config
    #[arg(long, overrides_with = "filter")]
    pub no_filter: bool,

    /// Maximum excerpts per query
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = resolve_question(self.question.as_deref(), config)?;
        let config = self.apply(config.clone());

        let pipeline = RagPipeline::from_config(&config).await?;
        let response = pipeline.run(&question).await?;

        if self.json {
            super::print_json(&response)
        } else {
            println!("{}", response.answer);
            Ok(())
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if self.filter {
            config.pipeline.relevance_filter = true;
        }
        if self.no_filter {
            config.pipeline.relevance_filter = false;
        }
        if let Some(top_k) = self.top_k {
            config.knowledge.top_k = top_k;
        }
        config
    }
}

/// The question from the command line, else `pipeline.question`.
pub(crate) fn resolve_question(arg: Option<&str>, config: &AppConfig) -> AppResult<String> {
    arg.map(str::to_string)
        .or_else(|| config.pipeline.question.clone())
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| {
            AppError::Config(
                "No question provided: pass one or set pipeline.question in config.yaml"
                    .to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> AskCommand {
        AskCommand {
            question: None,
            filter: false,
            no_filter: false,
            top_k: None,
            json: false,
        }
    }

    #[test]
    fn test_question_argument_wins() {
        let mut config = AppConfig::default();
        config.pipeline.question = Some("from config".to_string());
        assert_eq!(
            resolve_question(Some("from cli"), &config).unwrap(),
            "from cli"
        );
        assert_eq!(resolve_question(None, &config).unwrap(), "from config");
    }

    #[test]
    fn test_missing_question() {
        let config = AppConfig::default();
        assert!(matches!(
            resolve_question(None, &config),
            Err(AppError::Config(_))
        ));
        assert!(resolve_question(Some("   "), &config).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut cmd = command();
        cmd.filter = true;
        cmd.top_k = Some(3);
        let config = cmd.apply(AppConfig::default());
        assert!(config.pipeline.relevance_filter);
        assert_eq!(config.knowledge.top_k, 3);

        let mut cmd = command();
        cmd.no_filter = true;
        let mut base = AppConfig::default();
        base.pipeline.relevance_filter = true;
        assert!(!cmd.apply(base).pipeline.relevance_filter);
    }
}
