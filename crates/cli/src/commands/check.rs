//! Check command handler.
//!
//! Loads every configuration file and builds the pipeline. Building never
//! contacts the generation or retrieval service.

use askbase_core::{config::AppConfig, AppResult};
use askbase_knowledge::rag::pipeline::load_settings;
use askbase_knowledge::RagPipeline;
use clap::Args;

/// Validate configuration without contacting any service
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing check command");

        let pipeline = RagPipeline::from_config(config).await?;
        let (models, _) = load_settings(config)?;
        let options = pipeline.options();

        let summary = serde_json::json!({
            "status": "ok",
            "provider": config.llm.provider,
            "modelId": models.model_id,
            "knowledgeBaseId": config.knowledge.knowledge_base_id,
            "backend": config.knowledge.backend,
            "topK": options.top_k,
            "nQueries": options.n_queries,
            "expansion": options.expansion,
            "relevanceFilter": options.relevance_filter,
            "onRetrievalError": options.on_retrieval_error,
            "files": {
                "llm": config.llm_settings_path(),
                "prompts": config.prompt_settings_path(),
            },
        });

        if self.json {
            return super::print_json(&summary);
        }

        println!("Configuration OK");
        println!("  provider:         {}", config.llm.provider);
        println!("  model:            {}", models.model_id);
        println!(
            "  knowledge base:   {}",
            config.knowledge.knowledge_base_id.as_deref().unwrap_or("-")
        );
        println!("  queries:          {} + original", options.n_queries);
        println!("  relevance filter: {}", options.relevance_filter);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_check_reports_missing_prompt_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".askbase");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.yaml"),
            "knowledge:\n  knowledge_base_id: KB1\n  endpoint: \"http://127.0.0.1:9\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("config_llm.yaml"),
            "model_id: m\nquery_expansion: {}\nanswer: {}\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        let err = CheckCommand { json: false }
            .execute(&config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("prompt_template.yaml"));
    }
}
