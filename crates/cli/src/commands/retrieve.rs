//! Retrieve command handler.

use askbase_core::{config::AppConfig, AppResult};
use askbase_knowledge::{create_retriever, RetrievedDocument};
use clap::Args;

/// Query the knowledge base directly
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Search query
    pub query: String,

    /// Maximum number of excerpts (default: knowledge.top_k)
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");

        let mut config = config.clone();
        if let Some(top_k) = self.top_k {
            config.knowledge.top_k = top_k;
        }
        config.validate_knowledge()?;

        let retriever = create_retriever(&config.knowledge, config.resolve_retrieval_token()?)?;
        let documents = retriever
            .retrieve(&self.query, config.knowledge.top_k)
            .await?;

        if self.json {
            return super::print_json(&documents);
        }

        if documents.is_empty() {
            println!("No excerpts found.");
        }
        for (i, doc) in documents.iter().enumerate() {
            println!("{}", format_document(i + 1, doc));
        }

        Ok(())
    }
}

fn format_document(position: usize, doc: &RetrievedDocument) -> String {
    let header = match doc.score {
        Some(score) => format!("[{}] score {:.3}", position, score),
        None => format!("[{}]", position),
    };
    format!("{}\n{}\n", header, doc.content.trim_end())
}
