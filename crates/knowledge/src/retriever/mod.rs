//! Retrieval collaborator trait and factory.

pub mod http;

pub use http::HttpRetriever;

use crate::types::RetrievedDocument;
use askbase_core::config::KnowledgeConfig;
use askbase_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// A knowledge base that returns excerpts for a free-text query.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Get backend name (e.g., "http")
    fn backend_name(&self) -> &str;

    /// Retrieve up to `top_k` excerpts for `query`.
    ///
    /// An empty result is `Ok(vec![])`, never an error.
    async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievedDocument>>;
}

/// Create a retriever for the configured backend.
pub fn create_retriever(
    config: &KnowledgeConfig,
    bearer_token: Option<String>,
) -> AppResult<Arc<dyn Retriever>> {
    match config.backend.as_str() {
        "http" => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                AppError::Config("knowledge.endpoint is required for the http backend".to_string())
            })?;
            let knowledge_base_id = config.knowledge_base_id.as_deref().ok_or_else(|| {
                AppError::Config("knowledge.knowledge_base_id is required".to_string())
            })?;

            let retriever = HttpRetriever::new(
                endpoint,
                knowledge_base_id,
                Duration::from_secs(config.timeout_secs),
                bearer_token,
            )?
            .with_search_type(config.search_type);

            Ok(Arc::new(retriever))
        }

        other => Err(AppError::Config(format!(
            "Unknown knowledge backend: '{}'. Supported backends: http",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> KnowledgeConfig {
        KnowledgeConfig {
            knowledge_base_id: Some("KB123".to_string()),
            endpoint: Some("http://localhost:9000".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_http_retriever() {
        let retriever = create_retriever(&config(), None).unwrap();
        assert_eq!(retriever.backend_name(), "http");
    }

    #[test]
    fn test_missing_endpoint() {
        let mut config = config();
        config.endpoint = None;
        assert!(matches!(
            create_retriever(&config, None),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_backend() {
        let mut config = config();
        config.backend = "sqlite".to_string();
        match create_retriever(&config, None) {
            Err(AppError::Config(msg)) => assert!(msg.contains("sqlite")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected error for unknown backend"),
        }
    }
}
