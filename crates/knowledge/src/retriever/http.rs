//! HTTP retrieval backend.
//!
//! Speaks the managed knowledge-base `Retrieve` contract:
//! `POST {endpoint}/knowledgebases/{id}/retrieve`.

use crate::retriever::Retriever;
use crate::types::RetrievedDocument;
use askbase_core::config::SearchType;
use askbase_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    retrieval_query: RetrievalQuery<'a>,
    retrieval_configuration: RetrievalConfiguration,
}

#[derive(Debug, Serialize)]
struct RetrievalQuery<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    override_search_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    content: ResultContent,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    location: Option<serde_json::Value>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ResultContent {
    text: String,
}

impl From<RetrievalResult> for RetrievedDocument {
    fn from(result: RetrievalResult) -> Self {
        Self {
            content: result.content.text,
            score: result.score,
            location: result.location,
            metadata: result.metadata,
        }
    }
}

/// Knowledge-base client over HTTP.
pub struct HttpRetriever {
    endpoint: String,
    knowledge_base_id: String,
    search_type: Option<SearchType>,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl HttpRetriever {
    /// Create a retriever for one knowledge base.
    pub fn new(
        endpoint: impl Into<String>,
        knowledge_base_id: impl Into<String>,
        timeout: Duration,
        bearer_token: Option<String>,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            knowledge_base_id: knowledge_base_id.into(),
            search_type: None,
            bearer_token,
            client,
        })
    }

    /// Override the backend's search mode.
    pub fn with_search_type(mut self, search_type: Option<SearchType>) -> Self {
        self.search_type = search_type;
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/knowledgebases/{}/retrieve",
            self.endpoint, self.knowledge_base_id
        )
    }

    fn to_request<'a>(&self, query: &'a str, top_k: usize) -> RetrieveRequest<'a> {
        RetrieveRequest {
            retrieval_query: RetrievalQuery { text: query },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: top_k,
                    override_search_type: self.search_type.map(|s| s.as_api_str()),
                },
            },
        }
    }
}

#[async_trait::async_trait]
impl Retriever for HttpRetriever {
    fn backend_name(&self) -> &str {
        "http"
    }

    async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievedDocument>> {
        tracing::debug!(
            knowledge_base = %self.knowledge_base_id,
            top_k,
            "Retrieving excerpts for: {}",
            query
        );

        let mut builder = self.client.post(self.url()).json(&self.to_request(query, top_k));
        if let Some(ref token) = self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            AppError::Retrieval(format!("Failed to reach knowledge base: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Knowledge base API error ({}): {}",
                status, error_text
            )));
        }

        let body: RetrieveResponse = response.json().await.map_err(|e| {
            AppError::Retrieval(format!("Failed to parse retrieval response: {}", e))
        })?;

        let documents: Vec<RetrievedDocument> = body
            .retrieval_results
            .into_iter()
            .map(RetrievedDocument::from)
            .collect();

        tracing::debug!("Retrieved {} excerpts", documents.len());

        Ok(documents)
    }
}
