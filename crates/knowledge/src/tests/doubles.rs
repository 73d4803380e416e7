//! Test doubles for the text-generation and retrieval collaborators.

use crate::retriever::Retriever;
use crate::types::RetrievedDocument;
use askbase_core::{AppError, AppResult};
use askbase_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&LlmRequest) -> Result<String, String> + Send + Sync>;

/// Replays canned completions and records every request.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    /// Answer requests with `outputs`, in call order.
    pub fn new<I, S>(outputs: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            script: Mutex::new(outputs.into_iter().map(|s| Ok(s.into())).collect()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request by inspecting it.
    pub fn responding<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&LlmRequest) -> Result<String, String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A client whose every call fails.
    pub fn failing(message: &str) -> Arc<Self> {
        let message = message.to_string();
        Self::responding(move |_| Err(message.clone()))
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Text of the (single) user turn of a request.
pub fn user_text(request: &LlmRequest) -> &str {
    request
        .messages
        .iter()
        .find(|m| m.role == askbase_llm::ChatRole::User)
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let output = match self.responder {
            Some(ref responder) => responder(request),
            None => self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".to_string())),
        };

        output
            .map(|content| LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
            .map_err(AppError::Generation)
    }
}

/// Serves canned documents per query and records every call.
#[derive(Default)]
pub struct StaticRetriever {
    documents: HashMap<String, Vec<RetrievedDocument>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(mut self, query: &str, contents: &[&str]) -> Self {
        self.documents.insert(
            query.to_string(),
            contents.iter().map(|c| RetrievedDocument::new(*c)).collect(),
        );
        self
    }

    pub fn with_scored(mut self, query: &str, docs: Vec<RetrievedDocument>) -> Self {
        self.documents.insert(query.to_string(), docs);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    fn backend_name(&self) -> &str {
        "static"
    }

    async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<RetrievedDocument>> {
        self.calls.lock().unwrap().push((query.to_string(), top_k));

        if self.failing.contains(query) {
            return Err(AppError::Retrieval(format!("backend unavailable for '{query}'")));
        }

        let mut docs = self.documents.get(query).cloned().unwrap_or_default();
        docs.truncate(top_k);
        Ok(docs)
    }
}
