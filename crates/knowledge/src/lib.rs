//! Knowledge-base retrieval and the retrieval-augmented answering pipeline.
//!
//! A question is expanded into several search queries, each query is sent
//! to the knowledge base, the merged excerpts are optionally judged for
//! relevance, and a final answer is generated from what remains.

pub mod rag;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

pub use rag::{
    AnswerGenerator, ExpandedQuerySet, KeywordRewriter, PipelineOptions, QueryExpander,
    RagPipeline, RagResponse, RelevanceFilter, RelevanceJudgment,
};
pub use retriever::{create_retriever, HttpRetriever, Retriever};
pub use types::RetrievedDocument;
