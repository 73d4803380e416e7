//! Query expansion.
//!
//! The model is asked for a JSON object of alternative queries
//! (`{"query_1": "...", ...}`). Its assistant turn is usually pre-seeded with
//! `{`, so the seed and the continuation are joined before parsing.

use crate::rag::types::{ExpandedQuerySet, ORIGINAL_QUERY_KEY};
use crate::rag::{bindings, Stage};
use askbase_core::{AppError, AppResult};
use askbase_llm::{LlmClient, StageSettings};
use askbase_prompt::{ExpansionPrompt, KeywordPrompt};
use serde_json::Value;
use std::sync::Arc;

/// Generates `n_queries` reformulations of a question.
#[derive(Clone)]
pub struct QueryExpander {
    stage: Stage,
}

impl QueryExpander {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        settings: StageSettings,
        prompt: &ExpansionPrompt,
    ) -> AppResult<Self> {
        Ok(Self {
            stage: Stage::new(client, model, settings, prompt.template()?),
        })
    }

    /// Expand `question` into `n_queries` reformulations plus `query_0`.
    ///
    /// # Errors
    /// `AppError::MalformedExpansion` when the output is not a JSON object of
    /// exactly `n_queries` non-empty strings. No partial set is returned.
    pub async fn expand(
        &self,
        question: &str,
        n_queries: usize,
        output_format: &str,
    ) -> AppResult<ExpandedQuerySet> {
        let prompt = self.stage.prompt(bindings([
            ("question", question.to_string()),
            ("n_queries", n_queries.to_string()),
            ("output_format", output_format.to_string()),
        ]))?;

        let raw = self.stage.generate(prompt).await?;
        tracing::debug!("Expansion output: {}", raw);

        let queries = parse_expansion(question, &raw, n_queries)?;
        tracing::info!(queries = queries.len(), "Expanded question");
        Ok(queries)
    }
}

/// Parse expansion output into a query set headed by `question`.
pub fn parse_expansion(question: &str, raw: &str, n_queries: usize) -> AppResult<ExpandedQuerySet> {
    let value = first_json_value(raw)
        .ok_or_else(|| AppError::malformed_expansion("output is not valid JSON", raw))?;

    let Value::Object(map) = value else {
        return Err(AppError::malformed_expansion(
            "expected a JSON object of queries",
            raw,
        ));
    };

    let mut entries: Vec<(String, String)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        if key == ORIGINAL_QUERY_KEY {
            continue;
        }
        match value {
            Value::String(query) if !query.trim().is_empty() => {
                entries.push((key, query.trim().to_string()))
            }
            _ => {
                return Err(AppError::malformed_expansion(
                    format!("'{key}' is not a non-empty string"),
                    raw,
                ))
            }
        }
    }

    if entries.len() != n_queries {
        return Err(AppError::malformed_expansion(
            format!("expected {} queries, got {}", n_queries, entries.len()),
            raw,
        ));
    }

    entries.sort_by(|(a, _), (b, _)| query_index(a).cmp(&query_index(b)).then_with(|| a.cmp(b)));

    let mut set = ExpandedQuerySet::new(question);
    for (key, query) in entries {
        set.push(key, query);
    }
    Ok(set)
}

/// Decode the first JSON value in `raw`, ignoring anything after it.
fn first_json_value(raw: &str) -> Option<Value> {
    let mut text = raw.trim_start();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start_matches("json").trim_start();
    }

    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()?
        .ok()
}

/// Numeric suffix of `query_N`; other keys sort last.
fn query_index(key: &str) -> u64 {
    key.rsplit('_')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}

/// Rewrites a question as a compact keyword query.
#[derive(Clone)]
pub struct KeywordRewriter {
    stage: Stage,
}

impl KeywordRewriter {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        settings: StageSettings,
        prompt: &KeywordPrompt,
    ) -> AppResult<Self> {
        Ok(Self {
            stage: Stage::new(client, model, settings, prompt.template()?),
        })
    }

    /// Returns `query_0` (the question) and `query_1` (the keywords).
    pub async fn rewrite(&self, question: &str) -> AppResult<ExpandedQuerySet> {
        let prompt = self
            .stage
            .prompt(bindings([("question", question.to_string())]))?;
        let raw = self.stage.generate(prompt).await?;

        let keywords = raw.trim();
        if keywords.is_empty() {
            return Err(AppError::malformed_expansion(
                "empty keyword query",
                raw.as_str(),
            ));
        }

        tracing::info!("Keyword query: {}", keywords);

        let mut set = ExpandedQuerySet::new(question);
        set.push("query_1", keywords);
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTION: &str = "What regions does the service support?";

    #[test]
    fn test_parse_seeded_output() {
        let raw = "{\"query_1\": \"region support\", \"query_2\": \"supported regions\", \"query_3\": \"available regions\"}";
        let set = parse_expansion(QUESTION, raw, 3).unwrap();

        assert_eq!(set.len(), 4);
        assert_eq!(set.get("query_0"), Some(QUESTION));
        assert_eq!(set.get("query_3"), Some("available regions"));
    }

    #[test]
    fn test_parse_orders_by_numeric_suffix() {
        let raw = r#"{"query_10": "j", "query_2": "b", "query_1": "a", "query_3": "c",
            "query_4": "d", "query_5": "e", "query_6": "f", "query_7": "g", "query_8": "h", "query_9": "i"}"#;
        let set = parse_expansion("q", raw, 10).unwrap();
        let keys: Vec<&str> = set.keys().collect();
        assert_eq!(keys[1], "query_1");
        assert_eq!(keys[2], "query_2");
        assert_eq!(keys[10], "query_10");
    }

    #[test]
    fn test_parse_ignores_trailing_text() {
        let raw = "{\"query_1\": \"a\"}\nThese queries cover the main intent.";
        let set = parse_expansion("q", raw, 1).unwrap();
        assert_eq!(set.get("query_1"), Some("a"));
    }

    #[test]
    fn test_parse_accepts_code_fence() {
        let raw = "```json\n{\"query_1\": \"a\", \"query_2\": \"b\"}\n```";
        assert_eq!(parse_expansion("q", raw, 2).unwrap().len(), 3);
    }

    #[test]
    fn test_model_query_0_is_replaced_by_question() {
        let raw = r#"{"query_0": "something else", "query_1": "a"}"#;
        let set = parse_expansion("original", raw, 1).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.original(), "original");
    }

    #[test]
    fn test_malformed_outputs() {
        let cases = [
            "region support, supported regions",
            "{\"query_1\": \"a\", ",
            "[\"a\", \"b\"]",
            "{\"query_1\": 3}",
            "{\"query_1\": \"  \"}",
            "{\"query_1\": \"a\"}",
            "{\"query_1\": \"a\", \"query_2\": \"b\", \"query_3\": \"c\"}",
            "",
        ];

        for raw in cases {
            match parse_expansion("q", raw, 2) {
                Err(AppError::MalformedExpansion { raw: kept, .. }) => assert_eq!(kept, raw),
                other => panic!("expected malformed expansion for {raw:?}, got {other:?}"),
            }
        }
    }
}
