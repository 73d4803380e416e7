//! Prompt settings read from `prompt_template.yaml`.

use crate::template::PromptTemplate;
use askbase_core::AppResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholders the query-expansion template may use.
pub const EXPANSION_PLACEHOLDERS: &[&str] = &["question", "n_queries", "output_format"];

/// Placeholders the answer template may use.
pub const ANSWER_PLACEHOLDERS: &[&str] = &["context", "question"];

/// Placeholders the relevance-filter template may use.
pub const FILTER_PLACEHOLDERS: &[&str] = &["question", "document", "output_format"];

/// Placeholders the keyword-rewrite template may use.
pub const KEYWORD_PLACEHOLDERS: &[&str] = &["question"];

/// All prompt templates used by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptSettings {
    pub query_expansion: ExpansionPrompt,

    pub answer: AnswerPrompt,

    /// Required only when relevance filtering is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_filter: Option<FilterPrompt>,

    /// Required only in keyword expansion mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_rewrite: Option<KeywordPrompt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpansionPrompt {
    pub template: String,

    /// Number of alternative queries to request
    pub n_queries: usize,

    /// Description of the structured reply, bound as `output_format`
    pub output_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerPrompt {
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterPrompt {
    pub template: String,

    /// Description of the expected label, bound as `output_format`
    pub output_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordPrompt {
    pub template: String,
}

impl ExpansionPrompt {
    pub fn template(&self) -> AppResult<PromptTemplate> {
        PromptTemplate::new("query_expansion", self.template.as_str())
    }
}

impl AnswerPrompt {
    pub fn template(&self) -> AppResult<PromptTemplate> {
        PromptTemplate::new("answer", self.template.as_str())
    }
}

impl FilterPrompt {
    pub fn template(&self) -> AppResult<PromptTemplate> {
        PromptTemplate::new("relevance_filter", self.template.as_str())
    }
}

impl KeywordPrompt {
    pub fn template(&self) -> AppResult<PromptTemplate> {
        PromptTemplate::new("keyword_rewrite", self.template.as_str())
    }
}

/// A rendered prompt ready to be turned into a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// Rendered user message
    pub user: String,

    /// Partial assistant turn the model continues from
    #[serde(rename = "assistantSeed", skip_serializing_if = "Option::is_none")]
    pub assistant_seed: Option<String>,

    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Name of the template that was rendered
    #[serde(rename = "templateName")]
    pub template_name: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_deserialization() {
        let yaml = r#"
query_expansion:
  template: "Rewrite {{question}} into {{n_queries}} queries. {{output_format}}"
  n_queries: 3
  output_format: '{"query_1": "...", "query_2": "...", "query_3": "..."}'
answer:
  template: "<context>{{context}}</context><question>{{question}}</question>"
"#;
        let settings: PromptSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.query_expansion.n_queries, 3);
        assert!(settings.relevance_filter.is_none());
        assert!(settings.keyword_rewrite.is_none());
        assert_eq!(
            settings.answer.template().unwrap().placeholders(),
            vec!["context", "question"]
        );
    }

    #[test]
    fn test_missing_n_queries_rejected() {
        let yaml = r#"
query_expansion:
  template: "{{question}}"
  output_format: "json"
answer:
  template: "{{context}}"
"#;
        let err = serde_yaml::from_str::<PromptSettings>(yaml).unwrap_err();
        assert!(err.to_string().contains("n_queries"));
    }

    #[test]
    fn test_built_prompt_serializes_seed() {
        let built = BuiltPrompt {
            system: None,
            user: "u".to_string(),
            assistant_seed: Some("{".to_string()),
            metadata: BuiltPromptMetadata {
                template_name: "query_expansion".to_string(),
                resolved_variables: HashMap::new(),
            },
        };
        let json = serde_json::to_value(&built).unwrap();
        assert_eq!(json["assistantSeed"], "{");
        assert_eq!(json["metadata"]["templateName"], "query_expansion");
    }
}
