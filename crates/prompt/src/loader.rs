//! Loader for `prompt_template.yaml`.

use crate::template::PromptTemplate;
use crate::types::{
    PromptSettings, ANSWER_PLACEHOLDERS, EXPANSION_PLACEHOLDERS, FILTER_PLACEHOLDERS,
    KEYWORD_PLACEHOLDERS,
};
use askbase_core::{AppError, AppResult};
use std::path::Path;

impl PromptSettings {
    /// Load and validate prompt settings from a YAML file.
    ///
    /// # Errors
    /// `AppError::Config` when the file is missing, unparsable, lacks a required
    /// key, or a template uses a placeholder its stage never binds.
    ///
    /// # Example
    /// ```no_run
    /// use askbase_prompt::PromptSettings;
    /// use std::path::Path;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let settings = PromptSettings::load(Path::new(".askbase/prompt_template.yaml"))?;
    /// println!("{} expanded queries", settings.query_expansion.n_queries);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: &Path) -> AppResult<Self> {
        tracing::debug!("Loading prompt settings from: {:?}", path);

        if !path.exists() {
            return Err(AppError::Config(format!(
                "Prompt template file not found: {:?}",
                path
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read prompt file {:?}: {}", path, e))
        })?;

        let settings = Self::from_yaml(&contents)
            .map_err(|e| AppError::Config(format!("Invalid prompt file {:?}: {}", path, e)))?;

        tracing::info!(
            n_queries = settings.query_expansion.n_queries,
            relevance_filter = settings.relevance_filter.is_some(),
            keyword_rewrite = settings.keyword_rewrite.is_some(),
            "Loaded prompt settings"
        );

        Ok(settings)
    }

    /// Parse and validate settings from a YAML string.
    pub fn from_yaml(contents: &str) -> Result<Self, String> {
        let settings: Self = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), String> {
        if self.query_expansion.n_queries == 0 {
            return Err("query_expansion.n_queries must be at least 1".to_string());
        }

        check_stage(
            "query_expansion",
            &self.query_expansion.template,
            EXPANSION_PLACEHOLDERS,
        )?;
        check_stage("answer", &self.answer.template, ANSWER_PLACEHOLDERS)?;

        if let Some(filter) = &self.relevance_filter {
            check_stage("relevance_filter", &filter.template, FILTER_PLACEHOLDERS)?;
        }
        if let Some(keywords) = &self.keyword_rewrite {
            check_stage("keyword_rewrite", &keywords.template, KEYWORD_PLACEHOLDERS)?;
        }

        Ok(())
    }
}

/// Load prompt settings from a YAML file.
pub fn load_prompt_settings(path: &Path) -> AppResult<PromptSettings> {
    PromptSettings::load(path)
}

fn check_stage(stage: &str, body: &str, allowed: &[&str]) -> Result<(), String> {
    if body.trim().is_empty() {
        return Err(format!("{stage}.template cannot be empty"));
    }

    let template = PromptTemplate::new(stage, body).map_err(|e| e.to_string())?;
    let unknown: Vec<String> = template
        .placeholders()
        .into_iter()
        .filter(|name| !allowed.contains(&name.as_str()))
        .collect();

    if !unknown.is_empty() {
        return Err(format!(
            "{stage}.template uses unknown placeholder(s): {} (available: {})",
            unknown.join(", "),
            allowed.join(", ")
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const VALID: &str = r#"
query_expansion:
  template: |
    Generate {{n_queries}} search queries for the question below.
    Reply only in this format: {{output_format}}
    <question>{{question}}</question>
  n_queries: 3
  output_format: '{"query_1": "...", "query_2": "...", "query_3": "..."}'
answer:
  template: |
    <context>{{context}}</context>
    <question>{{question}}</question>
relevance_filter:
  template: "{{question}} / {{document}} / {{output_format}}"
  output_format: "relevant or not_relevant"
"#;

    fn write(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("prompt_template.yaml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_settings() {
        let dir = TempDir::new().unwrap();
        let settings = PromptSettings::load(&write(&dir, VALID)).unwrap();
        assert_eq!(settings.query_expansion.n_queries, 3);
        assert!(settings.relevance_filter.is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_prompt_settings(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_answer_section() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "query_expansion:\n  template: \"{{question}}\"\n  n_queries: 2\n  output_format: json\n",
        );
        match PromptSettings::load(&path) {
            Err(AppError::Config(msg)) => assert!(msg.contains("answer")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let yaml = VALID.replace("<context>{{context}}</context>", "{{documents}}");
        let err = PromptSettings::from_yaml(&yaml).unwrap_err();
        assert!(err.contains("documents"));
        assert!(err.contains("answer"));
    }

    #[test]
    fn test_zero_queries_rejected() {
        let yaml = VALID.replace("n_queries: 3", "n_queries: 0");
        let err = PromptSettings::from_yaml(&yaml).unwrap_err();
        assert!(err.contains("n_queries"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = format!("{VALID}\nextra_stage:\n  template: x\n");
        assert!(PromptSettings::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_sample_prompts_parse() {
        let settings =
            PromptSettings::from_yaml(include_str!("../../../.askbase/prompt_template.yaml"))
                .unwrap();
        assert_eq!(settings.query_expansion.n_queries, 3);
        assert!(settings.keyword_rewrite.is_some());
    }
}
