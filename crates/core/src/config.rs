//! Configuration management for Askbase.
//!
//! Application settings are merged from several sources, lowest precedence first:
//! - Built-in defaults
//! - The workspace config file (`.askbase/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The model settings (`config_llm.yaml`) and prompt templates
//! (`prompt_template.yaml`) live next to `config.yaml` and are loaded by the
//! `askbase-llm` and `askbase-prompt` crates; this module only resolves their paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".askbase";

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["ollama", "claude", "bedrock"];

/// Retrieval backends the knowledge factory knows how to build.
pub const KNOWN_BACKENDS: [&str; 1] = ["http"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .askbase/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Model identifier override (replaces `model_id` from config_llm.yaml)
    pub model: Option<String>,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Text-generation service connection
    pub llm: LlmConnectionConfig,

    /// Retrieval service connection
    pub knowledge: KnowledgeConfig,

    /// Pipeline behaviour
    pub pipeline: PipelineConfig,

    /// Locations of the model settings and prompt template files
    pub files: ConfigFiles,
}

/// Connection settings for the text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConnectionConfig {
    /// Provider name ("ollama", "claude", "bedrock")
    pub provider: String,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Cloud region (Bedrock)
    pub region: Option<String>,

    /// Named credentials profile (Bedrock)
    pub profile: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConnectionConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(), // Local-first default
            endpoint: None,
            api_key_env: None,
            region: None,
            profile: None,
            timeout_secs: 120,
        }
    }
}

/// Search mode override passed to the retrieval service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Hybrid,
    Semantic,
}

impl SearchType {
    /// Wire name used by the retrieval API.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SearchType::Hybrid => "HYBRID",
            SearchType::Semantic => "SEMANTIC",
        }
    }
}

/// Connection settings for the managed knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Retrieval backend ("http")
    pub backend: String,

    /// Knowledge base identifier
    pub knowledge_base_id: Option<String>,

    /// Base URL of the retrieval API
    pub endpoint: Option<String>,

    /// Environment variable holding a bearer token for the retrieval API
    pub api_key_env: Option<String>,

    /// Number of results requested per query
    pub top_k: usize,

    /// Optional search mode override
    pub search_type: Option<SearchType>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            knowledge_base_id: None,
            endpoint: None,
            api_key_env: None,
            top_k: 10,
            search_type: None,
            timeout_secs: 60,
        }
    }
}

/// What to do when a retrieval call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalErrorPolicy {
    /// Abort the run
    #[default]
    Fail,
    /// Log and continue with zero documents for that query
    Empty,
}

/// How the question is turned into search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionMode {
    /// N alternative queries as a JSON object
    #[default]
    Structured,
    /// One plain-text keyword query
    Keywords,
}

/// Pipeline behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Question used when none is given on the command line
    pub question: Option<String>,

    /// Judge every retrieved excerpt before answering
    pub relevance_filter: bool,

    /// Maximum concurrent retrieval requests during fan-out
    pub max_concurrency: usize,

    /// Retrieval failure handling
    pub on_retrieval_error: RetrievalErrorPolicy,

    /// Separator placed between excerpts in the answer context
    pub context_delimiter: String,

    /// Query expansion mode
    pub expansion: ExpansionMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            question: None,
            relevance_filter: false,
            max_concurrency: 4,
            on_retrieval_error: RetrievalErrorPolicy::Fail,
            context_delimiter: "\n\n".to_string(),
            expansion: ExpansionMode::Structured,
        }
    }
}

/// Paths of the model settings and prompt template files.
///
/// Relative paths are resolved against the `.askbase/` directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFiles {
    pub llm: PathBuf,
    pub prompts: PathBuf,
}

impl Default for ConfigFiles {
    fn default() -> Self {
        Self {
            llm: PathBuf::from("config_llm.yaml"),
            prompts: PathBuf::from("prompt_template.yaml"),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    llm: Option<LlmConnectionConfig>,
    knowledge: Option<KnowledgeConfig>,
    pipeline: Option<PipelineConfig>,
    files: Option<ConfigFiles>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            model: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmConnectionConfig::default(),
            knowledge: KnowledgeConfig::default(),
            pipeline: PipelineConfig::default(),
            files: ConfigFiles::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `ASKBASE_WORKSPACE`: Override workspace path
    /// - `ASKBASE_CONFIG`: Path to config file
    /// - `ASKBASE_PROVIDER`: LLM provider
    /// - `ASKBASE_MODEL`: Model identifier override
    /// - `ASKBASE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use askbase_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// (e.g. from the command line) wins over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let workspace =
            workspace.or_else(|| std::env::var("ASKBASE_WORKSPACE").ok().map(PathBuf::from));
        let config_file =
            config_file.or_else(|| std::env::var("ASKBASE_CONFIG").ok().map(PathBuf::from));

        let mut config = Self::load_from(workspace, config_file)?;

        if let Ok(provider) = std::env::var("ASKBASE_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("ASKBASE_MODEL") {
            config.model = Some(model);
        }

        config.api_key = std::env::var("ASKBASE_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Load configuration from an explicit workspace and config file, without
    /// consulting the environment.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.config_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        if let Some(knowledge) = config_file.knowledge {
            result.knowledge = knowledge;
        }

        if let Some(pipeline) = config_file.pipeline {
            result.pipeline = pipeline;
        }

        if let Some(files) = config_file.files {
            result.files = files;
        }

        tracing::debug!("Merged config file {:?}", path);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.model = Some(model);
        }

        if verbose {
            self.verbose = true;
        }

        // An explicit --log-level wins; --verbose beats any file or env level
        match log_level {
            Some(log_level) => self.log_level = Some(log_level),
            None if verbose => self.log_level = Some("debug".to_string()),
            None => {}
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .askbase directory.
    pub fn config_dir(&self) -> PathBuf {
        self.workspace.join(CONFIG_DIR)
    }

    /// Resolved path of the model settings file.
    pub fn llm_settings_path(&self) -> PathBuf {
        self.resolve_file(&self.files.llm)
    }

    /// Resolved path of the prompt template file.
    pub fn prompt_settings_path(&self) -> PathBuf {
        self.resolve_file(&self.files.prompts)
    }

    fn resolve_file(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir().join(path)
        }
    }

    /// Resolve the LLM API key.
    ///
    /// `ASKBASE_API_KEY` wins, then the variable named by `llm.api_key_env`,
    /// then `ANTHROPIC_API_KEY` for the claude provider.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match (&self.llm.api_key_env, self.llm.provider.as_str()) {
            (Some(var), _) => Some(var.as_str()),
            (None, "claude") => Some("ANTHROPIC_API_KEY"),
            _ => None,
        };

        env_var.and_then(|var| std::env::var(var).ok())
    }

    /// Resolve the bearer token for the retrieval API, if one is configured.
    pub fn resolve_retrieval_token(&self) -> AppResult<Option<String>> {
        match self.knowledge.api_key_env {
            Some(ref var) => std::env::var(var).map(Some).map_err(|_| {
                AppError::Config(format!(
                    "Retrieval token not found in environment variable: {}",
                    var
                ))
            }),
            None => Ok(None),
        }
    }

    /// Validate the settings that are needed before any client is built.
    pub fn validate(&self) -> AppResult<()> {
        self.validate_llm()?;
        self.validate_knowledge()?;

        if self.pipeline.max_concurrency == 0 {
            return Err(AppError::Config(
                "pipeline.max_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the text-generation connection settings.
    pub fn validate_llm(&self) -> AppResult<()> {
        let provider = self.llm.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "claude" && self.resolve_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found: set ASKBASE_API_KEY or {}",
                self.llm.api_key_env.as_deref().unwrap_or("ANTHROPIC_API_KEY")
            )));
        }

        Ok(())
    }

    /// Validate the retrieval backend settings.
    pub fn validate_knowledge(&self) -> AppResult<()> {
        let backend = self.knowledge.backend.as_str();
        if !KNOWN_BACKENDS.contains(&backend) {
            return Err(AppError::Config(format!(
                "Unknown knowledge backend: {}. Supported: {}",
                backend,
                KNOWN_BACKENDS.join(", ")
            )));
        }

        match self.knowledge.knowledge_base_id.as_deref() {
            Some(id) if !id.trim().is_empty() => {}
            _ => {
                return Err(AppError::Config(
                    "knowledge.knowledge_base_id is required".to_string(),
                ))
            }
        }

        if backend == "http" && self.knowledge.endpoint.is_none() {
            return Err(AppError::Config(
                "knowledge.endpoint is required for the http backend".to_string(),
            ));
        }

        if self.knowledge.top_k == 0 {
            return Err(AppError::Config(
                "knowledge.top_k must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace_with_config(yaml: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yaml"), yaml).unwrap();
        temp
    }

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.knowledge.knowledge_base_id = Some("KB123".to_string());
        config.knowledge.endpoint = Some("http://localhost:9000".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.knowledge.top_k, 10);
        assert_eq!(config.pipeline.max_concurrency, 4);
        assert!(!config.pipeline.relevance_filter);
        assert_eq!(config.pipeline.on_retrieval_error, RetrievalErrorPolicy::Fail);
        assert!(!config.verbose);
    }

    #[test]
    fn test_load_from_merges_yaml() {
        let temp = workspace_with_config(
            r#"
llm:
  provider: claude
  api_key_env: MY_KEY
knowledge:
  knowledge_base_id: APNZCYJTKD
  endpoint: http://kb.local
  top_k: 5
  search_type: hybrid
pipeline:
  relevance_filter: true
  expansion: keywords
  on_retrieval_error: empty
logging:
  level: debug
  color: false
"#,
        );

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.llm.provider, "claude");
        assert_eq!(config.llm.api_key_env.as_deref(), Some("MY_KEY"));
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.knowledge.knowledge_base_id.as_deref(), Some("APNZCYJTKD"));
        assert_eq!(config.knowledge.top_k, 5);
        assert_eq!(config.knowledge.search_type, Some(SearchType::Hybrid));
        assert!(config.pipeline.relevance_filter);
        assert_eq!(config.pipeline.expansion, ExpansionMode::Keywords);
        assert_eq!(config.pipeline.on_retrieval_error, RetrievalErrorPolicy::Empty);
        assert_eq!(config.pipeline.context_delimiter, "\n\n");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.no_color);
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let temp = workspace_with_config("retriever:\n  top_k: 3\n");
        let result = AppConfig::load_from(Some(temp.path().to_path_buf()), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_explicit_missing_config_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_from(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_settings_paths_resolve_against_config_dir() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/work");
        assert_eq!(
            config.llm_settings_path(),
            PathBuf::from("/work/.askbase/config_llm.yaml")
        );

        config.files.prompts = PathBuf::from("/etc/askbase/prompts.yaml");
        assert_eq!(
            config.prompt_settings_path(),
            PathBuf::from("/etc/askbase/prompts.yaml")
        );
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("bedrock".to_string()),
            Some("anthropic.claude-3-haiku-20240307-v1:0".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "bedrock");
        assert_eq!(
            overridden.model.as_deref(),
            Some("anthropic.claude-3-haiku-20240307-v1:0")
        );
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_verbose_overrides_file_log_level() {
        let temp = workspace_with_config("logging:\n  level: warn\n");
        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("warn"));

        let verbose = config
            .clone()
            .with_overrides(None, None, None, None, None, true, false);
        assert_eq!(verbose.log_level.as_deref(), Some("debug"));

        let explicit =
            config.with_overrides(None, None, None, None, Some("trace".to_string()), true, false);
        assert_eq!(explicit.log_level.as_deref(), Some("trace"));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = valid_config();
        config.llm.provider = "unknown".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_requires_knowledge_base_id() {
        let mut config = valid_config();
        config.knowledge.knowledge_base_id = Some("  ".to_string());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut config = valid_config();
        config.knowledge.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.pipeline.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = valid_config();
        config.llm.provider = "claude".to_string();
        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_search_type_wire_names() {
        assert_eq!(SearchType::Hybrid.as_api_str(), "HYBRID");
        assert_eq!(SearchType::Semantic.as_api_str(), "SEMANTIC");
    }

    #[test]
    fn test_sample_workspace_config_parses() {
        let sample: ConfigFile =
            serde_yaml::from_str(include_str!("../../../.askbase/config.yaml")).unwrap();
        let knowledge = sample.knowledge.unwrap();
        assert_eq!(knowledge.knowledge_base_id.as_deref(), Some("APNZCYJTKD"));
        assert_eq!(sample.pipeline.unwrap().context_delimiter, "\n\n");
    }
}
