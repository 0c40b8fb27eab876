//! TOML-based configuration for deepresearch
//!
//! All runtime settings live in `deepresearch.toml`. The file is read once at
//! process start into a [`ResearchConfig`] which is then handed to the
//! components that need it; nothing reads configuration from globals.
//!
//! Secrets are never stored in the file. Sections reference the *name* of an
//! environment variable (`api_key_env`) and the value is resolved when the
//! pipeline is wired together.

use crate::research::model::{DeliveryMode, DEFAULT_SEARCH_COUNT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from deepresearch.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Language-model provider used by every agent
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub research: PipelineConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
    OpenAI {
        /// Environment variable containing API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_model")]
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of searches the planner must produce
    #[serde(default = "default_searches_per_plan")]
    pub searches_per_plan: usize,

    /// Hits requested from the search provider per query
    #[serde(default = "default_results_per_search")]
    pub results_per_search: usize,

    /// Upper bound on words kept from each search summary
    #[serde(default = "default_summary_word_limit")]
    pub summary_word_limit: usize,

    /// Optional cap on searches in flight; unset runs the whole plan at once
    #[serde(default)]
    pub max_concurrent_searches: Option<usize>,

    /// Optional overall deadline for a run, in seconds
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

fn default_searches_per_plan() -> usize {
    DEFAULT_SEARCH_COUNT
}

fn default_results_per_search() -> usize {
    5
}

fn default_summary_word_limit() -> usize {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            searches_per_plan: default_searches_per_plan(),
            results_per_search: default_results_per_search(),
            summary_word_limit: default_summary_word_limit(),
            max_concurrent_searches: None,
            run_timeout_secs: None,
        }
    }
}

// ============= Delivery Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Default delivery mode when a run does not ask for one
    #[serde(default)]
    pub mode: DeliveryMode,

    /// Resend-compatible email endpoint
    #[serde(default = "default_email_api_url")]
    pub api_url: String,

    /// Environment variable containing the email API key
    #[serde(default = "default_email_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Recipient address; when unset the `TO_EMAIL` environment variable is used
    #[serde(default)]
    pub to_email: Option<String>,
}

fn default_email_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_email_key_env() -> String {
    "RESEND_API_KEY".to_string()
}

fn default_from_email() -> String {
    "onboarding@resend.dev".to_string()
}

fn default_from_name() -> String {
    "Deep Research".to_string()
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::default(),
            api_url: default_email_api_url(),
            api_key_env: default_email_key_env(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            to_email: None,
        }
    }
}

impl DeliveryConfig {
    /// Recipient from the file, falling back to `TO_EMAIL`
    pub fn recipient(&self) -> Option<String> {
        self.to_email
            .clone()
            .or_else(|| std::env::var("TO_EMAIL").ok())
            .filter(|to| !to.trim().is_empty())
    }

    /// API key read from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

// ============= Output Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write the rendered HTML report to `directory` after each run
    #[serde(default = "default_true")]
    pub save_html: bool,

    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_html: true,
            directory: default_output_dir(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    MissingEmailCredentials,
    MissingRecipient,
    ConcurrencyAbovePlanSize,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl ResearchConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;

        Ok(config)
    }

    /// Load configuration, using defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ResearchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let research = &self.research;

        if research.searches_per_plan == 0 {
            return Err(ConfigError::ValidationError(
                "research.searches_per_plan must be at least 1".to_string(),
            ));
        }
        if research.results_per_search == 0 {
            return Err(ConfigError::ValidationError(
                "research.results_per_search must be at least 1".to_string(),
            ));
        }
        if research.summary_word_limit == 0 {
            return Err(ConfigError::ValidationError(
                "research.summary_word_limit must be at least 1".to_string(),
            ));
        }
        if research.max_concurrent_searches == Some(0) {
            return Err(ConfigError::ValidationError(
                "research.max_concurrent_searches must be at least 1 when set".to_string(),
            ));
        }
        if research.run_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "research.run_timeout_secs must be at least 1 when set".to_string(),
            ));
        }

        if let ProviderConfig::OpenAI { api_key_env, .. } = &self.provider {
            self.validate_env_var(api_key_env)?;
        }

        Ok(())
    }

    /// Validate and collect warnings for settings that will degrade a run
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();

        if self.delivery.mode == DeliveryMode::Send {
            if self.delivery.api_key().is_none() {
                warnings.push(ConfigWarning {
                    kind: ConfigWarningKind::MissingEmailCredentials,
                    message: format!(
                        "{} is not set; email delivery will fail and runs will report a failed delivery",
                        self.delivery.api_key_env
                    ),
                });
            }
            if self.delivery.recipient().is_none() {
                warnings.push(ConfigWarning {
                    kind: ConfigWarningKind::MissingRecipient,
                    message: "delivery.to_email and TO_EMAIL are unset; email delivery will fail"
                        .to_string(),
                });
            }
        }

        if let Some(cap) = self.research.max_concurrent_searches {
            if cap > self.research.searches_per_plan {
                warnings.push(ConfigWarning {
                    kind: ConfigWarningKind::ConcurrencyAbovePlanSize,
                    message: format!(
                        "research.max_concurrent_searches ({}) exceeds searches_per_plan ({}) and has no effect",
                        cap, self.research.searches_per_plan
                    ),
                });
            }
        }

        Ok(warnings)
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Overall run deadline, if one is configured
    pub fn run_timeout(&self) -> Option<std::time::Duration> {
        self.research
            .run_timeout_secs
            .map(std::time::Duration::from_secs)
    }
}
