//! Configuration loading and validation.
//!
//! Loads the run configuration from `./config.yaml` (or `$CONFIG_PATH`, or an
//! explicit `--config` path). Environment variables override file values;
//! file values override defaults.
//!
//! Precedence: env vars > config file > defaults. CLI flags are applied on
//! top by the binary.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::providers::{CompletionParams, TokenLimitKey};

/// Config file used when neither `--config` nor `$CONFIG_PATH` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Errors raised while loading or validating configuration. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error(
        "configuration file '{}' not found; create config.yaml or set CONFIG_PATH",
        path.display()
    )]
    NotFound {
        /// Resolved config path.
        path: PathBuf,
    },
    /// The config file could not be read.
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        /// Resolved config path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config is not valid YAML for [`Config`].
    #[error("failed to parse config from {origin}: {source}")]
    Parse {
        /// Where the YAML came from.
        origin: String,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// A value is present but unusable.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted config key.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

// ── Secrets ─────────────────────────────────────────────────────

/// An API key. Never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("__REDACTED__")
    }
}

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend name: `azure_openai`, `openai`, `gemini`, `anthropic` or `groq`.
    pub llm_provider: String,
    /// Sampling parameters applied to every call.
    pub model_params: ModelParams,
    /// Azure OpenAI settings (legacy key `azure` accepted).
    #[serde(alias = "azure")]
    pub azure_openai: AzureOpenAiConfig,
    /// OpenAI settings.
    pub openai: OpenAiConfig,
    /// Gemini settings.
    pub gemini: GeminiConfig,
    /// Anthropic settings.
    pub anthropic: AnthropicConfig,
    /// Groq settings.
    pub groq: GroqConfig,
    /// Maximum personas processed at once by batch engines.
    pub concurrent_limit: usize,
    /// Survey run settings.
    pub survey: SurveyConfig,
    /// Interview run settings.
    pub interview: InterviewConfig,
    /// A/B test run settings.
    pub ab_test: AbTestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_provider: "azure_openai".to_owned(),
            model_params: ModelParams::default(),
            azure_openai: AzureOpenAiConfig::default(),
            openai: OpenAiConfig::default(),
            gemini: GeminiConfig::default(),
            anthropic: AnthropicConfig::default(),
            groq: GroqConfig::default(),
            concurrent_limit: 10,
            survey: SurveyConfig::default(),
            interview: InterviewConfig::default(),
            ab_test: AbTestConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with precedence: env vars > YAML file > defaults.
    ///
    /// The file path is `explicit`, else `$CONFIG_PATH`, else `./config.yaml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist, and
    /// `Read`/`Parse`/`Invalid` for unreadable, malformed or invalid content.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = config_path_with(explicit, |key| std::env::var(key).ok());
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file only, no env overrides.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loading config from file");
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }

    /// Parse a YAML string into config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit; treat it as all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            origin: "inline YAML".to_owned(),
            source,
        })
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("LLM_PROVIDER") {
            self.llm_provider = v;
        }

        // Azure OpenAI.
        if let Some(v) = env("AZURE_OPENAI_ENDPOINT") {
            self.azure_openai.endpoint = Some(v);
        }
        if let Some(v) = env("AZURE_OPENAI_API_KEY") {
            self.azure_openai.api_key = Some(ApiKey(v));
        }
        if let Some(v) = env("AZURE_OPENAI_API_VERSION") {
            self.azure_openai.api_version = Some(v);
        }
        if let Some(v) = env("AZURE_OPENAI_DEPLOYMENT_NAME") {
            self.azure_openai.deployment_name = Some(v);
        }

        // Single-key providers.
        if let Some(v) = env("OPENAI_API_KEY") {
            self.openai.api_key = Some(ApiKey(v));
        }
        if let Some(v) = env("GEMINI_API_KEY") {
            self.gemini.api_key = Some(ApiKey(v));
        }
        if let Some(v) = env("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(ApiKey(v));
        }
        if let Some(v) = env("GROQ_API_KEY") {
            self.groq.api_key = Some(ApiKey(v));
        }
    }

    /// Check values every run depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero concurrency limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrent_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrent_limit",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.interview.concurrent_limit == Some(0) {
            return Err(ConfigError::Invalid {
                field: "interview.concurrent_limit",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Resolve the config path: explicit, then the resolver's `CONFIG_PATH`, then
/// `./config.yaml`.
pub fn config_path_with(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Some(p) = env("CONFIG_PATH").filter(|p| !p.is_empty()) {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Reject an empty required text value.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `value` is blank.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

// ── Model params ────────────────────────────────────────────────

/// Sampling parameters shared by every provider.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
    /// Newer spelling of `max_tokens`; wins when both are set and is sent
    /// under this name to OpenAI-compatible APIs.
    pub max_completion_tokens: Option<u32>,
}

impl ModelParams {
    /// Normalised call parameters.
    pub fn completion_params(&self) -> CompletionParams {
        match self.max_completion_tokens {
            Some(limit) => CompletionParams {
                temperature: self.temperature,
                max_tokens: Some(limit),
                token_limit_key: TokenLimitKey::MaxCompletionTokens,
            },
            None => CompletionParams {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                token_limit_key: TokenLimitKey::MaxTokens,
            },
        }
    }
}

// ── Provider sections ───────────────────────────────────────────

/// Azure OpenAI deployment settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: Option<String>,
    /// API key.
    pub api_key: Option<ApiKey>,
    /// REST API version.
    pub api_version: Option<String>,
    /// Deployment name.
    pub deployment_name: Option<String>,
}

/// OpenAI settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key.
    pub api_key: Option<ApiKey>,
    /// Model name (default `gpt-4o`).
    pub model: Option<String>,
    /// Alternative compatible base URL.
    pub base_url: Option<String>,
}

/// Gemini settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key.
    pub api_key: Option<ApiKey>,
    /// Model name (default `gemini-2.0-flash-exp`).
    pub model: Option<String>,
}

/// Anthropic settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API key.
    pub api_key: Option<ApiKey>,
    /// Model name (default `claude-sonnet-4-20250514`).
    pub model: Option<String>,
    /// Token cap used when `model_params` sets none (default 8192).
    pub max_tokens: Option<u32>,
}

/// Groq settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    /// API key.
    pub api_key: Option<ApiKey>,
    /// Model name (default `gpt-oss-120b`).
    pub model: Option<String>,
}

// ── Engine sections ─────────────────────────────────────────────

/// Survey run settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Persona JSON file.
    pub input_file: PathBuf,
    /// Directory the result CSV goes into.
    pub output_dir: PathBuf,
    /// Result CSV file name, relative to `output_dir`.
    pub output_file: PathBuf,
    /// The question every persona answers.
    pub question: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("data/personas_100.json"),
            output_dir: PathBuf::from("output"),
            output_file: PathBuf::from("survey_result.csv"),
            question: String::new(),
        }
    }
}

impl SurveyConfig {
    /// Where the result table is written.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}

/// Interview run settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    /// Persona JSON file.
    pub input_file: PathBuf,
    /// Result CSV path.
    pub output_file: PathBuf,
    /// Number of interviewer follow-up questions.
    pub max_turns: u32,
    /// Interview-specific concurrency; falls back to the global limit.
    pub concurrent_limit: Option<usize>,
    /// Opening question.
    pub initial_question: String,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("data/personas_100.json"),
            output_file: PathBuf::from("output/interview_result.csv"),
            max_turns: 3,
            concurrent_limit: None,
            initial_question: String::new(),
        }
    }
}

/// A/B test run settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AbTestConfig {
    /// Persona JSON file.
    pub input_file: PathBuf,
    /// Result CSV path.
    pub output_file: PathBuf,
    /// Ad copy for plan A.
    pub plan_a: String,
    /// Ad copy for plan B.
    pub plan_b: String,
}

impl Default for AbTestConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("data/personas_100.json"),
            output_file: PathBuf::from("output/ab_test_result.csv"),
            plan_a: String::new(),
            plan_b: String::new(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
