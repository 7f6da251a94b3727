//! Configuration loading, validation, and management for contextchat.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config`, else `./contextchat.toml`)
//! 3. A `.env` file in the working directory
//! 4. Process environment (`OPENAI_API_KEY`, `CONTEXTCHAT_*`)
//!
//! Everything is validated once at startup; nothing here is consulted
//! again after the session has been built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Overrides [`AppConfig::model`].
pub const MODEL_ENV: &str = "CONTEXTCHAT_MODEL";
/// Overrides [`DataConfig::path`].
pub const DATA_PATH_ENV: &str = "CONTEXTCHAT_DATA_PATH";
/// Overrides [`AppConfig::base_url`].
pub const BASE_URL_ENV: &str = "CONTEXTCHAT_BASE_URL";

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "contextchat.toml";

/// Marker replaced by the assembled context block.
pub const CONTEXT_MARKER: &str = "{context}";
/// Marker replaced by the user's question.
pub const QUESTION_MARKER: &str = "{question}";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider credential. Normally supplied through `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Hard ceiling on prompt + completion tokens for the model
    #[serde(default = "default_max_total_tokens")]
    pub max_total_tokens: u32,

    /// Tokens reserved for each generated answer
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature; unset means provider default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// HTTP timeout for a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where the context rows come from
    #[serde(default)]
    pub data: DataConfig,

    /// Prompt template with `{context}` and `{question}` insertion points
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

fn default_model() -> String {
    "gpt-3.5-turbo-instruct".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_max_total_tokens() -> u32 {
    4097
}
fn default_max_output_tokens() -> u32 {
    150
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// The prompt used when none is configured.
pub fn default_prompt_template() -> String {
    concat!(
        "\n",
        "Answer the question based on the context below, and if the question\n",
        "can't be answered based on the context, say \"I don't know\"\n",
        "\n",
        "Context: \n",
        "\n",
        "{context}\n",
        "\n",
        "---\n",
        "\n",
        "Question: {question}\n",
        "Answer:",
    )
    .into()
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_total_tokens", &self.max_total_tokens)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("data", &self.data)
            .field("prompt_template", &self.prompt_template)
            .finish()
    }
}

/// Location of the tabular context source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV file with a header row
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// Header of the column holding the free-text rows
    #[serde(default = "default_data_column")]
    pub column: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/2023_fashion_trends.csv")
}
fn default_data_column() -> String {
    "Trends".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            column: default_data_column(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers.
    ///
    /// `explicit` is a path given on the command line; it must exist. Without
    /// it, `./contextchat.toml` is used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    reason: "file does not exist".into(),
                });
            }
            Some(path) => Self::load_from(path)?,
            None => Self::load_from(Path::new(DEFAULT_CONFIG_FILE))?,
        };

        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => tracing::warn!("Failed to load .env file: {e}"),
        }

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, falling back to
    /// defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// The credential from the environment only fills an unset `api_key`;
    /// the other overrides always win over file values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty());
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.model = model;
        }
        if let Some(path) = lookup(DATA_PATH_ENV) {
            self.data.path = PathBuf::from(path);
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.base_url = url;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token_budget()?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        for marker in [CONTEXT_MARKER, QUESTION_MARKER] {
            let count = self.prompt_template.matches(marker).count();
            if count != 1 {
                return Err(ConfigError::ValidationError(format!(
                    "prompt_template must contain {marker} exactly once (found {count})"
                )));
            }
        }

        if self.data.column.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "data.column must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Tokens available for template + question + context rows.
    pub fn token_budget(&self) -> Result<usize, ConfigError> {
        match self.max_total_tokens.checked_sub(self.max_output_tokens) {
            Some(budget) if budget > 0 => Ok(budget as usize),
            _ => Err(ConfigError::InvalidBudget {
                max_total: self.max_total_tokens,
                reserved: self.max_output_tokens,
            }),
        }
    }

    /// The credential, or a configuration error explaining how to set it.
    /// A blank key counts as missing, wherever it came from.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_total_tokens: default_max_total_tokens(),
            max_output_tokens: default_max_output_tokens(),
            temperature: None,
            request_timeout_secs: default_request_timeout_secs(),
            data: DataConfig::default(),
            prompt_template: default_prompt_template(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error(
        "Token budget must be positive: max_total_tokens ({max_total}) - max_output_tokens ({reserved})"
    )]
    InvalidBudget { max_total: u32, reserved: u32 },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for contextchat_core::Error {
    fn from(e: ConfigError) -> Self {
        contextchat_core::Error::Config {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "gpt-3.5-turbo-instruct");
        assert_eq!(config.data.column, "Trends");
        assert_eq!(config.token_budget().unwrap(), 4097 - 150);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.prompt_template, config.prompt_template);
        assert_eq!(parsed.data.path, config.data.path);
    }

    #[test]
    fn zero_budget_rejected() {
        let config = AppConfig {
            max_total_tokens: 150,
            max_output_tokens: 150,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBudget { .. })
        ));
    }

    #[test]
    fn reserved_larger_than_total_rejected() {
        let config = AppConfig {
            max_total_tokens: 100,
            max_output_tokens: 500,
            ..AppConfig::default()
        };
        assert!(config.token_budget().is_err());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: Some(5.0),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn template_without_question_marker_rejected() {
        let config = AppConfig {
            prompt_template: "Context: {context}".into(),
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("{question}"));
    }

    #[test]
    fn template_with_repeated_marker_rejected() {
        let config = AppConfig {
            prompt_template: "{context} {context} {question}".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/contextchat.toml")).unwrap();
        assert_eq!(config.max_total_tokens, 4097);
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/contextchat.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contextchat.toml");
        std::fs::write(
            &path,
            r#"
model = "davinci-002"
max_output_tokens = 200

[data]
column = "Notes"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "davinci-002");
        assert_eq!(config.max_output_tokens, 200);
        assert_eq!(config.data.column, "Notes");
        assert_eq!(config.data.path, default_data_path());
        assert_eq!(config.max_total_tokens, 4097);
    }

    #[test]
    fn unparsable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "model = [").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn env_supplies_key_and_overrides() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            (API_KEY_ENV, "sk-test"),
            (MODEL_ENV, "babbage-002"),
            (DATA_PATH_ENV, "/tmp/rows.csv"),
        ]));
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.model, "babbage-002");
        assert_eq!(config.data.path, PathBuf::from("/tmp/rows.csv"));
        assert_eq!(config.base_url, default_base_url());
    }

    #[test]
    fn file_key_is_not_replaced_by_env() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[(API_KEY_ENV, "sk-env")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn blank_env_key_counts_as_missing() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[(API_KEY_ENV, "   ")]));
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn converts_into_core_error() {
        let err: contextchat_core::Error = ConfigError::MissingApiKey.into();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn blank_file_key_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contextchat.toml");
        std::fs::write(&path, "api_key = \"\"\n").unwrap();

        let mut config = AppConfig::load_from(&path).unwrap();
        config.apply_env(|_| None);
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn default_template_keeps_context_heading() {
        let template = default_prompt_template();
        assert!(template.starts_with("\nAnswer the question"));
        assert!(template.contains("\nContext: \n\n{context}\n\n---\n\n"));
        assert!(template.ends_with("Question: {question}\nAnswer:"));
    }
}
