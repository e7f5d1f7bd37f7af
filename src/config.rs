//! Runtime settings for the answer pipeline and its HTTP clients.
//!
//! Settings are resolved once at startup and handed to each client constructor.
//! Values set on the builder win over environment variables, which win over
//! the built-in defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MAX_TOKENS_VAR: &str = "WEBQA_MAX_TOKENS";
pub const SUMMARY_MAX_TOKENS_VAR: &str = "WEBQA_SUMMARY_MAX_TOKENS";
pub const NUM_RESULTS_VAR: &str = "WEBQA_NUM_RESULTS";
pub const MAX_PARAGRAPHS_VAR: &str = "WEBQA_MAX_PARAGRAPHS";
pub const MAX_CHARS_VAR: &str = "WEBQA_MAX_CHARS";
pub const TIMEOUT_VAR: &str = "WEBQA_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_NUM_RESULTS: usize = 3;
pub const DEFAULT_MAX_PARAGRAPHS: usize = 5;
pub const DEFAULT_MAX_CHARS: usize = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while resolving settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API key was configured.
    #[error("OpenAI API key is missing. Please set the OPENAI_API_KEY environment variable.")]
    MissingCredential,

    /// A numeric setting could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// The model endpoint is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// An API credential. `Debug` output never includes the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a credential, rejecting blank values.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the raw secret for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Resolved settings shared by the model client, the fetcher and the pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    api_key: ApiKey,
    model: String,
    base_url: String,
    answer_max_tokens: u32,
    summary_max_tokens: u32,
    num_results: usize,
    max_paragraphs: usize,
    max_chars: usize,
    timeout: Duration,
}

impl Settings {
    /// Resolves settings purely from the environment and defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        SettingsBuilder::new().build()
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn answer_max_tokens(&self) -> u32 {
        self.answer_max_tokens
    }

    pub fn summary_max_tokens(&self) -> u32 {
        self.summary_max_tokens
    }

    pub fn num_results(&self) -> usize {
        self.num_results
    }

    pub fn max_paragraphs(&self) -> usize {
        self.max_paragraphs
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Per-call timeout applied to every outbound HTTP request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for [`Settings`].
///
/// # Examples
///
/// ```
/// use webqa::config::SettingsBuilder;
///
/// let settings = SettingsBuilder::new()
///     .api_key("sk-test")
///     .model("gpt-4o-mini")
///     .build()
///     .expect("valid settings");
/// assert_eq!(settings.model(), "gpt-4o-mini");
/// ```
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    answer_max_tokens: Option<u32>,
    summary_max_tokens: Option<u32>,
    num_results: Option<usize>,
    max_paragraphs: Option<usize>,
    max_chars: Option<usize>,
    timeout: Option<Duration>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn answer_max_tokens(mut self, tokens: u32) -> Self {
        self.answer_max_tokens = Some(tokens);
        self
    }

    pub fn summary_max_tokens(mut self, tokens: u32) -> Self {
        self.summary_max_tokens = Some(tokens);
        self
    }

    pub fn num_results(mut self, n: usize) -> Self {
        self.num_results = Some(n);
        self
    }

    pub fn max_paragraphs(mut self, n: usize) -> Self {
        self.max_paragraphs = Some(n);
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.max_chars = Some(n);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolves every setting, consulting the environment for unset values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when no non-blank API key is
    /// available, [`ConfigError::InvalidValue`] for unparsable numeric
    /// variables, and [`ConfigError::InvalidUrl`] for a malformed base URL.
    pub fn build(self) -> Result<Settings, ConfigError> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_VAR).ok())
            .and_then(ApiKey::new)
            .ok_or(ConfigError::MissingCredential)?;

        let model = match self.model {
            Some(m) => m,
            None => env_string(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let base_url = match self.base_url {
            Some(url) => url,
            None => env_string(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };
        reqwest::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{base_url}: {e}")))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let answer_max_tokens = resolve(self.answer_max_tokens, MAX_TOKENS_VAR, DEFAULT_MAX_TOKENS)?;
        let summary_max_tokens =
            resolve(self.summary_max_tokens, SUMMARY_MAX_TOKENS_VAR, DEFAULT_MAX_TOKENS)?;
        let num_results = resolve(self.num_results, NUM_RESULTS_VAR, DEFAULT_NUM_RESULTS)?;
        let max_paragraphs =
            resolve(self.max_paragraphs, MAX_PARAGRAPHS_VAR, DEFAULT_MAX_PARAGRAPHS)?;
        let max_chars = resolve(self.max_chars, MAX_CHARS_VAR, DEFAULT_MAX_CHARS)?;
        let timeout = match self.timeout {
            Some(t) => t,
            None => Duration::from_secs(resolve(None, TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS)?),
        };

        Ok(Settings {
            api_key,
            model,
            base_url,
            answer_max_tokens,
            summary_max_tokens,
            num_results,
            max_paragraphs,
            max_chars,
            timeout,
        })
    }
}

/// Loads a `.env` file from the working directory, if one exists.
///
/// Returns `true` when a file was found and applied.
pub fn load_dotenv() -> bool {
    dotenvy::dotenv().is_ok()
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve<T: FromStr>(explicit: Option<T>, var: &'static str, default: T) -> Result<T, ConfigError> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    match env_string(var) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            for var in [
                API_KEY_VAR,
                MODEL_VAR,
                BASE_URL_VAR,
                MAX_TOKENS_VAR,
                SUMMARY_MAX_TOKENS_VAR,
                NUM_RESULTS_VAR,
                MAX_PARAGRAPHS_VAR,
                MAX_CHARS_VAR,
                TIMEOUT_VAR,
            ] {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn missing_api_key_is_reported() {
        clear_env();
        let result = SettingsBuilder::new().build();
        assert_eq!(result.unwrap_err(), ConfigError::MissingCredential);
    }

    #[test]
    #[serial]
    fn blank_api_key_counts_as_missing() {
        clear_env();
        unsafe {
            std::env::set_var(API_KEY_VAR, "   ");
        }
        let result = Settings::from_env();
        assert_eq!(result.unwrap_err(), ConfigError::MissingCredential);
        clear_env();
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_key_is_set() {
        clear_env();
        unsafe {
            std::env::set_var(API_KEY_VAR, "sk-env");
        }
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.api_key().expose(), "sk-env");
        assert_eq!(settings.model(), DEFAULT_MODEL);
        assert_eq!(settings.base_url(), DEFAULT_BASE_URL);
        assert_eq!(settings.answer_max_tokens(), 150);
        assert_eq!(settings.num_results(), DEFAULT_NUM_RESULTS);
        assert_eq!(settings.max_paragraphs(), DEFAULT_MAX_PARAGRAPHS);
        assert_eq!(settings.max_chars(), DEFAULT_MAX_CHARS);
        assert_eq!(settings.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        clear_env();
    }

    #[test]
    #[serial]
    fn builder_values_take_precedence_over_env() {
        clear_env();
        unsafe {
            std::env::set_var(API_KEY_VAR, "sk-env");
            std::env::set_var(MODEL_VAR, "env-model");
            std::env::set_var(MAX_CHARS_VAR, "100");
        }
        let settings = SettingsBuilder::new()
            .api_key("sk-builder")
            .model("builder-model")
            .max_chars(42)
            .build()
            .unwrap();
        assert_eq!(settings.api_key().expose(), "sk-builder");
        assert_eq!(settings.model(), "builder-model");
        assert_eq!(settings.max_chars(), 42);
        clear_env();
    }

    #[test]
    #[serial]
    fn numeric_env_values_are_parsed() {
        clear_env();
        unsafe {
            std::env::set_var(NUM_RESULTS_VAR, "7");
            std::env::set_var(TIMEOUT_VAR, "5");
        }
        let settings = SettingsBuilder::new().api_key("sk").build().unwrap();
        assert_eq!(settings.num_results(), 7);
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        clear_env();
    }

    #[test]
    #[serial]
    fn unparsable_numeric_env_value_is_an_error() {
        clear_env();
        unsafe {
            std::env::set_var(MAX_PARAGRAPHS_VAR, "lots");
        }
        let result = SettingsBuilder::new().api_key("sk").build();
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidValue {
                var: MAX_PARAGRAPHS_VAR,
                value: "lots".to_string()
            }
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_base_url_is_rejected() {
        clear_env();
        let result = SettingsBuilder::new()
            .api_key("sk")
            .base_url("not-a-valid-url")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    #[serial]
    fn trailing_slash_is_stripped_from_base_url() {
        clear_env();
        let settings = SettingsBuilder::new()
            .api_key("sk")
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(settings.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret").unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn missing_credential_message_names_the_variable() {
        let msg = ConfigError::MissingCredential.to_string();
        assert!(msg.contains("OPENAI_API_KEY"));
    }
}
