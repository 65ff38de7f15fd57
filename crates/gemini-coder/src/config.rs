//! Configuration for GeminiCoder.

use std::env;

/// Default Gemini API base URL.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for GeminiCoder.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// Gemini API base URL.
    pub api_url: String,

    /// API key sent in the `x-goog-api-key` header. Empty when unset.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Top-k sampling cutoff.
    pub top_k: u32,

    /// Nucleus sampling cutoff.
    pub top_p: f32,

    /// Maximum tokens in the generated answer.
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// A missing key is not an error here: the coder starts anyway and
    /// answers every prompt with a "key not found" message.
    ///
    /// - `GEMINI_API_KEY` - API key
    /// - `GEMINI_API_URL` - API URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_MODEL` - Model name (default: gemini-2.0-flash)
    /// - `GEMINI_TEMPERATURE` - Temperature (default: 0.7)
    /// - `GEMINI_TOP_K` - Top-k (default: 40)
    /// - `GEMINI_TOP_P` - Top-p (default: 0.95)
    /// - `GEMINI_MAX_OUTPUT_TOKENS` - Max output tokens (default: 2048)
    ///
    /// Unparsable numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("GEMINI_API_KEY")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        let api_url = env::var("GEMINI_API_URL").unwrap_or(defaults.api_url);

        let model = env::var("GEMINI_MODEL").unwrap_or(defaults.model);

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.temperature);

        let top_k = env::var("GEMINI_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.top_k);

        let top_p = env::var("GEMINI_TOP_P")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.top_p);

        let max_output_tokens = env::var("GEMINI_MAX_OUTPUT_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_output_tokens);

        Self {
            api_url,
            api_key,
            model,
            temperature,
            top_k,
            top_p,
            max_output_tokens,
        }
    }

    /// Whether an API key is present.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Create a new config builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }
}

/// Builder for GeminiConfig.
#[derive(Debug, Default)]
pub struct GeminiConfigBuilder {
    config: GeminiConfig,
}

impl GeminiConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = temp;
        self
    }

    /// Set top-k.
    pub fn top_k(mut self, top_k: u32) -> Self {
        self.config.top_k = top_k;
        self
    }

    /// Set top-p.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.config.top_p = top_p;
        self
    }

    /// Set the max output tokens.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.config.max_output_tokens = tokens;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GeminiConfig {
        self.config
    }
}
