//! GeminiCoder implementation using the Gemini `generateContent` API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};
use crate::config::GeminiConfig;
use crate::error::CodegenError;
use crate::fence::strip_code_fences;
use crate::trait_def::CodeGenerator;

/// Wrap a user's task in the instructions sent to the model.
pub fn build_prompt(task: &str) -> String {
    format!(
        "Write a C program for the following task: {}\n\
         Please provide clean, efficient, and well-commented C code.\n\
         Include proper error handling where necessary.\n\
         Return only the code without any explanation.",
        task
    )
}

/// A code generator backed by Google's Gemini API.
///
/// Each prompt is a single, independent request: no conversation history,
/// no retries and no streaming.
pub struct GeminiCoder {
    client: Client,
    config: GeminiConfig,
}

impl GeminiCoder {
    /// Create a new GeminiCoder with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, CodegenError> {
        let client = Client::builder().build().map_err(|e| {
            CodegenError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        if config.has_api_key() {
            info!("GeminiCoder initialized with model: {}", config.model);
        } else {
            warn!("GEMINI_API_KEY not set; code generation will report a missing key");
        }

        Ok(Self { client, config })
    }

    /// Create a GeminiCoder from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, CodegenError> {
        Self::new(GeminiConfig::from_env())
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Full URL of the `generateContent` endpoint for the configured model.
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the request body for a task.
    fn build_request(&self, task: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(build_prompt(task))],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    /// Send a request to the Gemini API.
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CodegenError> {
        let url = self.endpoint();

        debug!(model = %self.config.model, "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| CodegenError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&error_text)
                .ok()
                .map(|api_error| {
                    warn!(
                        code = ?api_error.error.code,
                        status = ?api_error.error.status,
                        "Gemini API error: {}",
                        api_error.error.message
                    );
                    api_error.error.message
                });

            return Err(CodegenError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CodegenError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = body.usage_metadata {
            debug!(
                "Token usage - prompt: {:?}, candidates: {:?}, total: {:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Ok(body)
    }
}

/// Pull the generated code out of a response.
fn extract_code(response: &GenerateContentResponse) -> Result<String, CodegenError> {
    if let Some(reason) = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
    {
        debug!(finish_reason = reason, "Candidate finished");
    }

    let text = response.first_text().ok_or(CodegenError::EmptyResponse)?;
    Ok(strip_code_fences(text))
}

#[async_trait]
impl CodeGenerator for GeminiCoder {
    async fn generate(&self, prompt: &str) -> Result<String, CodegenError> {
        if !self.config.has_api_key() {
            return Err(CodegenError::MissingApiKey);
        }

        let request = self.build_request(prompt);
        let response = self.generate_content(&request).await?;

        extract_code(&response)
    }

    fn name(&self) -> &str {
        "GeminiCoder"
    }
}
