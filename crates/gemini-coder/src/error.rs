//! Error types for code generation.

use thiserror::Error;

/// Errors that can occur while generating code.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// No API key was configured.
    #[error("API key not found")]
    MissingApiKey,

    /// The API answered with a non-success status.
    #[error("API request failed with status code {status}")]
    Status {
        status: u16,
        /// Error message from the API body, when it could be parsed.
        message: Option<String>,
    },

    /// The response carried no candidate text.
    #[error("no code generated in the response")]
    EmptyResponse,

    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The client could not be built from its configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CodegenError {
    /// The text shown to the user (and stored as the assistant reply) in
    /// place of generated code.
    pub fn user_message(&self) -> String {
        match self {
            CodegenError::MissingApiKey => "Error: API key not found. Set GEMINI_API_KEY.".to_string(),
            CodegenError::Status { status, .. } => {
                format!("Error: API request failed with status code {}", status)
            }
            CodegenError::EmptyResponse => "Error: No code generated in the response".to_string(),
            CodegenError::Network(_)
            | CodegenError::InvalidResponse(_)
            | CodegenError::Configuration(_) => format!("Error generating code: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            CodegenError::Status {
                status: 429,
                message: Some("quota".to_string()),
            }
            .user_message(),
            "Error: API request failed with status code 429"
        );
        assert_eq!(
            CodegenError::EmptyResponse.user_message(),
            "Error: No code generated in the response"
        );
        assert_eq!(
            CodegenError::MissingApiKey.user_message(),
            "Error: API key not found. Set GEMINI_API_KEY."
        );
        assert_eq!(
            CodegenError::Network("connection refused".to_string()).user_message(),
            "Error generating code: network error: connection refused"
        );
    }
}
