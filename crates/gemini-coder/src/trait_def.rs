//! The CodeGenerator trait definition.

use async_trait::async_trait;
use tracing::warn;

use crate::error::CodegenError;

/// A trait for turning a natural-language task into source code.
///
/// This trait is object-safe and can be used with `Arc<dyn CodeGenerator>`.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate code for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, CodegenError>;

    /// Get a human-readable name for this generator.
    fn name(&self) -> &str;

    /// Generate code, folding any failure into its user-facing message.
    ///
    /// The returned text is shown and stored exactly like a successful
    /// answer.
    async fn respond(&self, prompt: &str) -> String {
        match self.generate(prompt).await {
            Ok(code) => code,
            Err(err) => {
                warn!(generator = self.name(), error = %err, "Code generation failed");
                err.user_message()
            }
        }
    }
}
