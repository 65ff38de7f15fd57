//! Gemini-backed C code generation.
//!
//! This crate turns a natural-language task ("sort an array with bubble
//! sort") into C source by calling Google's Gemini `generateContent` API
//! once per prompt.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gemini_coder::{CodeGenerator, GeminiCoder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coder = GeminiCoder::from_env()?;
//!
//!     // Errors come back as displayable text rather than Err
//!     let code = coder.respond("Program to check if a string is palindrome").await;
//!     println!("{}", code);
//!     Ok(())
//! }
//! ```

mod api_types;
mod coder;
mod config;
mod error;
mod fence;
mod trait_def;

pub use coder::{build_prompt, GeminiCoder};
pub use config::{GeminiConfig, GeminiConfigBuilder};
pub use error::CodegenError;
pub use fence::strip_code_fences;
pub use trait_def::CodeGenerator;

// Re-export async_trait for implementors
pub use async_trait::async_trait;
