//! Generate C code for a single task.
//!
//! Run with: cargo run -p gemini-coder --example generate
//! Or with a custom task: cargo run -p gemini-coder --example generate -- "Your task here"
//!
//! Make sure to set environment variables in .env:
//!   GEMINI_API_KEY - Gemini API key

use gemini_coder::{CodeGenerator, GeminiCoder};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let task = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "Write a program to find factorial of a number".to_string()
    };

    let coder = GeminiCoder::from_env()?;

    println!("Generator: {}", coder.name());
    println!("API URL: {}", coder.config().api_url);
    println!("Model: {}", coder.config().model);
    println!();
    println!("Task: \"{}\"", task);
    println!("Waiting for response...\n");

    let code = coder.respond(&task).await;

    println!("=== Code ===");
    println!("{}", code);
    println!("============");

    Ok(())
}
