//! # hollowfn providers
//!
//! Inference provider adapters for hollowfn.

pub mod openai;

// Re-exports
pub use openai::{OpenAiBuilder, OpenAiProvider};

use hollowfn_core::error::HollowError;

/// Create a DeepSeek provider (OpenAI-compatible)
///
/// DeepSeek uses the OpenAI API protocol with a different endpoint. This is
/// a convenience function that creates an OpenAI provider configured for
/// DeepSeek's API.
///
/// # Example
///
/// ```ignore
/// use hollowfn_provider::deepseek;
///
/// let provider = deepseek("your-api-key")?;
/// ```
pub fn deepseek(api_key: impl Into<String>) -> Result<OpenAiProvider, HollowError> {
    OpenAiProvider::builder()
        .api_key(api_key)
        .api_base("https://api.deepseek.com/v1")
        .model("deepseek-chat")
        .build_with_id("deepseek", "DeepSeek")
}
