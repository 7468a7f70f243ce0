//! # hollowfn
//!
//! Typed functions whose computation is delegated to a remote inference
//! service. A hollow function looks like an ordinary call - typed arguments
//! in, a typed value out - while the engine compiles a prompt, dispatches it
//! with retries, decodes the model's free-text reply and validates it
//! against a declared schema.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! hollowfn = { version = "0.1", features = ["openai", "layers"] }
//! ```
//!
//! ```ignore
//! use hollowfn::prelude::*;
//! use hollowfn::provider::OpenAiProvider;
//! use hollowfn::layer::LoggingLayer;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAiProvider::builder()
//!     .api_key("your-api-key")
//!     .build()?;
//!
//! let runtime = HollowRuntime::builder(provider)
//!     .layer(LoggingLayer::new())
//!     .finish();
//!
//! runtime.register(FunctionSpec::new(
//!     "word_in_sentence",
//!     PromptTemplate::parse("Is '{word}' in '{sentence}'? Answer as JSON."),
//!     OutputSchema::record([("wordInSentence", OutputSchema::Boolean)]),
//! ))?;
//!
//! let result = runtime
//!     .invoke(
//!         "word_in_sentence",
//!         [
//!             ("word".to_string(), json!("orange")),
//!             ("sentence".to_string(), json!("I love eating oranges.")),
//!         ]
//!         .into(),
//!     )
//!     .await;
//! println!("{:?}", result.value());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: includes `openai` provider and `layers`
//! - `openai`: OpenAI-protocol provider support
//! - `providers`: all available providers
//! - `layers`: built-in layers (logging, etc.)
//! - `full`: all features enabled

// Re-export core types and traits
pub use hollowfn_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "hollowfn-provider")]
pub mod provider {
    //! Inference provider adapters.
    pub use hollowfn_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "hollowfn-layer")]
pub mod layer {
    //! Built-in middleware layers.
    pub use hollowfn_layer::*;
}

// Convenience re-exports at root level for common types
pub use hollowfn_core::{
    cache::CacheConfig,
    error::{ErrorKind, HollowError},
    layer::{Layer, LayeredProvider},
    provider::InferenceProvider,
    retry::RetryPolicy,
    runtime::HollowRuntime,
    schema::OutputSchema,
    types::{
        Arguments, CompiledPrompt, CompletionRequest, FunctionSpec, InvocationResult,
        InvokeOptions, PromptTemplate, ProviderInfo, RawResponse, Segment, Usage,
    },
    Result,
};

/// Prelude module for convenient imports
pub mod prelude {
    //! The most commonly used types and traits.
    //!
    //! ```
    //! use hollowfn::prelude::*;
    //! ```

    pub use crate::{
        Arguments, CacheConfig, ErrorKind, FunctionSpec, HollowError, HollowRuntime,
        InferenceProvider, InvocationResult, InvokeOptions, Layer, OutputSchema,
        PromptTemplate, Result, RetryPolicy,
    };

    #[cfg(feature = "hollowfn-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "hollowfn-layer")]
    pub use crate::layer::*;
}
