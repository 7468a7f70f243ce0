//! # hollowfn core
//!
//! Core abstractions and runtime for hollow functions: ordinary function
//! signatures whose computation is delegated to a remote inference service.
//!
//! A caller registers a `FunctionSpec` (prompt template + output schema),
//! then calls `invoke` with typed arguments. The runtime compiles the
//! prompt, dispatches it through a retry/backoff controller, decodes the
//! provider's free-text reply into structured data, validates it against the
//! declared schema and returns a classified `InvocationResult` - never an
//! unhandled fault.

pub mod cache;
pub mod decode;
pub mod error;
pub mod layer;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod runtime;
pub mod schema;
pub mod types;

// Re-exports
pub use cache::{CacheConfig, InvocationCache};
pub use error::{ErrorKind, HollowError};
pub use layer::{Layer, LayeredProvider};
pub use provider::InferenceProvider;
pub use retry::{RetryController, RetryDecision, RetryPolicy, RetryState};
pub use runtime::{HollowRuntime, HollowRuntimeBuilder};
pub use schema::{OutputSchema, SchemaError};
pub use types::*;

/// Result type alias for engine-internal operations
pub type Result<T> = std::result::Result<T, HollowError>;
