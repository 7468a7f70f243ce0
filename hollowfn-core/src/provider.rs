//! Inference provider trait.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HollowError;
use crate::types::{CompletionRequest, ProviderInfo, RawResponse};

/// The narrow capability the engine consumes from a remote inference service.
///
/// Providers implement exactly one operation; everything else - prompt
/// compilation, retries, decoding, validation, caching - lives in the
/// runtime. Concrete integrations are adapters outside the core (see the
/// provider crate). Per-attempt deadlines are enforced by the runtime around
/// this call, so implementations don't need their own timeout plumbing.
#[async_trait]
pub trait InferenceProvider: Send + Sync + Debug + 'static {
    /// Get provider information
    fn info(&self) -> Arc<ProviderInfo>;

    /// Dispatch a compiled prompt and return the provider's raw output.
    ///
    /// Failures must be classified: transport problems as
    /// `HollowError::Transport`/`Network`, throttling as `RateLimited`, and
    /// unrecoverable rejections (credentials, content policy) as
    /// `ProviderRejected`.
    async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, HollowError>;
}
