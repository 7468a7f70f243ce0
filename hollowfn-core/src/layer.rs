//! Layer trait and abstractions.
//!
//! Layers provide a composable way to wrap providers with cross-cutting
//! concerns (logging, metrics, request rewriting) without touching the
//! engine. Each layer wraps an inner provider and returns a new provider.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HollowError;
use crate::provider::InferenceProvider;
use crate::types::{CompletionRequest, ProviderInfo, RawResponse};

/// Layer trait for wrapping providers.
///
/// Composition happens with static dispatch while building the runtime; the
/// finished stack is type-erased once behind `Arc<dyn InferenceProvider>`.
pub trait Layer<P: InferenceProvider> {
    /// The type of the layered provider
    type LayeredProvider: InferenceProvider;

    /// Wrap the inner provider with this layer
    fn layer(&self, inner: P) -> Self::LayeredProvider;
}

/// Helper trait for layered providers with default forwarding.
///
/// Implementers override only the operations they intercept.
#[async_trait]
pub trait LayeredProvider: Sized + InferenceProvider {
    /// The inner provider type
    type Inner: InferenceProvider;

    /// Get a reference to the inner provider
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<ProviderInfo> {
        self.inner().info()
    }

    /// Default implementation for complete - forwards to inner
    async fn layered_complete(
        &self,
        req: CompletionRequest,
    ) -> Result<RawResponse, HollowError> {
        self.inner().complete(req).await
    }
}

/// Implement `InferenceProvider` by forwarding to `LayeredProvider` methods.
#[macro_export]
macro_rules! impl_layered_provider {
    ($type:ty) => {
        #[async_trait::async_trait]
        impl $crate::provider::InferenceProvider for $type {
            fn info(&self) -> std::sync::Arc<$crate::types::ProviderInfo> {
                $crate::layer::LayeredProvider::layered_info(self)
            }

            async fn complete(
                &self,
                req: $crate::types::CompletionRequest,
            ) -> Result<$crate::types::RawResponse, $crate::error::HollowError> {
                $crate::layer::LayeredProvider::layered_complete(self, req).await
            }
        }
    };
}
