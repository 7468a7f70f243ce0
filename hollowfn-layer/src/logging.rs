//! Logging layer for provider dispatches.

use std::sync::Arc;

use async_trait::async_trait;
use hollowfn_core::error::HollowError;
use hollowfn_core::layer::{Layer, LayeredProvider};
use hollowfn_core::provider::InferenceProvider;
use hollowfn_core::types::{CompletionRequest, ProviderInfo, RawResponse};

/// Logging layer that records every dispatch with its outcome and timing.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[hollowfn]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: InferenceProvider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

#[async_trait]
impl<P: InferenceProvider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_complete(
        &self,
        req: CompletionRequest,
    ) -> Result<RawResponse, HollowError> {
        tracing::debug!(
            "{} complete request: prompt_len={}, max_tokens={:?}",
            self.prefix,
            req.text.len(),
            req.max_tokens
        );

        let start = std::time::Instant::now();
        let result = self.inner.complete(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    "{} complete success: response_len={}, tokens={:?}, elapsed={:?}",
                    self.prefix,
                    response.text.len(),
                    response.usage.as_ref().map(|u| u.total_tokens),
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} complete error: {:?}, elapsed={:?}",
                    self.prefix,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

#[async_trait]
impl<P: InferenceProvider> InferenceProvider for LoggingProvider<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        LayeredProvider::layered_info(self)
    }

    async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, HollowError> {
        LayeredProvider::layered_complete(self, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoProvider;

    #[async_trait]
    impl InferenceProvider for EchoProvider {
        fn info(&self) -> Arc<ProviderInfo> {
            Arc::new(ProviderInfo {
                id: "echo".to_string(),
                name: "Echo".to_string(),
            })
        }

        async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, HollowError> {
            Ok(RawResponse::from_text(req.text))
        }
    }

    #[tokio::test]
    async fn logging_layer_forwards_to_inner() {
        let provider = LoggingLayer::new().layer(EchoProvider);
        assert_eq!(provider.info().id, "echo");

        let response = provider
            .complete(CompletionRequest {
                text: "ping".to_string(),
                max_tokens: None,
                temperature: None,
            })
            .await
            .unwrap();
        assert_eq!(response.text, "ping");
    }
}
