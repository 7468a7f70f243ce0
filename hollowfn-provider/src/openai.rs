//! OpenAI provider adapter using the async-openai crate.
//!
//! Implements the narrow `InferenceProvider` contract: one compiled prompt in,
//! one raw text response out. The adapter owns the model selection and the
//! error classification; retries, decoding and validation all happen in the
//! runtime.

use std::sync::Arc;
use std::time::Instant;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use hollowfn_core::error::HollowError;
use hollowfn_core::provider::InferenceProvider;
use hollowfn_core::types::{CompletionRequest, ProviderInfo, RawResponse, Usage};

/// OpenAI-protocol provider
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.model)
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider with default configuration and model
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model: "gpt-4o-mini".to_string(),
            info: Arc::new(ProviderInfo {
                id: "openai".to_string(),
                name: "OpenAI".to_string(),
            }),
        }
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }

    /// Build the chat completion request for one compiled prompt
    fn build_request(
        &self,
        req: &CompletionRequest,
    ) -> Result<CreateChatCompletionRequest, HollowError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(req.text.clone())
            .build()
            .map_err(|e| {
                HollowError::provider_rejected(format!("failed to build user message: {}", e))
            })?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(vec![ChatCompletionRequestMessage::User(message)]);

        if let Some(max_tokens) = req.max_tokens {
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = req.temperature {
            builder.temperature(temperature);
        }

        builder
            .build()
            .map_err(|e| HollowError::provider_rejected(format!("failed to build request: {}", e)))
    }

    /// Map the client's errors into the engine taxonomy.
    ///
    /// Transport problems are retryable; API-level errors are rate limiting
    /// when the provider says so and terminal rejections otherwise
    /// (credentials, content policy, malformed request).
    fn classify_error(err: OpenAIError) -> HollowError {
        match err {
            OpenAIError::Reqwest(e) => HollowError::Network(e),
            OpenAIError::ApiError(api) => {
                let hint = api.r#type.clone().unwrap_or_default();
                let message = api.message.clone();
                if hint.contains("rate_limit")
                    || hint.contains("insufficient_quota")
                    || message.to_lowercase().contains("rate limit")
                {
                    HollowError::rate_limited(message)
                } else {
                    HollowError::provider_rejected(message)
                }
            }
            other => HollowError::transport(format!("OpenAI client error: {}", other)),
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, HollowError> {
        let openai_req = self.build_request(&req)?;

        let start = Instant::now();
        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(Self::classify_error)?;
        let latency = start.elapsed();

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(RawResponse {
            text,
            usage,
            model: Some(response.model),
            latency,
        })
    }
}

/// Builder for OpenAI provider with custom configuration
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    org_id: Option<String>,
    model: Option<String>,
}

impl OpenAiBuilder {
    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible APIs like DeepSeek)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set organization ID
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the model dispatched to
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<OpenAiProvider, HollowError> {
        self.build_with_id("openai", "OpenAI")
    }

    /// Build a provider with a custom provider ID and name.
    ///
    /// Useful for OpenAI-compatible APIs that use the same protocol but a
    /// different endpoint.
    pub fn build_with_id(
        self,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Result<OpenAiProvider, HollowError> {
        let api_key = self
            .api_key
            .ok_or_else(|| HollowError::configuration("API key is required"))?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Some(api_base) = self.api_base {
            config = config.with_api_base(api_base);
        }

        if let Some(org_id) = self.org_id {
            config = config.with_org_id(org_id);
        }

        Ok(OpenAiProvider {
            client: Client::with_config(config),
            model: self.model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
            info: Arc::new(ProviderInfo {
                id: provider_id.into(),
                name: provider_name.into(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_api_key() {
        let err = OpenAiProvider::builder().build().unwrap_err();
        assert!(matches!(err, HollowError::Configuration(_)));
    }

    #[test]
    fn builder_sets_model_and_identity() {
        let provider = OpenAiProvider::builder()
            .api_key("key")
            .model("gpt-4o")
            .build_with_id("azure", "Azure OpenAI")
            .unwrap();
        assert_eq!(provider.info().id, "azure");
        assert_eq!(provider.model, "gpt-4o");
    }

    #[test]
    fn api_errors_classify_as_rate_limit_or_rejection() {
        let rate = OpenAiProvider::classify_error(OpenAIError::ApiError(
            async_openai::error::ApiError {
                message: "Rate limit reached".to_string(),
                r#type: Some("rate_limit_error".to_string()),
                param: None,
                code: None,
            },
        ));
        assert!(matches!(rate, HollowError::RateLimited(_)));

        let rejected = OpenAiProvider::classify_error(OpenAIError::ApiError(
            async_openai::error::ApiError {
                message: "Incorrect API key provided".to_string(),
                r#type: Some("invalid_request_error".to_string()),
                param: None,
                code: None,
            },
        ));
        assert!(matches!(rejected, HollowError::ProviderRejected(_)));
    }

    #[test]
    fn reqwest_errors_classify_as_network_and_retryable() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        let classified = OpenAiProvider::classify_error(OpenAIError::Reqwest(err));
        assert!(matches!(classified, HollowError::Network(_)));
        assert!(classified.is_retryable());
    }
}
