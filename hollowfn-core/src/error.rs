//! Error types for hollow function invocation.

use serde::{Deserialize, Serialize};

/// Classified error category carried inside a failed invocation result.
///
/// Kinds are deliberately coarse: callers dispatch on them to decide whether
/// a failure came from their own arguments, from connectivity, or from model
/// output drift.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingArgument,
    UnsupportedArgumentType,
    DuplicateName,
    UnknownFunction,
    Transport,
    RateLimited,
    Timeout,
    Decode,
    SchemaViolation,
    ProviderRejected,
    Cancelled,
    Configuration,
}

/// The main error type for hollow function operations.
///
/// Every internal failure is converted into one of these variants at the
/// component boundary; the runtime then folds the error into a returned
/// `InvocationResult::Failed` rather than letting it escape to the caller.
#[derive(Debug, thiserror::Error)]
pub enum HollowError {
    /// A template placeholder had no matching argument
    #[error("missing argument '{0}'")]
    MissingArgument(String),

    /// An argument value cannot be embedded into prompt text
    #[error("unsupported argument type for '{name}': {detail}")]
    UnsupportedArgumentType { name: String, detail: String },

    /// A function spec was registered under an already-taken name
    #[error("duplicate function name '{0}'")]
    DuplicateName(String),

    /// Invocation of a name with no registered spec
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// Transport-level failure reaching the provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider signalled rate limiting
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A per-attempt or overall invocation deadline expired
    #[error("timed out: {0}")]
    Timeout(String),

    /// No parseable structured fragment in the provider's raw text
    #[error("decode error: {0}")]
    Decode(String),

    /// Decoded payload does not conform to the declared output schema
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Provider rejected the request outright (credentials, policy)
    #[error("provider rejected request: {0}")]
    ProviderRejected(String),

    /// The caller cancelled the in-flight invocation
    #[error("invocation cancelled")]
    Cancelled,

    /// Configuration errors (provider construction, bad options)
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HollowError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a schema violation error
    pub fn schema_violation(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Create a provider rejection error
    pub fn provider_rejected(msg: impl Into<String>) -> Self {
        Self::ProviderRejected(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an unsupported argument type error
    pub fn unsupported_argument(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedArgumentType {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// The classified kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingArgument(_) => ErrorKind::MissingArgument,
            Self::UnsupportedArgumentType { .. } => ErrorKind::UnsupportedArgumentType,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::UnknownFunction(_) => ErrorKind::UnknownFunction,
            Self::Transport(_) | Self::Network(_) => ErrorKind::Transport,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Decode(_) => ErrorKind::Decode,
            Self::SchemaViolation(_) => ErrorKind::SchemaViolation,
            Self::ProviderRejected(_) => ErrorKind::ProviderRejected,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Check if this is a retryable (transient) error.
    ///
    /// Transport, timeout and rate-limit failures are transient by nature;
    /// decode and schema failures count as transient too, since model output
    /// variance means another attempt may well conform.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Network(_)
                | Self::RateLimited(_)
                | Self::Timeout(_)
                | Self::Decode(_)
                | Self::SchemaViolation(_)
        )
    }

    /// Check if this error terminates an invocation without further retries
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}
