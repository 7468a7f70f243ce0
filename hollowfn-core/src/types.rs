//! Core types for hollow function invocation.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, HollowError};
use crate::retry::RetryPolicy;
use crate::schema::OutputSchema;

/// Maximum length of the raw response snippet carried in failed results
pub const RAW_SNIPPET_MAX: usize = 240;

/// One piece of a prompt template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    /// Inserted verbatim
    Literal { text: String },
    /// Resolved from the invocation arguments by name
    Placeholder { name: String },
}

/// Ordered sequence of literal and placeholder segments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PromptTemplate {
    pub segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Build a template from explicit segments
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a brace-delimited template string into segments.
    ///
    /// `{name}` introduces a placeholder; `{{` and `}}` produce literal
    /// braces. An unterminated `{...` is treated as literal text.
    ///
    /// ```
    /// use hollowfn_core::types::PromptTemplate;
    ///
    /// let t = PromptTemplate::parse("Is '{word}' in '{sentence}'?");
    /// assert_eq!(t.placeholder_names(), vec!["word", "sentence"]);
    /// ```
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if closed && !name.is_empty() {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal {
                                text: std::mem::take(&mut literal),
                            });
                        }
                        segments.push(Segment::Placeholder { name });
                    } else {
                        literal.push('{');
                        literal.push_str(&name);
                    }
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal { text: literal });
        }

        Self { segments }
    }

    /// Names of all placeholders, in template order
    pub fn placeholder_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder { name } => Some(name.as_str()),
                Segment::Literal { .. } => None,
            })
            .collect()
    }
}

/// Immutable descriptor of one hollow function.
///
/// Created at registration time, owned by the runtime's registry, never
/// mutated afterwards; its output schema is fixed for the spec's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    pub template: PromptTemplate,
    pub output_schema: OutputSchema,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub retry: RetryPolicy,
    /// Overrides the cache config's default TTL when set
    pub cache_ttl: Option<Duration>,
    pub cache_enabled: bool,
}

impl FunctionSpec {
    /// Create a spec with default generation and retry parameters
    pub fn new(
        name: impl Into<String>,
        template: PromptTemplate,
        output_schema: OutputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            output_schema,
            max_tokens: None,
            temperature: None,
            retry: RetryPolicy::default(),
            cache_ttl: None,
            cache_enabled: true,
        }
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the cache TTL for results of this function
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Enable or disable result caching for this function
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}

/// Arguments supplied to an invocation, keyed by placeholder name
pub type Arguments = HashMap<String, Value>;

/// A compiled, provider-ready prompt with its generation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPrompt {
    pub text: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompiledPrompt {
    /// Convert into the provider's request payload
    pub fn into_request(self) -> CompletionRequest {
        CompletionRequest {
            text: self.text,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// The narrow payload handed to an `InferenceProvider`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Unstructured provider output plus call metadata.
///
/// Owned by the response decoder for the duration of one attempt.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub text: String,
    pub usage: Option<Usage>,
    pub model: Option<String>,
    pub latency: Duration,
}

impl RawResponse {
    /// Create a raw response carrying only text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            model: None,
            latency: Duration::ZERO,
        }
    }
}

/// Terminal outcome of one invocation.
///
/// Either `Success` with a value provably conformant to the spec's output
/// schema, or `Failed` with a classified kind - never a partial result and
/// never a raised fault.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationResult {
    Success {
        value: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    Failed {
        kind: ErrorKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_snippet: Option<String>,
    },
}

impl InvocationResult {
    /// Build a success result
    pub fn success(value: Value, usage: Option<Usage>) -> Self {
        Self::Success { value, usage }
    }

    /// Build a failed result from an engine error, truncating the raw
    /// response snippet so diagnostics stay bounded
    pub fn failed(error: &HollowError, raw: Option<&str>) -> Self {
        Self::Failed {
            kind: error.kind(),
            message: error.to_string(),
            raw_snippet: raw.map(truncate_snippet),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The validated value, if this invocation succeeded
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    /// The error kind, if this invocation failed
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }
}

fn truncate_snippet(raw: &str) -> String {
    if raw.len() <= RAW_SNIPPET_MAX {
        return raw.to_string();
    }
    let mut cut = RAW_SNIPPET_MAX;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &raw[..cut])
}

/// Per-call options for `invoke`
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Bypass the invocation cache for this call
    pub no_cache: bool,
    /// Overall deadline across all attempts; whichever of this and the
    /// per-attempt timeout is reached first short-circuits remaining retries
    pub timeout: Option<Duration>,
}

impl InvokeOptions {
    /// Disable the cache for this call
    pub fn no_cache() -> Self {
        Self {
            no_cache: true,
            timeout: None,
        }
    }

    /// Set the overall invocation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

/// Context threaded through one invocation for tracing
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub invocation_id: String,
    pub function: String,
}

impl InvocationContext {
    /// Create a context with a fresh invocation id
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            invocation_id: uuid::Uuid::new_v4().to_string(),
            function: function.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_splits_literals_and_placeholders() {
        let t = PromptTemplate::parse("Is '{word}' in '{sentence}'? Answer as JSON.");
        assert_eq!(
            t.segments,
            vec![
                Segment::Literal { text: "Is '".into() },
                Segment::Placeholder { name: "word".into() },
                Segment::Literal { text: "' in '".into() },
                Segment::Placeholder { name: "sentence".into() },
                Segment::Literal { text: "'? Answer as JSON.".into() },
            ]
        );
    }

    #[test]
    fn parse_handles_escaped_braces() {
        let t = PromptTemplate::parse("Return {{\"x\": 1}} for {input}");
        assert_eq!(t.placeholder_names(), vec!["input"]);
        match &t.segments[0] {
            Segment::Literal { text } => assert_eq!(text, "Return {\"x\": 1} for "),
            other => panic!("unexpected segment {:?}", other),
        }
    }

    #[test]
    fn parse_keeps_unterminated_brace_literal() {
        let t = PromptTemplate::parse("dangling {brace");
        assert_eq!(
            t.segments,
            vec![Segment::Literal { text: "dangling {brace".into() }]
        );
    }

    #[test]
    fn failed_result_truncates_snippet() {
        let long = "x".repeat(RAW_SNIPPET_MAX * 2);
        let result =
            InvocationResult::failed(&HollowError::decode("no fragment"), Some(&long));
        match result {
            InvocationResult::Failed { raw_snippet, .. } => {
                let snippet = raw_snippet.unwrap();
                assert!(snippet.chars().count() <= RAW_SNIPPET_MAX + 1);
                assert!(snippet.ends_with('…'));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn success_result_exposes_value() {
        let result = InvocationResult::success(json!(true), None);
        assert!(result.is_success());
        assert_eq!(result.value(), Some(&json!(true)));
        assert_eq!(result.error_kind(), None);
    }
}
