//! HollowRuntime implementation.
//!
//! The runtime is constructed with an `InferenceProvider` and holds the
//! read-only spec registry, the invocation cache and the in-flight map used
//! to coalesce concurrent identical requests. It is the sole execution entry
//! point: `invoke` and its variants never return an error, only a classified
//! `InvocationResult`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::cache::{cache_key, CacheConfig, InvocationCache};
use crate::decode;
use crate::error::{ErrorKind, HollowError};
use crate::layer::Layer;
use crate::prompt;
use crate::provider::InferenceProvider;
use crate::retry::{RetryController, RetryDecision};
use crate::types::{
    Arguments, CompletionRequest, FunctionSpec, InvocationContext, InvocationResult,
    InvokeOptions, ProviderInfo, Usage,
};

/// Type-erased provider shared across invocations
type BoxedProvider = Arc<dyn InferenceProvider>;

/// Builder for composing a runtime from a provider, layers and cache config.
///
/// Layers use static dispatch while building: each `layer()` call wraps the
/// previous provider in a new concrete type, and `finish()` erases the stack
/// once.
///
/// # Example
///
/// ```ignore
/// let runtime = HollowRuntime::builder(provider)
///     .layer(LoggingLayer::new())
///     .cache(CacheConfig::new().with_capacity(512))
///     .finish();
/// ```
pub struct HollowRuntimeBuilder<P> {
    provider: P,
    cache: CacheConfig,
    coalesce: bool,
}

impl<P: InferenceProvider> HollowRuntimeBuilder<P> {
    /// Create a new builder with a provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: CacheConfig::default(),
            coalesce: true,
        }
    }

    /// Add a layer to wrap the provider
    pub fn layer<L>(self, layer: L) -> HollowRuntimeBuilder<L::LayeredProvider>
    where
        L: Layer<P>,
    {
        HollowRuntimeBuilder {
            provider: layer.layer(self.provider),
            cache: self.cache,
            coalesce: self.coalesce,
        }
    }

    /// Set the cache configuration
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Enable or disable coalescing of concurrent identical invocations.
    ///
    /// On by default: a caller arriving while an identical cacheable request
    /// is in flight waits for that result instead of dispatching its own.
    pub fn coalesce(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// Finish building and create a HollowRuntime
    pub fn finish(self) -> HollowRuntime {
        HollowRuntime {
            provider: Arc::new(self.provider),
            registry: DashMap::new(),
            cache: InvocationCache::new(self.cache.capacity),
            cache_config: self.cache,
            in_flight: DashMap::new(),
            coalesce: self.coalesce,
        }
    }
}

/// The hollow function runtime.
pub struct HollowRuntime {
    provider: BoxedProvider,
    registry: DashMap<String, Arc<FunctionSpec>>,
    cache: InvocationCache,
    cache_config: CacheConfig,
    in_flight: DashMap<String, broadcast::Sender<InvocationResult>>,
    coalesce: bool,
}

enum CoalesceRole {
    Leader(broadcast::Sender<InvocationResult>),
    Waiter(broadcast::Receiver<InvocationResult>),
}

impl HollowRuntime {
    /// Create a new builder
    pub fn builder<P: InferenceProvider>(provider: P) -> HollowRuntimeBuilder<P> {
        HollowRuntimeBuilder::new(provider)
    }

    /// Get provider information
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.provider.info()
    }

    /// Register a function spec, failing if the name is already taken
    pub fn register(&self, spec: FunctionSpec) -> Result<(), HollowError> {
        match self.registry.entry(spec.name.clone()) {
            Entry::Occupied(_) => Err(HollowError::DuplicateName(spec.name)),
            Entry::Vacant(vacant) => {
                tracing::debug!(function = %spec.name, "registered function spec");
                vacant.insert(Arc::new(spec));
                Ok(())
            }
        }
    }

    /// Replace a spec, purging cache entries keyed under its name.
    ///
    /// A cached hit is only valid while the same spec version produced it.
    pub async fn replace(&self, spec: FunctionSpec) {
        let name = spec.name.clone();
        self.registry.insert(name.clone(), Arc::new(spec));
        self.cache.purge_spec(&name).await;
        tracing::debug!(function = %name, "replaced function spec, cache purged");
    }

    /// Look up a registered spec by name
    pub fn spec(&self, name: &str) -> Option<Arc<FunctionSpec>> {
        self.registry.get(name).map(|entry| entry.value().clone())
    }

    /// Invoke a registered hollow function with default options
    pub async fn invoke(&self, name: &str, arguments: Arguments) -> InvocationResult {
        self.invoke_with_opts(name, arguments, InvokeOptions::default())
            .await
    }

    /// Invoke with per-call options
    pub async fn invoke_with_opts(
        &self,
        name: &str,
        arguments: Arguments,
        opts: InvokeOptions,
    ) -> InvocationResult {
        self.invoke_cancellable(name, arguments, opts, CancellationToken::new())
            .await
    }

    /// Invoke with a cancellation token.
    ///
    /// Cancelling aborts the in-flight provider call, skips any remaining
    /// retries and yields `Failed` with kind `Cancelled` - never a partial
    /// success.
    pub async fn invoke_cancellable(
        &self,
        name: &str,
        arguments: Arguments,
        opts: InvokeOptions,
        cancel: CancellationToken,
    ) -> InvocationResult {
        let Some(spec) = self.spec(name) else {
            return InvocationResult::failed(&HollowError::UnknownFunction(name.to_string()), None);
        };

        let ctx = InvocationContext::new(&spec.name);
        let use_cache = self.cache_config.enabled && spec.cache_enabled && !opts.no_cache;
        let key = cache_key(&spec.name, &arguments);

        if use_cache {
            if let Some(hit) = self.cache.get(&key).await {
                tracing::debug!(
                    invocation_id = %ctx.invocation_id,
                    function = %ctx.function,
                    "cache hit"
                );
                return hit;
            }
        }

        let leader = if self.coalesce && use_cache {
            match self.join_in_flight(&key) {
                CoalesceRole::Leader(tx) => Some(tx),
                CoalesceRole::Waiter(mut rx) => {
                    tracing::debug!(
                        invocation_id = %ctx.invocation_id,
                        function = %ctx.function,
                        "waiting on in-flight identical request"
                    );
                    match rx.recv().await {
                        Ok(result) => return result,
                        // Leader vanished without publishing (dropped or
                        // cancelled); dispatch independently.
                        Err(_) => {
                            self.in_flight.remove(&key);
                            None
                        }
                    }
                }
            }
        } else {
            None
        };

        let result = self.execute(&spec, &arguments, &opts, &cancel, &ctx).await;

        if use_cache && result.is_success() {
            let ttl = spec.cache_ttl.unwrap_or(self.cache_config.default_ttl);
            self.cache
                .put(key.clone(), spec.name.clone(), result.clone(), ttl)
                .await;
        }

        if let Some(tx) = leader {
            self.in_flight.remove(&key);
            // Cancellation and the caller's own deadline are private to the
            // leader. Dropping the sender without publishing sends waiters
            // down their independent-dispatch path instead of handing them
            // an outcome they never asked for.
            if !matches!(
                result.error_kind(),
                Some(ErrorKind::Cancelled | ErrorKind::Timeout)
            ) {
                let _ = tx.send(result.clone());
            }
        }

        result
    }

    /// Atomically become the leader for a key or subscribe to the current one
    fn join_in_flight(&self, key: &str) -> CoalesceRole {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(occupied) => CoalesceRole::Waiter(occupied.get().subscribe()),
            Entry::Vacant(vacant) => {
                let (tx, _rx) = broadcast::channel(4);
                vacant.insert(tx.clone());
                CoalesceRole::Leader(tx)
            }
        }
    }

    /// Compile and run the attempt loop under the overall deadline
    async fn execute(
        &self,
        spec: &FunctionSpec,
        arguments: &Arguments,
        opts: &InvokeOptions,
        cancel: &CancellationToken,
        ctx: &InvocationContext,
    ) -> InvocationResult {
        // Caller errors surface immediately, before any dispatch
        let compiled = match prompt::compile(spec, arguments) {
            Ok(compiled) => compiled,
            Err(error) => {
                tracing::warn!(
                    invocation_id = %ctx.invocation_id,
                    function = %ctx.function,
                    %error,
                    "prompt compilation failed"
                );
                return InvocationResult::failed(&error, None);
            }
        };

        let work = self.dispatch_loop(spec, compiled.into_request(), cancel, ctx);
        match opts.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, work).await {
                Ok(result) => result,
                Err(_) => InvocationResult::failed(
                    &HollowError::timeout(format!(
                        "overall invocation deadline of {:?} exceeded",
                        deadline
                    )),
                    None,
                ),
            },
            None => work.await,
        }
    }

    /// Retry state machine: dispatch, decode and validate until success,
    /// exhaustion or a terminal error
    async fn dispatch_loop(
        &self,
        spec: &FunctionSpec,
        request: CompletionRequest,
        cancel: &CancellationToken,
        ctx: &InvocationContext,
    ) -> InvocationResult {
        let mut controller = RetryController::new(spec.retry.clone());
        let mut last_raw: Option<String> = None;

        loop {
            let attempt = controller.begin_attempt();
            tracing::debug!(
                invocation_id = %ctx.invocation_id,
                function = %ctx.function,
                attempt,
                "dispatching"
            );

            match self
                .attempt(spec, &request, cancel, controller.attempt_timeout())
                .await
            {
                Ok((value, usage)) => {
                    controller.succeed();
                    tracing::debug!(
                        invocation_id = %ctx.invocation_id,
                        function = %ctx.function,
                        attempt,
                        "invocation succeeded"
                    );
                    return InvocationResult::success(value, usage);
                }
                Err((error, raw)) => {
                    if raw.is_some() {
                        last_raw = raw;
                    }

                    if matches!(error, HollowError::Cancelled) {
                        tracing::debug!(
                            invocation_id = %ctx.invocation_id,
                            function = %ctx.function,
                            "invocation cancelled"
                        );
                        return InvocationResult::failed(&error, last_raw.as_deref());
                    }

                    match controller.fail(&error) {
                        RetryDecision::Retry { delay } => {
                            tracing::warn!(
                                invocation_id = %ctx.invocation_id,
                                function = %ctx.function,
                                attempt,
                                %error,
                                ?delay,
                                "attempt failed, backing off"
                            );
                            tokio::select! {
                                _ = cancel.cancelled() => {
                                    return InvocationResult::failed(
                                        &HollowError::Cancelled,
                                        last_raw.as_deref(),
                                    );
                                }
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        RetryDecision::Exhausted => {
                            tracing::warn!(
                                invocation_id = %ctx.invocation_id,
                                function = %ctx.function,
                                attempts = controller.attempts(),
                                %error,
                                "invocation failed"
                            );
                            return InvocationResult::failed(&error, last_raw.as_deref());
                        }
                    }
                }
            }
        }
    }

    /// One attempt: provider call under its deadline, then decode + validate.
    ///
    /// Failures after the provider returned carry the raw text so exhausted
    /// invocations can report a diagnostic snippet.
    async fn attempt(
        &self,
        spec: &FunctionSpec,
        request: &CompletionRequest,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<(Value, Option<Usage>), (HollowError, Option<String>)> {
        let call = self.provider.complete(request.clone());

        let raw = tokio::select! {
            _ = cancel.cancelled() => return Err((HollowError::Cancelled, None)),
            outcome = tokio::time::timeout(timeout, call) => match outcome {
                Ok(Ok(raw)) => raw,
                Ok(Err(error)) => return Err((error, None)),
                Err(_) => {
                    return Err((
                        HollowError::timeout(format!(
                            "per-attempt deadline of {:?} exceeded",
                            timeout
                        )),
                        None,
                    ))
                }
            },
        };

        let payload = decode::decode(&raw.text).map_err(|e| (e, Some(raw.text.clone())))?;
        let value = spec
            .output_schema
            .validate(&payload)
            .map_err(|e| (HollowError::from(e), Some(raw.text.clone())))?;

        Ok((value, raw.usage))
    }
}
