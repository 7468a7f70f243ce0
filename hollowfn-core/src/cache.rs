//! Invocation cache: memoizes results of identical (spec, arguments) pairs.
//!
//! Identical arguments against a fixed prompt are assumed to have a stable
//! answer for the caller's purposes, so a hit short-circuits the whole
//! dispatch pipeline. Entries expire after a TTL to bound staleness and the
//! least recently used entry is evicted at capacity. The cache is never
//! required for correctness - disabling it changes latency, not outcomes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::types::{Arguments, InvocationResult};

/// Cache sizing and lifetime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of retained entries
    pub capacity: usize,
    /// Lifetime applied when the spec does not override it
    pub default_ttl: Duration,
    /// Master switch; when off the runtime skips the cache entirely
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            default_ttl: Duration::from_secs(600),
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Enable or disable caching
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Canonical JSON rendering of invocation arguments.
///
/// `serde_json` maps are BTree-backed, so collecting the arguments into a
/// `Map` sorts keys at every nesting level and two argument sets that differ
/// only in insertion order serialize identically.
pub fn canonical_arguments(arguments: &Arguments) -> String {
    let sorted: serde_json::Map<String, serde_json::Value> = arguments
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    serde_json::Value::Object(sorted).to_string()
}

/// Cache key: `sha256(specName + ":" + canonicalJson(arguments))`, hex-encoded
pub fn cache_key(spec_name: &str, arguments: &Arguments) -> String {
    let mut hasher = Sha256::new();
    hasher.update(spec_name.as_bytes());
    hasher.update(b":");
    hasher.update(canonical_arguments(arguments).as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    spec_name: String,
    result: InvocationResult,
    expires_at: Instant,
    last_used: u64,
}

/// Bounded in-memory cache of invocation results.
#[derive(Debug)]
pub struct InvocationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    capacity: usize,
    tick: AtomicU64,
}

impl InvocationCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            tick: AtomicU64::new(0),
        }
    }

    /// Look up an unexpired entry, bumping its recency on a hit
    pub async fn get(&self, key: &str) -> Option<InvocationResult> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                entry.last_used = self.tick.fetch_add(1, Ordering::Relaxed);
                Some(entry.result.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a result under `key`, evicting the least recently used entry
    /// when over capacity
    pub async fn put(
        &self,
        key: impl Into<String>,
        spec_name: impl Into<String>,
        result: InvocationResult,
        ttl: Duration,
    ) {
        let mut entries = self.entries.write().await;
        let key = key.into();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            if let Some(victim) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&victim);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                spec_name: spec_name.into(),
                result,
                expires_at: Instant::now() + ttl,
                last_used: self.tick.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    /// Drop every entry cached under `spec_name`.
    ///
    /// Called when a spec is replaced: a hit is only valid while the same
    /// spec version produced the key.
    pub async fn purge_spec(&self, spec_name: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.spec_name != spec_name);
    }

    /// Drop all entries
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of retained entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success(n: u64) -> InvocationResult {
        InvocationResult::success(json!(n), None)
    }

    fn args(pairs: &[(&str, serde_json::Value)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn canonical_arguments_are_order_independent() {
        let a = args(&[("b", json!(2)), ("a", json!(1))]);
        let b = args(&[("a", json!(1)), ("b", json!(2))]);
        assert_eq!(canonical_arguments(&a), canonical_arguments(&b));
        assert_eq!(cache_key("f", &a), cache_key("f", &b));
    }

    #[test]
    fn cache_key_separates_names_and_arguments() {
        let a = args(&[("x", json!(1))]);
        let b = args(&[("x", json!(2))]);
        assert_ne!(cache_key("f", &a), cache_key("f", &b));
        assert_ne!(cache_key("f", &a), cache_key("g", &a));
        assert_eq!(cache_key("f", &a).len(), 64);
    }

    #[tokio::test]
    async fn get_returns_stored_result() {
        let cache = InvocationCache::new(8);
        cache
            .put("k", "f", success(1), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await, Some(success(1)));
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = InvocationCache::new(8);
        cache
            .put("k", "f", success(1), Duration::from_secs(10))
            .await;

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn evicts_least_recently_used_at_capacity() {
        let cache = InvocationCache::new(2);
        let ttl = Duration::from_secs(60);
        cache.put("a", "f", success(1), ttl).await;
        cache.put("b", "f", success(2), ttl).await;

        // Touch "a" so "b" becomes the eviction victim
        cache.get("a").await;
        cache.put("c", "f", success(3), ttl).await;

        assert!(cache.get("a").await.is_some());
        assert!(cache.get("b").await.is_none());
        assert!(cache.get("c").await.is_some());
    }

    #[tokio::test]
    async fn purge_spec_drops_only_matching_entries() {
        let cache = InvocationCache::new(8);
        let ttl = Duration::from_secs(60);
        cache.put("k1", "f", success(1), ttl).await;
        cache.put("k2", "g", success(2), ttl).await;

        cache.purge_spec("f").await;
        assert!(cache.get("k1").await.is_none());
        assert!(cache.get("k2").await.is_some());
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let cache = InvocationCache::new(8);
        cache
            .put("k", "f", success(1), Duration::from_secs(60))
            .await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
