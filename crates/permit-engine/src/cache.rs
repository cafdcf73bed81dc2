//! Decision cache with explicit reset
//!
//! Decisions are memoized per `(principal, permissions, resource)` until the
//! cache is reset. A reset swaps in a fresh generation, so an evaluation that
//! was in flight when the reset happened stores its result in the retired
//! generation and can never resurface as a stale answer.

use moka::future::Cache;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use permit_core::{Permission, PermittedResponse, Result};

use crate::config::CacheSettings;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for a permission decision
///
/// Requested permissions are stored sorted and deduplicated, so requests that
/// differ only in order or repetition share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    principal: String,
    permissions: Vec<String>,
    resource_id: String,
}

impl DecisionKey {
    pub fn new(principal: &str, permissions: &[Permission], resource_id: &str) -> Self {
        let mut keys: Vec<String> = permissions.iter().map(Permission::key).collect();
        keys.sort();
        keys.dedup();

        Self {
            principal: principal.to_string(),
            permissions: keys,
            resource_id: resource_id.to_string(),
        }
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Cache metrics for monitoring
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub invalidations: AtomicU64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

// =============================================================================
// Decision Cache
// =============================================================================

struct Generation {
    number: u64,
    decisions: Cache<DecisionKey, PermittedResponse>,
}

impl Generation {
    fn new(number: u64, max_capacity: u64) -> Arc<Self> {
        Arc::new(Self {
            number,
            decisions: Cache::builder().max_capacity(max_capacity).build(),
        })
    }
}

pub struct DecisionCache {
    max_capacity: u64,
    current: RwLock<Arc<Generation>>,
    next_generation: AtomicU64,
    metrics: Arc<CacheMetrics>,
}

impl DecisionCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            current: RwLock::new(Generation::new(0, max_capacity)),
            next_generation: AtomicU64::new(1),
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.max_capacity)
    }

    /// Return the cached decision for `key`, or run `evaluate` and remember its result
    ///
    /// Failed evaluations are never cached.
    pub async fn get_or_evaluate<F, Fut>(&self, key: DecisionKey, evaluate: F) -> Result<PermittedResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PermittedResponse>>,
    {
        let generation = self.current.read().await.clone();

        if let Some(cached) = generation.decisions.get(&key).await {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            debug!(generation = generation.number, "Decision cache hit");
            return Ok(cached);
        }

        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        let response = evaluate().await?;
        generation.decisions.insert(key, response.clone()).await;
        Ok(response)
    }

    /// Discard every cached decision
    pub async fn reset(&self) {
        let number = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let retired = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, Generation::new(number, self.max_capacity))
        };
        retired.decisions.invalidate_all();
        self.metrics.invalidations.fetch_add(1, Ordering::Relaxed);

        info!(
            retired = retired.number,
            generation = number,
            "Decision cache reset"
        );
    }

    /// Number of the generation currently serving lookups
    pub async fn generation(&self) -> u64 {
        self.current.read().await.number
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for DecisionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCache")
            .field("max_capacity", &self.max_capacity)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permit_core::PermitError;
    use std::sync::atomic::AtomicUsize;

    fn granted() -> PermittedResponse {
        let mut response = PermittedResponse::new();
        response.record("test01", &Permission::new("topics", "create"), true);
        response
    }

    #[test]
    fn test_key_ignores_order_and_duplicates() {
        let create = Permission::new("topics", "create");
        let read = Permission::new("topics", "read-public");

        let a = DecisionKey::new("test01@dfds.cloud", &[create.clone(), read.clone()], "test01");
        let b = DecisionKey::new("test01@dfds.cloud", &[read, create.clone(), create], "test01");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_resource() {
        let create = [Permission::new("topics", "create")];
        assert_ne!(
            DecisionKey::new("test01@dfds.cloud", &create, "test01"),
            DecisionKey::new("test01@dfds.cloud", &create, "test02"),
        );
    }

    #[tokio::test]
    async fn test_second_lookup_is_a_hit() {
        let cache = DecisionCache::new(100);
        let calls = AtomicUsize::new(0);
        let key = DecisionKey::new("test01@dfds.cloud", &[Permission::new("topics", "create")], "test01");

        for _ in 0..2 {
            let response = cache
                .get_or_evaluate(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(granted())
                })
                .await
                .unwrap();
            assert!(response.permitted());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.metrics().hits.load(Ordering::Relaxed), 1);
        assert_eq!(cache.metrics().misses.load(Ordering::Relaxed), 1);
        assert!((cache.metrics().hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = DecisionCache::new(100);
        let key = DecisionKey::new("test01@dfds.cloud", &[Permission::new("topics", "create")], "test01");

        let failed = cache
            .get_or_evaluate(key.clone(), || async { Err(PermitError::storage_error("down")) })
            .await;
        assert!(failed.is_err());

        let recovered = cache
            .get_or_evaluate(key, || async { Ok(granted()) })
            .await
            .unwrap();
        assert!(recovered.permitted());
        assert_eq!(cache.metrics().hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_reset_discards_decisions() {
        let cache = DecisionCache::new(100);
        let key = DecisionKey::new("test01@dfds.cloud", &[Permission::new("topics", "create")], "test01");

        cache
            .get_or_evaluate(key.clone(), || async { Ok(PermittedResponse::new()) })
            .await
            .unwrap();
        assert_eq!(cache.generation().await, 0);

        cache.reset().await;
        assert_eq!(cache.generation().await, 1);
        assert_eq!(cache.metrics().invalidations.load(Ordering::Relaxed), 1);

        let fresh = cache
            .get_or_evaluate(key, || async { Ok(granted()) })
            .await
            .unwrap();
        assert_eq!(fresh, granted());
    }

    #[tokio::test]
    async fn test_in_flight_result_lands_in_retired_generation() {
        let cache = DecisionCache::new(100);
        let key = DecisionKey::new("test01@dfds.cloud", &[Permission::new("topics", "create")], "test01");

        // The reset happens while the stale evaluation is still running
        let stale = cache
            .get_or_evaluate(key.clone(), || async {
                cache.reset().await;
                Ok(PermittedResponse::new())
            })
            .await
            .unwrap();
        assert!(stale.permission_matrix.is_empty());

        let fresh = cache
            .get_or_evaluate(key, || async { Ok(granted()) })
            .await
            .unwrap();
        assert_eq!(fresh, granted());
    }
}
