//! Permission service: cached decisions over the evaluator

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use permit_core::{
    bootstrap_permissions, EffectiveGrants, Permission, PermissionChecker, PermissionDefinition,
    PermittedResponse, RbacRole, Result,
};

use crate::cache::{DecisionCache, DecisionKey};
use crate::catalog::GrantCatalog;
use crate::config::EngineSettings;
use crate::evaluator::PermissionEvaluator;

/// Entry point for the API layer
#[derive(Debug, Clone)]
pub struct PermissionService {
    evaluator: Arc<PermissionEvaluator>,
    cache: Option<Arc<DecisionCache>>,
}

impl PermissionService {
    pub fn new(catalog: GrantCatalog, settings: &EngineSettings) -> Self {
        let cache = settings
            .cache
            .enabled
            .then(|| Arc::new(DecisionCache::from_settings(&settings.cache)));

        Self {
            evaluator: Arc::new(PermissionEvaluator::new(catalog)),
            cache,
        }
    }

    /// A service that evaluates every request against live grant data
    pub fn uncached(catalog: GrantCatalog) -> Self {
        Self {
            evaluator: Arc::new(PermissionEvaluator::new(catalog)),
            cache: None,
        }
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    pub fn cache(&self) -> Option<&DecisionCache> {
        self.cache.as_deref()
    }

    /// Everything `principal` holds; never cached
    pub async fn effective_grants(&self, principal: &str) -> Result<EffectiveGrants> {
        self.evaluator.effective_grants(principal).await
    }

    /// Permissions that may appear in grants
    pub fn assignable_permissions(&self) -> &'static [PermissionDefinition] {
        bootstrap_permissions()
    }

    /// Roles currently defined in the grant store
    pub async fn assignable_roles(&self) -> Result<Vec<RbacRole>> {
        self.evaluator.catalog().roles().await
    }
}

#[async_trait]
impl PermissionChecker for PermissionService {
    #[instrument(skip(self, permissions), fields(requested = permissions.len()))]
    async fn is_user_permitted(
        &self,
        principal: &str,
        permissions: &[Permission],
        resource_id: &str,
    ) -> Result<PermittedResponse> {
        let Some(cache) = &self.cache else {
            return self
                .evaluator
                .is_user_permitted(principal, permissions, resource_id)
                .await;
        };

        let key = DecisionKey::new(principal, permissions, resource_id);
        cache
            .get_or_evaluate(key, || {
                debug!(principal = %principal, resource = %resource_id, "Decision cache miss");
                self.evaluator
                    .is_user_permitted(principal, permissions, resource_id)
            })
            .await
    }

    async fn invalidate_decision_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.reset().await;
        }
    }
}
