//! Grant catalog: read-only access to the four grant sources

use std::sync::Arc;
use tracing::{debug, instrument};

use permit_core::{
    AccessPolicy, AccessPolicyQuery, Group, GroupQuery, PermissionGrantQuery, RbacPermissionGrant,
    RbacRole, RbacRoleGrant, Result, RoleGrantQuery,
};

/// Point-in-time copy of every grant record the evaluator reads
#[derive(Debug, Clone, Default)]
pub struct GrantSnapshot {
    pub groups: Vec<Group>,
    pub access_policies: Vec<AccessPolicy>,
    pub permission_grants: Vec<RbacPermissionGrant>,
    pub roles: Vec<RbacRole>,
    pub role_grants: Vec<RbacRoleGrant>,
}

/// Bundles the externally-owned query contracts
#[derive(Clone)]
pub struct GrantCatalog {
    groups: Arc<dyn GroupQuery>,
    access_policies: Arc<dyn AccessPolicyQuery>,
    permission_grants: Arc<dyn PermissionGrantQuery>,
    role_grants: Arc<dyn RoleGrantQuery>,
}

impl GrantCatalog {
    pub fn new(
        groups: Arc<dyn GroupQuery>,
        access_policies: Arc<dyn AccessPolicyQuery>,
        permission_grants: Arc<dyn PermissionGrantQuery>,
        role_grants: Arc<dyn RoleGrantQuery>,
    ) -> Self {
        Self {
            groups,
            access_policies,
            permission_grants,
            role_grants,
        }
    }

    /// Build a catalog from one store that serves every source
    pub fn from_source<S>(source: Arc<S>) -> Self
    where
        S: GroupQuery + AccessPolicyQuery + PermissionGrantQuery + RoleGrantQuery + 'static,
    {
        Self {
            groups: source.clone(),
            access_policies: source.clone(),
            permission_grants: source.clone(),
            role_grants: source,
        }
    }

    /// Fetch all sources concurrently
    ///
    /// The reads are independent, so they run joined; the first failure wins.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> Result<GrantSnapshot> {
        let (groups, access_policies, permission_grants, roles, role_grants) = tokio::try_join!(
            self.groups.list_groups(),
            self.access_policies.list_access_policies(),
            self.permission_grants.list_permission_grants(),
            self.role_grants.list_roles(),
            self.role_grants.list_role_grants(),
        )?;

        debug!(
            groups = groups.len(),
            access_policies = access_policies.len(),
            permission_grants = permission_grants.len(),
            roles = roles.len(),
            role_grants = role_grants.len(),
            "Loaded grant snapshot"
        );

        Ok(GrantSnapshot {
            groups,
            access_policies,
            permission_grants,
            roles,
            role_grants,
        })
    }

    pub async fn roles(&self) -> Result<Vec<RbacRole>> {
        self.role_grants.list_roles().await
    }
}

impl std::fmt::Debug for GrantCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantCatalog").finish_non_exhaustive()
    }
}
