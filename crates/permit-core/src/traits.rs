//! Core traits for the permission engine
//!
//! The engine reads grant data through the four query traits and never writes
//! it. Implementations belong to the persistence layer that owns the records.

use crate::{error::Result, models::*};
use async_trait::async_trait;

// =============================================================================
// Grant Storage Traits
// =============================================================================

/// Read access to legacy groups and their member lists
#[async_trait]
pub trait GroupQuery: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<Group>>;
}

/// Read access to legacy access policies
#[async_trait]
pub trait AccessPolicyQuery: Send + Sync {
    async fn list_access_policies(&self) -> Result<Vec<AccessPolicy>>;
}

/// Read access to direct permission grants, including role definitions
#[async_trait]
pub trait PermissionGrantQuery: Send + Sync {
    async fn list_permission_grants(&self) -> Result<Vec<RbacPermissionGrant>>;
}

/// Read access to roles and role grants
#[async_trait]
pub trait RoleGrantQuery: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<RbacRole>>;

    async fn list_role_grants(&self) -> Result<Vec<RbacRoleGrant>>;
}

// =============================================================================
// Decision Traits
// =============================================================================

/// Decision and invalidation entry points consumed by the API layer
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Check whether a principal holds every requested permission on a resource
    async fn is_user_permitted(
        &self,
        principal: &str,
        permissions: &[Permission],
        resource_id: &str,
    ) -> Result<PermittedResponse>;

    /// Drop every cached decision; call after any grant, policy, group or role write
    async fn invalidate_decision_cache(&self);
}
