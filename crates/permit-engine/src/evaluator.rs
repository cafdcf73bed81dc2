//! Permission evaluation
//!
//! Merges permissions reachable through every provenance path whose scope
//! covers the requested resource, then checks each requested permission
//! against that merged set. Evaluation over a snapshot is a pure function;
//! the only suspension point is fetching the snapshot.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use permit_core::{
    is_known_permission, EffectiveGrants, GrantRef, Permission, PermittedResponse, Result,
};

use crate::candidate::{candidates, CandidateGrant};
use crate::catalog::{GrantCatalog, GrantSnapshot};
use crate::groups::GroupResolver;
use crate::roles::RoleExpander;

/// Effective permission set for one principal on one resource,
/// with the records that contributed each permission
pub type EffectivePermissions = BTreeMap<Permission, BTreeSet<GrantRef>>;

/// Stateless evaluator over injected grant sources
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    catalog: GrantCatalog,
}

impl PermissionEvaluator {
    pub fn new(catalog: GrantCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &GrantCatalog {
        &self.catalog
    }

    /// Decide every requested permission for `principal` on `resource_id`
    #[instrument(skip(self, permissions), fields(requested = permissions.len()))]
    pub async fn is_user_permitted(
        &self,
        principal: &str,
        permissions: &[Permission],
        resource_id: &str,
    ) -> Result<PermittedResponse> {
        if permissions.is_empty() {
            return Ok(PermittedResponse::new());
        }

        let snapshot = self.catalog.snapshot().await?;
        Ok(evaluate(&snapshot, principal, permissions, resource_id))
    }

    /// Everything `principal` holds, on any resource
    #[instrument(skip(self))]
    pub async fn effective_grants(&self, principal: &str) -> Result<EffectiveGrants> {
        let snapshot = self.catalog.snapshot().await?;
        Ok(collect_effective_grants(&snapshot, principal))
    }
}

/// Union of permissions from all candidate grants held by `principal` that apply to `resource_id`
pub fn effective_permissions(
    snapshot: &GrantSnapshot,
    principal: &str,
    resource_id: &str,
) -> EffectivePermissions {
    let groups = GroupResolver::new(&snapshot.groups).groups_containing(principal);
    let roles = RoleExpander::new(&snapshot.roles, &snapshot.permission_grants);

    let mut effective = EffectivePermissions::new();
    for candidate in candidates(snapshot, &roles)
        .filter(|c| c.is_held_by(principal, &groups) && c.applies_to(resource_id))
    {
        let source = candidate.grant_ref();
        for permission in candidate.permissions() {
            effective.entry(permission).or_default().insert(source);
        }
    }
    effective
}

/// Build the permission matrix for one request
pub fn evaluate(
    snapshot: &GrantSnapshot,
    principal: &str,
    permissions: &[Permission],
    resource_id: &str,
) -> PermittedResponse {
    let effective = effective_permissions(snapshot, principal, resource_id);

    let mut response = PermittedResponse::new();
    let mut granted_by = BTreeSet::new();
    for permission in permissions {
        if !is_known_permission(permission) {
            debug!(permission = %permission, "Requested permission is not in the bootstrap catalog");
        }
        let sources = effective.get(permission);
        if let Some(sources) = sources {
            granted_by.extend(sources.iter().copied());
        }
        response.record(resource_id, permission, sources.is_some());
    }
    response.granted_by = granted_by.into_iter().collect();

    debug!(
        principal = %principal,
        resource = %resource_id,
        effective = effective.len(),
        permitted = response.permitted(),
        "Evaluated permission request"
    );
    response
}

/// Collect every record held by `principal`, regardless of scope
pub fn collect_effective_grants(snapshot: &GrantSnapshot, principal: &str) -> EffectiveGrants {
    let resolver = GroupResolver::new(&snapshot.groups);
    let groups = resolver.groups_containing(principal);
    let roles = RoleExpander::new(&snapshot.roles, &snapshot.permission_grants);

    let mut grants = EffectiveGrants {
        principal: principal.to_string(),
        groups: resolver.groups_of(principal).cloned().collect(),
        ..Default::default()
    };

    for candidate in candidates(snapshot, &roles).filter(|c| c.is_held_by(principal, &groups)) {
        match candidate {
            CandidateGrant::Policy(policy) => grants.access_policies.push(policy.clone()),
            CandidateGrant::Permission(grant) => grants.permission_grants.push(grant.clone()),
            CandidateGrant::Role { grant, permissions } => {
                grants.role_grants.push(grant.clone());
                if roles.is_defined(&grant.role_id) {
                    grants
                        .role_permissions
                        .insert(grant.role_id, permissions.clone());
                }
            }
        }
    }
    grants
}
