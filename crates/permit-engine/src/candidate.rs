//! Candidate grants: one shape for all provenance paths
//!
//! Each stored scheme becomes one variant carrying only the fields that scheme
//! uses. The evaluator folds every candidate through the same holder check,
//! scope check and permission union, so none of those steps needs to know
//! where a grant came from.

use std::collections::BTreeSet;

use permit_core::{
    AccessPolicy, AssignedEntity, Entity, GrantRef, GroupId, Permission, RbacPermissionGrant,
    RbacRoleGrant,
};

use crate::catalog::GrantSnapshot;
use crate::roles::RoleExpander;
use crate::scope;

#[derive(Debug, Clone, Copy)]
pub enum CandidateGrant<'a> {
    /// Legacy access policy reaching users directly or through groups
    Policy(&'a AccessPolicy),
    /// Direct grant of one permission
    Permission(&'a RbacPermissionGrant),
    /// Role grant with the permissions its role expands to
    Role {
        grant: &'a RbacRoleGrant,
        permissions: &'a BTreeSet<Permission>,
    },
}

fn assignee_is(assignee: &AssignedEntity, principal: &str, groups: &BTreeSet<GroupId>) -> bool {
    match assignee {
        AssignedEntity::User(user) => user == principal,
        AssignedEntity::Group(group_id) => groups.contains(group_id),
        AssignedEntity::Role(_) => false,
    }
}

impl<'a> CandidateGrant<'a> {
    /// Whether the principal holds this grant, itself or via one of `groups`
    pub fn is_held_by(&self, principal: &str, groups: &BTreeSet<GroupId>) -> bool {
        match self {
            CandidateGrant::Policy(policy) => policy.entities.iter().any(|entity| match entity {
                Entity::User(user) => user == principal,
                Entity::Group(group_id) => groups.contains(group_id),
            }),
            CandidateGrant::Permission(grant) => assignee_is(&grant.assignee, principal, groups),
            CandidateGrant::Role { grant, .. } => assignee_is(&grant.assignee, principal, groups),
        }
    }

    /// Whether this grant's scope covers `resource_id`
    pub fn applies_to(&self, resource_id: &str) -> bool {
        match self {
            CandidateGrant::Policy(policy) => policy
                .object_ids
                .iter()
                .any(|object_id| scope::matches(policy.access_type, object_id, resource_id)),
            CandidateGrant::Permission(grant) => {
                scope::matches(grant.access_type, &grant.resource, resource_id)
            }
            CandidateGrant::Role { grant, .. } => {
                scope::matches(grant.access_type, &grant.resource, resource_id)
            }
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            CandidateGrant::Policy(policy) => policy.permissions().cloned().collect(),
            CandidateGrant::Permission(grant) => vec![grant.as_permission()],
            CandidateGrant::Role { permissions, .. } => permissions.iter().cloned().collect(),
        }
    }

    pub fn grant_ref(&self) -> GrantRef {
        match self {
            CandidateGrant::Policy(policy) => GrantRef::AccessPolicy { id: policy.id },
            CandidateGrant::Permission(grant) => GrantRef::PermissionGrant { id: grant.id },
            CandidateGrant::Role { grant, .. } => GrantRef::RoleGrant {
                id: grant.id,
                role_id: grant.role_id,
            },
        }
    }
}

/// Every candidate grant in a snapshot, across all provenance paths
pub fn candidates<'a>(
    snapshot: &'a GrantSnapshot,
    roles: &'a RoleExpander,
) -> impl Iterator<Item = CandidateGrant<'a>> + 'a {
    let policies = snapshot.access_policies.iter().map(CandidateGrant::Policy);
    let permissions = snapshot
        .permission_grants
        .iter()
        .filter(|grant| !matches!(grant.assignee, AssignedEntity::Role(_)))
        .map(CandidateGrant::Permission);
    let role_grants = snapshot.role_grants.iter().map(move |grant| CandidateGrant::Role {
        grant,
        permissions: roles.permissions_for_role(&grant.role_id),
    });

    policies.chain(permissions).chain(role_grants)
}
