//! In-memory grant store
//!
//! Each record kind lives in its own `DashMap` table. Reads return records
//! ordered by id, which for v7 ids is creation order.
//!
//! Writes never touch a decision cache. Callers that evaluate through a
//! cached service must invalidate it after writing.

use async_trait::async_trait;
use dashmap::DashMap;
use std::hash::Hash;
use tracing::{debug, info, instrument};

use permit_core::{
    system_roles, AccessPolicy, AccessPolicyQuery, AccessType, AssignedEntity, Group, GroupId,
    GroupQuery, PermissionGrantId, PermissionGrantQuery, PermitError, PolicyId,
    RbacPermissionGrant, RbacRole, RbacRoleGrant, Result, RoleGrantId, RoleGrantQuery, RoleId,
    SYSTEM_OWNER,
};

use crate::fixture::GrantFixture;

#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    groups: DashMap<GroupId, Group>,
    access_policies: DashMap<PolicyId, AccessPolicy>,
    permission_grants: DashMap<PermissionGrantId, RbacPermissionGrant>,
    roles: DashMap<RoleId, RbacRole>,
    role_grants: DashMap<RoleGrantId, RbacRoleGrant>,
}

fn sorted_values<K, V>(table: &DashMap<K, V>) -> Vec<V>
where
    K: Eq + Hash + Ord + Copy,
    V: Clone,
{
    let mut entries: Vec<(K, V)> = table
        .iter()
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, value)| value).collect()
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PermitError::invalid_input(format!("{} must not be empty", field)));
    }
    Ok(())
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the system roles and their permission definitions
    pub fn with_system_roles() -> Self {
        let store = Self::new();
        for system_role in system_roles() {
            let mut role = RbacRole::new(
                SYSTEM_OWNER,
                system_role.name,
                system_role.description,
                AccessType::Capability,
            );
            role.id = system_role.id;
            store.roles.insert(role.id, role);

            for permission in &system_role.permissions {
                let definition = RbacPermissionGrant::new(
                    AssignedEntity::Role(system_role.id),
                    permission,
                    AccessType::Capability,
                    "",
                );
                store.permission_grants.insert(definition.id, definition);
            }
        }
        info!(roles = store.roles.len(), "Seeded system roles");
        store
    }

    /// Load every record of a fixture, validating each one
    ///
    /// References between records are not checked; a grant that names a
    /// missing group or role is stored and simply confers nothing.
    pub fn from_fixture(fixture: GrantFixture) -> Result<Self> {
        let store = Self::new();
        for group in fixture.groups {
            require_non_empty(&group.name, "group name")?;
            store.groups.insert(group.id, group);
        }
        for policy in fixture.access_policies {
            policy.validate()?;
            store.access_policies.insert(policy.id, policy);
        }
        for grant in fixture.permission_grants {
            grant.validate()?;
            store.permission_grants.insert(grant.id, grant);
        }
        for role in fixture.roles {
            require_non_empty(&role.name, "role name")?;
            store.roles.insert(role.id, role);
        }
        for grant in fixture.role_grants {
            grant.validate()?;
            store.role_grants.insert(grant.id, grant);
        }

        debug!(
            groups = store.groups.len(),
            access_policies = store.access_policies.len(),
            permission_grants = store.permission_grants.len(),
            roles = store.roles.len(),
            role_grants = store.role_grants.len(),
            "Loaded grant fixture"
        );
        Ok(store)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: GrantFixture = serde_json::from_str(json)
            .map_err(|e| PermitError::invalid_input(format!("malformed grant fixture: {}", e)))?;
        Self::from_fixture(fixture)
    }

    /// Export every stored record
    pub fn to_fixture(&self) -> GrantFixture {
        GrantFixture {
            groups: sorted_values(&self.groups),
            access_policies: sorted_values(&self.access_policies),
            permission_grants: sorted_values(&self.permission_grants),
            roles: sorted_values(&self.roles),
            role_grants: sorted_values(&self.role_grants),
        }
    }

    // =========================================================================
    // Groups
    // =========================================================================

    #[instrument(skip(self, group), fields(group_id = %group.id))]
    pub fn create_group(&self, group: Group) -> Result<GroupId> {
        require_non_empty(&group.name, "group name")?;
        let id = group.id;
        self.groups.insert(id, group);
        info!("Created group");
        Ok(id)
    }

    pub fn add_group_member(&self, group_id: GroupId, principal: &str) -> Result<()> {
        require_non_empty(principal, "principal")?;
        let mut group = self
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| PermitError::not_found(GroupId::label(), group_id.to_string()))?;
        group.members.insert(principal.to_string());
        debug!(group_id = %group_id, principal = %principal, "Added group member");
        Ok(())
    }

    /// Returns whether the principal was a member
    pub fn remove_group_member(&self, group_id: GroupId, principal: &str) -> Result<bool> {
        let mut group = self
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| PermitError::not_found(GroupId::label(), group_id.to_string()))?;
        Ok(group.members.remove(principal))
    }

    pub fn delete_group(&self, group_id: GroupId) -> Result<Group> {
        let (_, group) = self
            .groups
            .remove(&group_id)
            .ok_or_else(|| PermitError::not_found(GroupId::label(), group_id.to_string()))?;
        info!(group_id = %group_id, "Deleted group");
        Ok(group)
    }

    // =========================================================================
    // Access Policies
    // =========================================================================

    /// Insert or replace a legacy access policy
    pub fn put_access_policy(&self, policy: AccessPolicy) -> Result<PolicyId> {
        policy.validate()?;
        let id = policy.id;
        self.access_policies.insert(id, policy);
        info!(policy_id = %id, "Stored access policy");
        Ok(id)
    }

    pub fn delete_access_policy(&self, policy_id: PolicyId) -> Result<AccessPolicy> {
        let (_, policy) = self
            .access_policies
            .remove(&policy_id)
            .ok_or_else(|| PermitError::not_found(PolicyId::label(), policy_id.to_string()))?;
        info!(policy_id = %policy_id, "Deleted access policy");
        Ok(policy)
    }

    // =========================================================================
    // Permission Grants
    // =========================================================================

    /// Store a direct grant, or a role definition when assigned to a role
    #[instrument(skip(self, grant), fields(grant_id = %grant.id))]
    pub fn grant_permission(&self, grant: RbacPermissionGrant) -> Result<PermissionGrantId> {
        grant.validate()?;
        if let AssignedEntity::Role(role_id) = grant.assignee {
            if !self.roles.contains_key(&role_id) {
                return Err(PermitError::not_found(RoleId::label(), role_id.to_string()));
            }
        }
        let id = grant.id;
        self.permission_grants.insert(id, grant);
        info!("Granted permission");
        Ok(id)
    }

    pub fn revoke_permission(&self, grant_id: PermissionGrantId) -> Result<RbacPermissionGrant> {
        let (_, grant) = self
            .permission_grants
            .remove(&grant_id)
            .ok_or_else(|| PermitError::not_found(PermissionGrantId::label(), grant_id.to_string()))?;
        info!(grant_id = %grant_id, "Revoked permission");
        Ok(grant)
    }

    // =========================================================================
    // Roles & Role Grants
    // =========================================================================

    pub fn create_role(&self, role: RbacRole) -> Result<RoleId> {
        require_non_empty(&role.name, "role name")?;
        let id = role.id;
        self.roles.insert(id, role);
        info!(role_id = %id, "Created role");
        Ok(id)
    }

    /// Delete a role together with its permission definitions and every grant of it
    pub fn delete_role(&self, role_id: RoleId) -> Result<RbacRole> {
        let (_, role) = self
            .roles
            .remove(&role_id)
            .ok_or_else(|| PermitError::not_found(RoleId::label(), role_id.to_string()))?;

        let definitions_before = self.permission_grants.len();
        self.permission_grants
            .retain(|_, grant| grant.assignee != AssignedEntity::Role(role_id));
        let grants_before = self.role_grants.len();
        self.role_grants.retain(|_, grant| grant.role_id != role_id);

        info!(
            role_id = %role_id,
            definitions = definitions_before - self.permission_grants.len(),
            role_grants = grants_before - self.role_grants.len(),
            "Deleted role"
        );
        Ok(role)
    }

    #[instrument(skip(self, grant), fields(grant_id = %grant.id, role_id = %grant.role_id))]
    pub fn grant_role(&self, grant: RbacRoleGrant) -> Result<RoleGrantId> {
        grant.validate()?;
        if !self.roles.contains_key(&grant.role_id) {
            return Err(PermitError::not_found(RoleId::label(), grant.role_id.to_string()));
        }
        let id = grant.id;
        self.role_grants.insert(id, grant);
        info!("Granted role");
        Ok(id)
    }

    pub fn revoke_role(&self, grant_id: RoleGrantId) -> Result<RbacRoleGrant> {
        let (_, grant) = self
            .role_grants
            .remove(&grant_id)
            .ok_or_else(|| PermitError::not_found(RoleGrantId::label(), grant_id.to_string()))?;
        info!(grant_id = %grant_id, "Revoked role");
        Ok(grant)
    }
}

// =============================================================================
// Query Contracts
// =============================================================================

#[async_trait]
impl GroupQuery for MemoryGrantStore {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(sorted_values(&self.groups))
    }
}

#[async_trait]
impl AccessPolicyQuery for MemoryGrantStore {
    async fn list_access_policies(&self) -> Result<Vec<AccessPolicy>> {
        Ok(sorted_values(&self.access_policies))
    }
}

#[async_trait]
impl PermissionGrantQuery for MemoryGrantStore {
    async fn list_permission_grants(&self) -> Result<Vec<RbacPermissionGrant>> {
        Ok(sorted_values(&self.permission_grants))
    }
}

#[async_trait]
impl RoleGrantQuery for MemoryGrantStore {
    async fn list_roles(&self) -> Result<Vec<RbacRole>> {
        Ok(sorted_values(&self.roles))
    }

    async fn list_role_grants(&self) -> Result<Vec<RbacRoleGrant>> {
        Ok(sorted_values(&self.role_grants))
    }
}
