//! Role expansion for the role-grant path

use permit_core::{AssignedEntity, Permission, RbacPermissionGrant, RbacRole, RoleId};
use std::collections::{BTreeSet, HashMap};

/// Maps role ids to the concrete permissions each role confers
///
/// Role definitions are permission grants assigned to the role. Only roles
/// present in the role list are expanded; a grant that references a missing
/// role confers nothing.
#[derive(Debug, Clone, Default)]
pub struct RoleExpander {
    definitions: HashMap<RoleId, BTreeSet<Permission>>,
    empty: BTreeSet<Permission>,
}

impl RoleExpander {
    pub fn new(roles: &[RbacRole], permission_grants: &[RbacPermissionGrant]) -> Self {
        let mut definitions: HashMap<RoleId, BTreeSet<Permission>> =
            roles.iter().map(|r| (r.id, BTreeSet::new())).collect();

        for grant in permission_grants {
            if let AssignedEntity::Role(role_id) = &grant.assignee {
                if let Some(permissions) = definitions.get_mut(role_id) {
                    permissions.insert(grant.as_permission());
                }
            }
        }

        Self {
            definitions,
            empty: BTreeSet::new(),
        }
    }

    /// Permissions conferred by `role_id`; empty for unknown roles
    pub fn permissions_for_role(&self, role_id: &RoleId) -> &BTreeSet<Permission> {
        self.definitions.get(role_id).unwrap_or(&self.empty)
    }

    pub fn is_defined(&self, role_id: &RoleId) -> bool {
        self.definitions.contains_key(role_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permit_core::AccessType;

    fn role(name: &str) -> RbacRole {
        RbacRole::new("system", name, "", AccessType::Capability)
    }

    fn definition(role_id: RoleId, namespace: &str, name: &str) -> RbacPermissionGrant {
        RbacPermissionGrant::new(
            AssignedEntity::Role(role_id),
            &Permission::new(namespace, name),
            AccessType::Global,
            "",
        )
    }

    #[test]
    fn test_expands_role_definitions() {
        let reader = role("Reader");
        let grants = vec![
            definition(reader.id, "topics", "read-public"),
            definition(reader.id, "topics", "read-private"),
        ];
        let expander = RoleExpander::new(std::slice::from_ref(&reader), &grants);

        let permissions = expander.permissions_for_role(&reader.id);
        assert_eq!(permissions.len(), 2);
        assert!(permissions.contains(&Permission::new("topics", "read-private")));
    }

    #[test]
    fn test_unknown_role_is_empty() {
        let expander = RoleExpander::new(&[], &[]);
        assert!(expander.permissions_for_role(&RoleId::new()).is_empty());
    }

    #[test]
    fn test_definitions_for_undefined_role_are_ignored() {
        let dangling = RoleId::new();
        let grants = vec![definition(dangling, "topics", "create")];
        let expander = RoleExpander::new(&[], &grants);

        assert!(!expander.is_defined(&dangling));
        assert!(expander.permissions_for_role(&dangling).is_empty());
    }

    #[test]
    fn test_user_grants_are_not_role_definitions() {
        let owner = role("Owner");
        let grants = vec![RbacPermissionGrant::new(
            AssignedEntity::user("owner@bar.com"),
            &Permission::new("topics", "create"),
            AccessType::Capability,
            "bar",
        )];
        let expander = RoleExpander::new(std::slice::from_ref(&owner), &grants);

        assert!(expander.is_defined(&owner.id));
        assert!(expander.permissions_for_role(&owner.id).is_empty());
    }
}
