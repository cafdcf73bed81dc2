//! Serializable grant fixtures

use serde::{Deserialize, Serialize};

use permit_core::{AccessPolicy, Group, RbacPermissionGrant, RbacRole, RbacRoleGrant};

/// Every grant record list in one document
///
/// Missing lists deserialize as empty, so a fixture only needs the records it uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantFixture {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub access_policies: Vec<AccessPolicy>,
    #[serde(default)]
    pub permission_grants: Vec<RbacPermissionGrant>,
    #[serde(default)]
    pub roles: Vec<RbacRole>,
    #[serde(default)]
    pub role_grants: Vec<RbacRoleGrant>,
}

impl GrantFixture {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
            && self.access_policies.is_empty()
            && self.permission_grants.is_empty()
            && self.roles.is_empty()
            && self.role_grants.is_empty()
    }
}
