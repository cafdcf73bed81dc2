//! Domain models for the permission engine
//!
//! Authorization facts arrive through four historically separate schemes:
//! legacy group-based access policies, direct permission grants, role grants
//! and the static bootstrap catalog. The record types here mirror how each
//! scheme is stored; merging them into one decision is the engine's job.

use crate::error::{PermitError, Result};
use crate::ids::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Resource value meaning "every resource" on a global grant
pub const WILDCARD_RESOURCE: &str = "*";

// =============================================================================
// Permissions & Scopes
// =============================================================================

/// A named action within a namespace, e.g. `topics/create`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub namespace: String,
    pub name: String,
}

impl Permission {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// String form used as the permission matrix key: `namespace/name`
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl std::str::FromStr for Permission {
    type Err = PermitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, name))
            }
            _ => Err(PermitError::invalid_input(format!(
                "permission '{}' is not of the form namespace/name",
                s
            ))),
        }
    }
}

/// Scope tag carried by every grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Global,
    Capability,
    Aws,
    Azure,
}

impl AccessType {
    /// Only global grants may use the `*` resource
    pub fn honors_wildcard(&self) -> bool {
        matches!(self, AccessType::Global)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Global => "global",
            AccessType::Capability => "capability",
            AccessType::Aws => "aws",
            AccessType::Azure => "azure",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessType {
    type Err = PermitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(AccessType::Global),
            "capability" => Ok(AccessType::Capability),
            "aws" => Ok(AccessType::Aws),
            "azure" => Ok(AccessType::Azure),
            _ => Err(PermitError::invalid_input(format!(
                "'{}' is not a valid access type",
                s
            ))),
        }
    }
}

fn validate_scope(access_type: AccessType, resource: &str, record: &str) -> Result<()> {
    if resource == WILDCARD_RESOURCE && !access_type.honors_wildcard() {
        return Err(PermitError::invalid_grant(format!(
            "{} with access type '{}' cannot use the wildcard resource",
            record, access_type
        )));
    }
    if resource.is_empty() && access_type != AccessType::Global {
        return Err(PermitError::invalid_grant(format!(
            "{} with access type '{}' must name a resource",
            record, access_type
        )));
    }
    Ok(())
}

// =============================================================================
// Legacy Groups & Access Policies
// =============================================================================

/// A flat set of principals; groups never contain other groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: BTreeSet<String>,
}

impl Group {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: GroupId::new(),
            name: name.into(),
            description: String::new(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_id(mut self, id: GroupId) -> Self {
        self.id = id;
        self
    }

    /// Exact, case-sensitive membership test
    pub fn contains_member(&self, principal: &str) -> bool {
        self.members.contains(principal)
    }
}

/// Who a legacy access policy applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity_type", content = "id", rename_all = "snake_case")]
pub enum Entity {
    User(String),
    Group(GroupId),
}

/// A bundle of permissions inside a legacy access policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Access {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Legacy policy: every permission in every access, for every entity, on every object id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub id: PolicyId,
    pub access_type: AccessType,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub object_ids: Vec<String>,
    #[serde(default)]
    pub accesses: Vec<Access>,
}

impl AccessPolicy {
    pub fn new(access_type: AccessType) -> Self {
        Self {
            id: PolicyId::new(),
            access_type,
            entities: Vec::new(),
            object_ids: Vec::new(),
            accesses: Vec::new(),
        }
    }

    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_ids.push(object_id.into());
        self
    }

    pub fn access(mut self, permissions: Vec<Permission>) -> Self {
        self.accesses.push(Access {
            target: None,
            permissions,
        });
        self
    }

    /// Union of all permissions across all accesses
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.accesses.iter().flat_map(|a| a.permissions.iter())
    }

    pub fn validate(&self) -> Result<()> {
        let record = format!("access policy {}", self.id);
        for object_id in &self.object_ids {
            validate_scope(self.access_type, object_id, &record)?;
        }
        Ok(())
    }
}

// =============================================================================
// RBAC Grants & Roles
// =============================================================================

/// Holder of a direct permission grant or role grant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AssignedEntity {
    User(String),
    Group(GroupId),
    /// Permission grants assigned to a role define what the role confers
    Role(RoleId),
}

impl AssignedEntity {
    pub fn user(principal: impl Into<String>) -> Self {
        Self::User(principal.into())
    }
}

fn default_resource_type() -> String {
    "capability".to_string()
}

/// A single permission granted to one holder, scoped to one resource or `*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacPermissionGrant {
    #[serde(default)]
    pub id: PermissionGrantId,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    pub assignee: AssignedEntity,
    pub namespace: String,
    pub permission: String,
    pub access_type: AccessType,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default)]
    pub resource: String,
}

impl RbacPermissionGrant {
    pub fn new(
        assignee: AssignedEntity,
        permission: &Permission,
        access_type: AccessType,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            id: PermissionGrantId::new(),
            created_at: Utc::now(),
            assignee,
            namespace: permission.namespace.clone(),
            permission: permission.name.clone(),
            access_type,
            resource_type: access_type.to_string(),
            resource: resource.into(),
        }
    }

    pub fn as_permission(&self) -> Permission {
        Permission::new(self.namespace.clone(), self.permission.clone())
    }

    pub fn is_wildcard(&self) -> bool {
        self.resource == WILDCARD_RESOURCE
    }

    /// Write-time checks; the evaluator never calls this
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() || self.permission.is_empty() {
            return Err(PermitError::invalid_grant(format!(
                "permission grant {} must name a namespace and a permission",
                self.id
            )));
        }
        // Role definitions are scoped by the role grant that confers them
        if matches!(self.assignee, AssignedEntity::Role(_)) {
            return Ok(());
        }
        validate_scope(
            self.access_type,
            &self.resource,
            &format!("permission grant {}", self.id),
        )
    }
}

/// A named bundle of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacRole {
    pub id: RoleId,
    pub owner: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub access_type: AccessType,
}

impl RbacRole {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        access_type: AccessType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RoleId::new(),
            owner: owner.into(),
            created_at: now,
            updated_at: now,
            name: name.into(),
            description: description.into(),
            access_type,
        }
    }
}

/// Assigns a role to a holder, scoped like a permission grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacRoleGrant {
    #[serde(default)]
    pub id: RoleGrantId,
    pub role_id: RoleId,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    pub assignee: AssignedEntity,
    pub access_type: AccessType,
    #[serde(default)]
    pub resource: String,
}

impl RbacRoleGrant {
    pub fn new(
        role_id: RoleId,
        assignee: AssignedEntity,
        access_type: AccessType,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            id: RoleGrantId::new(),
            role_id,
            created_at: Utc::now(),
            assignee,
            access_type,
            resource: resource.into(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.resource == WILDCARD_RESOURCE
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(self.assignee, AssignedEntity::Role(_)) {
            return Err(PermitError::invalid_grant(format!(
                "role grant {} cannot be assigned to another role",
                self.id
            )));
        }
        validate_scope(
            self.access_type,
            &self.resource,
            &format!("role grant {}", self.id),
        )
    }
}

// =============================================================================
// Decisions
// =============================================================================

/// The stored record that contributed a granted permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum GrantRef {
    AccessPolicy { id: PolicyId },
    PermissionGrant { id: PermissionGrantId },
    RoleGrant { id: RoleGrantId, role_id: RoleId },
}

/// Result of a permission evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermittedResponse {
    /// resource id -> permission key -> granted
    pub permission_matrix: BTreeMap<String, BTreeMap<String, bool>>,
    /// Records that granted at least one requested permission
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub granted_by: Vec<GrantRef>,
}

impl PermittedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one requested permission
    pub fn record(&mut self, resource_id: &str, permission: &Permission, granted: bool) {
        let row = self
            .permission_matrix
            .entry(resource_id.to_string())
            .or_default();
        let cell = row.entry(permission.key()).or_insert(false);
        *cell |= granted;
    }

    /// True iff every requested permission is granted; vacuously true when nothing was requested
    pub fn permitted(&self) -> bool {
        self.permission_matrix
            .values()
            .flat_map(|row| row.values())
            .all(|granted| *granted)
    }

    pub fn is_granted(&self, resource_id: &str, permission: &Permission) -> Option<bool> {
        self.permission_matrix
            .get(resource_id)
            .and_then(|row| row.get(&permission.key()))
            .copied()
    }

    /// Keys of all denied permissions, as `resource:namespace/name`
    pub fn denied(&self) -> Vec<String> {
        self.permission_matrix
            .iter()
            .flat_map(|(resource, row)| {
                row.iter()
                    .filter(|(_, granted)| !**granted)
                    .map(move |(key, _)| format!("{}:{}", resource, key))
            })
            .collect()
    }
}

/// Everything a principal holds, directly or through groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveGrants {
    pub principal: String,
    pub groups: Vec<Group>,
    pub access_policies: Vec<AccessPolicy>,
    pub permission_grants: Vec<RbacPermissionGrant>,
    pub role_grants: Vec<RbacRoleGrant>,
    /// Concrete permissions conferred by each held role
    pub role_permissions: BTreeMap<RoleId, BTreeSet<Permission>>,
}
