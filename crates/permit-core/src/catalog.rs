//! Static bootstrap catalog
//!
//! The permission catalog is descriptive metadata: it lists every
//! `(namespace, name)` pair the platform recognizes but grants nothing by
//! itself. Grants referencing permissions outside the catalog are still
//! matched structurally.
//!
//! The system role catalog is the default set of roles a fresh deployment is
//! seeded with.

use crate::ids::RoleId;
use crate::models::{AccessType, Permission};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

pub const NS_TOPICS: &str = "topics";
pub const NS_CAPABILITY_MANAGEMENT: &str = "capability-management";
pub const NS_CAPABILITY_MEMBERSHIP_MANAGEMENT: &str = "capability-membership-management";
pub const NS_TAGS_AND_METADATA: &str = "tags-and-metadata";
pub const NS_AWS: &str = "aws";
pub const NS_FINOUT: &str = "finout";
pub const NS_AZURE: &str = "azure";
pub const NS_RBAC: &str = "rbac";

/// Namespaces known to the platform
pub const NAMESPACES: &[&str] = &[
    NS_TOPICS,
    NS_CAPABILITY_MANAGEMENT,
    NS_CAPABILITY_MEMBERSHIP_MANAGEMENT,
    NS_TAGS_AND_METADATA,
    NS_AWS,
    NS_FINOUT,
    NS_AZURE,
    NS_RBAC,
];

/// Owner recorded on seeded system roles
pub const SYSTEM_OWNER: &str = "system";

/// One entry of the bootstrap permission catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    pub permission: Permission,
    pub description: &'static str,
    pub access_type: AccessType,
}

const fn entry(
    namespace: &'static str,
    name: &'static str,
    description: &'static str,
    access_type: AccessType,
) -> (&'static str, &'static str, &'static str, AccessType) {
    (namespace, name, description, access_type)
}

const BOOTSTRAP: &[(&str, &str, &str, AccessType)] = &[
    entry(NS_TOPICS, "create", "Create new topics", AccessType::Capability),
    entry(NS_TOPICS, "read-private", "Read private topics", AccessType::Capability),
    entry(NS_TOPICS, "read-public", "Read public topics", AccessType::Capability),
    entry(NS_TOPICS, "update", "Update topics", AccessType::Capability),
    entry(NS_TOPICS, "delete", "Delete topics", AccessType::Capability),
    entry(NS_CAPABILITY_MANAGEMENT, "receive-alerts", "Receive alarms", AccessType::Capability),
    entry(NS_CAPABILITY_MANAGEMENT, "receive-cost", "Receive cost summary reports", AccessType::Capability),
    entry(NS_CAPABILITY_MANAGEMENT, "request-deletion", "Request capability deletion", AccessType::Capability),
    entry(NS_CAPABILITY_MANAGEMENT, "manage-permissions", "Manage capability permissions", AccessType::Capability),
    entry(NS_CAPABILITY_MANAGEMENT, "read-self-assess", "Read self assessments", AccessType::Capability),
    entry(NS_CAPABILITY_MANAGEMENT, "create-self-assess", "Create self assessments", AccessType::Capability),
    entry(NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, "create", "Invite new member", AccessType::Capability),
    entry(NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, "delete", "Remove member", AccessType::Capability),
    entry(NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, "read", "See member list", AccessType::Capability),
    entry(NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, "read-requests", "Read invitation and application requests", AccessType::Capability),
    entry(NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, "manage-requests", "Approve or decline member requests", AccessType::Capability),
    entry(NS_TAGS_AND_METADATA, "create", "Create tags and metadata", AccessType::Capability),
    entry(NS_TAGS_AND_METADATA, "read", "Read tags and metadata", AccessType::Capability),
    entry(NS_TAGS_AND_METADATA, "update", "Update tags and metadata", AccessType::Capability),
    entry(NS_TAGS_AND_METADATA, "delete", "Delete tags and metadata", AccessType::Capability),
    entry(NS_AWS, "create", "Create context and cloud resources", AccessType::Capability),
    entry(NS_AWS, "read", "Read context and cloud resources", AccessType::Capability),
    entry(NS_AWS, "manage-provider", "Manage resources in the AWS account", AccessType::Capability),
    entry(NS_AWS, "read-provider", "Read resources in the AWS account", AccessType::Capability),
    entry(NS_FINOUT, "read-dashboards", "See all dashboards", AccessType::Global),
    entry(NS_FINOUT, "manage-dashboards", "Manage dashboards with the capability prefix", AccessType::Capability),
    entry(NS_FINOUT, "manage-alerts", "Manage anomaly alerts with the capability prefix", AccessType::Capability),
    entry(NS_FINOUT, "read-alerts", "Read anomaly alerts with the capability prefix", AccessType::Capability),
    entry(NS_AZURE, "create", "Create context and cloud resources", AccessType::Capability),
    entry(NS_AZURE, "read", "Read context and cloud resources", AccessType::Capability),
    entry(NS_AZURE, "read-provider", "Read resources in the Azure resource group", AccessType::Capability),
    entry(NS_AZURE, "manage-provider", "Manage resources in the Azure resource group", AccessType::Capability),
    entry(NS_RBAC, "create", "Create permission and role grants", AccessType::Global),
    entry(NS_RBAC, "read", "Read grants held by other principals", AccessType::Global),
    entry(NS_RBAC, "update", "Update roles and groups", AccessType::Global),
    entry(NS_RBAC, "delete", "Revoke permission and role grants", AccessType::Global),
];

static BOOTSTRAP_PERMISSIONS: Lazy<Vec<PermissionDefinition>> = Lazy::new(|| {
    BOOTSTRAP
        .iter()
        .map(|(namespace, name, description, access_type)| PermissionDefinition {
            permission: Permission::new(*namespace, *name),
            description: *description,
            access_type: *access_type,
        })
        .collect()
});

static BOOTSTRAP_KEYS: Lazy<BTreeSet<Permission>> = Lazy::new(|| {
    BOOTSTRAP_PERMISSIONS
        .iter()
        .map(|d| d.permission.clone())
        .collect()
});

/// Every permission recognized by the platform
pub fn bootstrap_permissions() -> &'static [PermissionDefinition] {
    &BOOTSTRAP_PERMISSIONS
}

pub fn is_known_permission(permission: &Permission) -> bool {
    BOOTSTRAP_KEYS.contains(permission)
}

pub fn is_known_namespace(namespace: &str) -> bool {
    NAMESPACES.contains(&namespace)
}

// =============================================================================
// System Roles
// =============================================================================

/// A role every deployment starts with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRole {
    pub id: RoleId,
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: BTreeSet<Permission>,
}

type RoleTable = &'static [(&'static str, &'static [&'static str])];

const OWNER: RoleTable = &[
    (NS_TOPICS, &["create", "read-public", "read-private", "update", "delete"]),
    (NS_CAPABILITY_MANAGEMENT, &["receive-alerts", "receive-cost", "request-deletion", "manage-permissions", "read-self-assess", "create-self-assess"]),
    (NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, &["create", "delete", "read", "read-requests", "manage-requests"]),
    (NS_TAGS_AND_METADATA, &["create", "read", "update", "delete"]),
    (NS_AWS, &["create", "read", "manage-provider", "read-provider"]),
    (NS_FINOUT, &["read-dashboards", "manage-dashboards", "manage-alerts", "read-alerts"]),
    (NS_AZURE, &["create", "read", "read-provider", "manage-provider"]),
];

const CONTRIBUTOR: RoleTable = &[
    (NS_TOPICS, &["create", "read-public", "read-private", "update", "delete"]),
    (NS_CAPABILITY_MANAGEMENT, &["receive-alerts"]),
    (NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, &["create", "read", "read-requests", "manage-requests"]),
    (NS_TAGS_AND_METADATA, &["create", "read", "update", "delete"]),
    (NS_AWS, &["create", "read", "manage-provider", "read-provider"]),
    (NS_FINOUT, &["read-dashboards", "manage-dashboards", "manage-alerts", "read-alerts"]),
    (NS_AZURE, &["create", "read", "read-provider", "manage-provider"]),
];

const READER: RoleTable = &[
    (NS_TOPICS, &["read-public", "read-private"]),
    (NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, &["read", "read-requests"]),
    (NS_TAGS_AND_METADATA, &["read"]),
    (NS_AWS, &["read", "read-provider"]),
    (NS_FINOUT, &["read-dashboards", "read-alerts"]),
    (NS_AZURE, &["read", "read-provider"]),
];

const GUEST: RoleTable = &[
    (NS_TOPICS, &["read-public"]),
    (NS_CAPABILITY_MEMBERSHIP_MANAGEMENT, &["read"]),
    (NS_TAGS_AND_METADATA, &["read"]),
    (NS_FINOUT, &["read-dashboards"]),
];

fn system_role(id: u128, name: &'static str, description: &'static str, table: RoleTable) -> SystemRole {
    SystemRole {
        id: RoleId::from_uuid(Uuid::from_u128(id)),
        name,
        description,
        permissions: table
            .iter()
            .flat_map(|(namespace, names)| names.iter().map(move |name| Permission::new(*namespace, *name)))
            .collect(),
    }
}

static SYSTEM_ROLES: Lazy<Vec<SystemRole>> = Lazy::new(|| {
    vec![
        system_role(0x36202dfb_d106_440d_8b99_f11bc8d77c9c, "Owner", "Full access to all resources", OWNER),
        system_role(0x2c561a6d_90f4_4649_80b3_76a854a64ea2, "Contributor", "Can modify existing resources", CONTRIBUTOR),
        system_role(0x22dab91b_c2d8_4840_a173_1416ef1b882d, "Reader", "Read-only access", READER),
        system_role(0xf67cacc9_8dd4_4481_ac15_00b5dd83b046, "Guest", "Very limited access", GUEST),
    ]
});

pub fn system_roles() -> &'static [SystemRole] {
    &SYSTEM_ROLES
}

pub fn system_role_by_name(name: &str) -> Option<&'static SystemRole> {
    SYSTEM_ROLES.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}
