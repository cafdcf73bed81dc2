//! Unit tests for permit-core

use super::*;
use std::collections::BTreeSet;

// =============================================================================
// Permission Tests
// =============================================================================

#[cfg(test)]
mod permission_tests {
    use super::*;

    #[test]
    fn test_permission_key() {
        let permission = Permission::new("topics", "read-private");
        assert_eq!(permission.key(), "topics/read-private");
        assert_eq!(permission.to_string(), "topics/read-private");
    }

    #[test]
    fn test_permission_parse() {
        let permission: Permission = "capability-management/request-deletion".parse().unwrap();
        assert_eq!(permission.namespace, "capability-management");
        assert_eq!(permission.name, "request-deletion");
    }

    #[test]
    fn test_permission_parse_rejects_missing_parts() {
        assert!("topics".parse::<Permission>().is_err());
        assert!("/create".parse::<Permission>().is_err());
        assert!("topics/".parse::<Permission>().is_err());
    }

    #[test]
    fn test_permission_equality_is_structural() {
        assert_eq!(Permission::new("topics", "create"), Permission::new("topics", "create"));
        assert_ne!(Permission::new("topics", "create"), Permission::new("aws", "create"));
    }

    #[test]
    fn test_unknown_permission_is_not_in_catalog() {
        assert!(is_known_permission(&Permission::new("topics", "create")));
        assert!(!is_known_permission(&Permission::new("topics", "teleport")));
    }
}

// =============================================================================
// Access Type Tests
// =============================================================================

#[cfg(test)]
mod access_type_tests {
    use super::*;

    #[test]
    fn test_access_type_serialization() {
        let json = serde_json::to_string(&AccessType::Capability).unwrap();
        assert_eq!(json, "\"capability\"");

        let deserialized: AccessType = serde_json::from_str("\"global\"").unwrap();
        assert_eq!(deserialized, AccessType::Global);
    }

    #[test]
    fn test_access_type_parse_ignores_case() {
        assert_eq!("Global".parse::<AccessType>().unwrap(), AccessType::Global);
        assert_eq!("AZURE".parse::<AccessType>().unwrap(), AccessType::Azure);
        assert!("tenant".parse::<AccessType>().is_err());
    }

    #[test]
    fn test_only_global_honors_wildcard() {
        assert!(AccessType::Global.honors_wildcard());
        assert!(!AccessType::Capability.honors_wildcard());
        assert!(!AccessType::Aws.honors_wildcard());
        assert!(!AccessType::Azure.honors_wildcard());
    }
}

// =============================================================================
// Grant Validation Tests
// =============================================================================

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn create_topics() -> Permission {
        Permission::new("topics", "create")
    }

    #[test]
    fn test_global_wildcard_grant_is_valid() {
        let grant = RbacPermissionGrant::new(
            AssignedEntity::user("test01@dfds.cloud"),
            &create_topics(),
            AccessType::Global,
            WILDCARD_RESOURCE,
        );
        assert!(grant.is_wildcard());
        assert!(grant.validate().is_ok());
    }

    #[test]
    fn test_capability_wildcard_grant_is_rejected() {
        let grant = RbacPermissionGrant::new(
            AssignedEntity::user("test01@dfds.cloud"),
            &create_topics(),
            AccessType::Capability,
            WILDCARD_RESOURCE,
        );
        assert!(matches!(grant.validate(), Err(PermitError::InvalidGrant { .. })));
    }

    #[test]
    fn test_capability_grant_requires_resource() {
        let grant = RbacPermissionGrant::new(
            AssignedEntity::user("test01@dfds.cloud"),
            &create_topics(),
            AccessType::Capability,
            "",
        );
        assert!(grant.validate().is_err());
    }

    #[test]
    fn test_role_definition_ignores_scope() {
        let grant = RbacPermissionGrant::new(
            AssignedEntity::Role(RoleId::new()),
            &create_topics(),
            AccessType::Global,
            "",
        );
        assert!(grant.validate().is_ok());
    }

    #[test]
    fn test_role_grant_cannot_target_role() {
        let grant = RbacRoleGrant::new(
            RoleId::new(),
            AssignedEntity::Role(RoleId::new()),
            AccessType::Global,
            WILDCARD_RESOURCE,
        );
        assert!(grant.validate().is_err());
    }

    #[test]
    fn test_role_grant_scope_rules() {
        let capability = RbacRoleGrant::new(
            RoleId::new(),
            AssignedEntity::user("owner@bar.com"),
            AccessType::Capability,
            "bar",
        );
        assert!(capability.validate().is_ok());

        let leaking = RbacRoleGrant::new(
            RoleId::new(),
            AssignedEntity::user("owner@bar.com"),
            AccessType::Capability,
            WILDCARD_RESOURCE,
        );
        assert!(leaking.validate().is_err());
    }

    #[test]
    fn test_access_policy_object_ids_follow_scope_rules() {
        let capability = AccessPolicy::new(AccessType::Capability).object_id("test01");
        assert!(capability.validate().is_ok());

        let leaking = AccessPolicy::new(AccessType::Capability)
            .object_id("test01")
            .object_id(WILDCARD_RESOURCE);
        assert!(leaking.validate().is_err());

        let global = AccessPolicy::new(AccessType::Global).object_id(WILDCARD_RESOURCE);
        assert!(global.validate().is_ok());
    }

    #[test]
    fn test_grant_defaults_when_deserialized() {
        let grant: RbacPermissionGrant = serde_json::from_str(
            r#"{
                "assignee": {"type": "user", "id": "test01@dfds.cloud"},
                "namespace": "topics",
                "permission": "create",
                "access_type": "global",
                "resource": "*"
            }"#,
        )
        .unwrap();
        assert_eq!(grant.resource_type, "capability");
        assert!(grant.is_wildcard());
        assert!(grant.validate().is_ok());
    }
}

// =============================================================================
// Model Serialization Tests
// =============================================================================

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_entity_serialization() {
        let group_id: GroupId = "507531cf-6740-4728-acdb-c3b4cef11b27".parse().unwrap();
        let json = serde_json::to_value(Entity::Group(group_id)).unwrap();
        assert_eq!(json["entity_type"], "group");
        assert_eq!(json["id"], "507531cf-6740-4728-acdb-c3b4cef11b27");

        let user: Entity =
            serde_json::from_str(r#"{"entity_type":"user","id":"test03@dfds.cloud"}"#).unwrap();
        assert_eq!(user, Entity::User("test03@dfds.cloud".to_string()));
    }

    #[test]
    fn test_assigned_entity_serialization() {
        let json = serde_json::to_value(AssignedEntity::user("test01@dfds.cloud")).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["id"], "test01@dfds.cloud");
    }

    #[test]
    fn test_group_membership_is_case_sensitive() {
        let group = Group::new("test01 - users", ["test01@dfds.cloud"]);
        assert!(group.contains_member("test01@dfds.cloud"));
        assert!(!group.contains_member("TEST01@dfds.cloud"));
    }

    #[test]
    fn test_access_policy_permissions_union() {
        let policy = AccessPolicy::new(AccessType::Capability)
            .object_id("test01")
            .access(vec![Permission::new("topics", "create")])
            .access(vec![Permission::new("topics", "read-private")]);

        let permissions: BTreeSet<_> = policy.permissions().cloned().collect();
        assert_eq!(permissions.len(), 2);
    }

    #[test]
    fn test_access_policy_defaults_when_fields_missing() {
        let policy: AccessPolicy =
            serde_json::from_str(r#"{"access_type":"capability"}"#).unwrap();
        assert!(policy.entities.is_empty());
        assert!(policy.object_ids.is_empty());
        assert!(policy.accesses.is_empty());
    }
}

// =============================================================================
// Permitted Response Tests
// =============================================================================

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn test_empty_response_is_vacuously_permitted() {
        let response = PermittedResponse::new();
        assert!(response.permission_matrix.is_empty());
        assert!(response.permitted());
    }

    #[test]
    fn test_permitted_is_conjunctive() {
        let mut response = PermittedResponse::new();
        response.record("test01", &Permission::new("topics", "create"), true);
        assert!(response.permitted());

        response.record("test01", &Permission::new("topics", "read-public"), false);
        assert!(!response.permitted());
        assert_eq!(response.denied(), vec!["test01:topics/read-public".to_string()]);
    }

    #[test]
    fn test_duplicate_requests_collapse() {
        let mut response = PermittedResponse::new();
        let create = Permission::new("topics", "create");
        response.record("test01", &create, false);
        response.record("test01", &create, true);

        assert_eq!(response.permission_matrix["test01"].len(), 1);
        assert_eq!(response.is_granted("test01", &create), Some(true));
    }

    #[test]
    fn test_response_wire_format() {
        let mut response = PermittedResponse::new();
        response.record("test01", &Permission::new("topics", "create"), true);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["permissionMatrix"]["test01"]["topics/create"], true);
        assert!(json.get("grantedBy").is_none());
    }
}
