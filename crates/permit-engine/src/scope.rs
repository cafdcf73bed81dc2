//! Resource scope matching
//!
//! Two conventions coexist in stored grants. Legacy access policies pair a
//! capability access type with concrete object ids. Direct grants use a global
//! access type with `*` for "every resource", and a few global grants are
//! pinned to one resource string. Both are decided here.

use permit_core::{AccessType, WILDCARD_RESOURCE};

/// Decide whether a grant scoped to `grant_resource` applies to `requested`
///
/// Global grants match the wildcard or the exact resource. Every other access
/// type matches the exact resource only, and a malformed capability grant
/// carrying `*` matches nothing at all, not even a request for the literal `*`.
pub fn matches(access_type: AccessType, grant_resource: &str, requested: &str) -> bool {
    if grant_resource == WILDCARD_RESOURCE {
        return access_type.honors_wildcard();
    }
    grant_resource == requested
}
