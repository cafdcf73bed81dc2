//! Permit Engine - Decides whether a principal holds a set of permissions on a resource
//!
//! Grants reach a principal through legacy access policies, direct permission
//! grants and role grants. The engine merges all of them for one request and
//! memoizes the decision until the caller resets the cache.

pub mod cache;
pub mod candidate;
pub mod catalog;
pub mod config;
pub mod evaluator;
pub mod groups;
pub mod roles;
pub mod scope;
pub mod service;


pub use cache::{CacheMetrics, DecisionCache, DecisionKey};
pub use candidate::CandidateGrant;
pub use catalog::{GrantCatalog, GrantSnapshot};
pub use config::{CacheSettings, EngineSettings};
pub use evaluator::{EffectivePermissions, PermissionEvaluator};
pub use groups::GroupResolver;
pub use roles::RoleExpander;
pub use service::PermissionService;
