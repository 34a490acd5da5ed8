//! `panelguard-authz` — authorization and permission resolution engine.
//!
//! This crate is intentionally decoupled from HTTP and storage: it consumes
//! a [`Principal`] capability interface and a [`DecisionCache`] backend, and
//! exposes allow/deny decisions plus cache invalidation hooks. The role and
//! permission store, transport, and rendering layers live elsewhere.

pub mod cache;
pub mod config;
pub mod observer;
pub mod panel;
pub mod permission;
pub mod policy;
pub mod principal;
pub mod registry;
pub mod role;

pub use cache::{DecisionCache, InMemoryDecisionCache};
pub use config::{AuthzConfig, ConfigError};
pub use observer::{CacheInvalidator, HolderIndex};
pub use panel::{Panel, PanelEntry, PanelKey, PanelSet, PanelSetError};
pub use permission::Permission;
pub use policy::{Decision, PolicyEngine, Target};
pub use principal::{Principal, ResolvedPrincipal};
pub use registry::{CatalogEntry, PermissionCatalog};
pub use role::{RoleRecord, RoleSlug, RoleTier, SUPER_ADMIN_SLUG, SYSTEM_ROLE_SLUGS};
