//! Role identifiers and records.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use panelguard_core::{DomainError, Slug};

use crate::Permission;

/// Slug of the role that bypasses permission lookup entirely.
pub const SUPER_ADMIN_SLUG: &str = "super_admin";

/// The three protected role slugs.
///
/// System roles ship with the product and cannot be deleted; `super_admin`
/// additionally cannot be modified. The list is fixed, not configurable.
pub const SYSTEM_ROLE_SLUGS: [&str; 3] = [SUPER_ADMIN_SLUG, "admin", "user"];

/// Role identifier used for RBAC and panel gating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSlug(Slug);

impl RoleSlug {
    /// Validate and construct a role slug.
    pub fn new(value: impl Into<Cow<'static, str>>) -> Result<Self, DomainError> {
        Ok(Self(Slug::new(value)?))
    }

    /// The `super_admin` slug.
    pub fn super_admin() -> Self {
        Self(Slug::new(SUPER_ADMIN_SLUG).expect("static slug is valid"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this is one of the protected system roles.
    pub fn is_system(&self) -> bool {
        SYSTEM_ROLE_SLUGS.contains(&self.as_str())
    }

    pub fn is_super_admin(&self) -> bool {
        self.as_str() == SUPER_ADMIN_SLUG
    }
}

impl core::fmt::Display for RoleSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Built-in role tiers used to seed permission defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    /// Implicit "all permissions" via bypass; never enumerated.
    SuperAdmin,
    /// Everything except permission management.
    Admin,
    /// Minimal read-only access.
    User,
}

impl RoleTier {
    /// Tier of a system role slug, `None` for custom roles.
    pub fn for_slug(slug: &RoleSlug) -> Option<Self> {
        match slug.as_str() {
            SUPER_ADMIN_SLUG => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// A role: a named, reusable bundle of permissions.
///
/// # Invariants
/// - The `super_admin` role's permission set is never enumerated; its access
///   comes from the policy engine bypass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub slug: RoleSlug,
    pub name: String,
    pub description: String,
    pub permissions: BTreeSet<Permission>,
}

impl RoleRecord {
    pub fn new(
        slug: RoleSlug,
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: BTreeSet<Permission>,
    ) -> Result<Self, DomainError> {
        if slug.is_super_admin() && !permissions.is_empty() {
            return Err(DomainError::invariant(
                "the super_admin role carries no explicit permissions",
            ));
        }
        Ok(Self {
            slug,
            name: name.into(),
            description: description.into(),
            permissions,
        })
    }

    pub fn is_system(&self) -> bool {
        self.slug.is_system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_slugs_are_recognized() {
        for slug in SYSTEM_ROLE_SLUGS {
            assert!(RoleSlug::new(slug).unwrap().is_system());
        }
        assert!(!RoleSlug::new("editor").unwrap().is_system());
    }

    #[test]
    fn tier_mapping() {
        assert_eq!(
            RoleTier::for_slug(&RoleSlug::super_admin()),
            Some(RoleTier::SuperAdmin)
        );
        assert_eq!(
            RoleTier::for_slug(&RoleSlug::new("admin").unwrap()),
            Some(RoleTier::Admin)
        );
        assert_eq!(RoleTier::for_slug(&RoleSlug::new("vendor").unwrap()), None);
    }

    #[test]
    fn super_admin_record_rejects_explicit_permissions() {
        let mut permissions = BTreeSet::new();
        permissions.insert(Permission::new("users.view"));

        let result = RoleRecord::new(
            RoleSlug::super_admin(),
            "Super Admin",
            "Full access",
            permissions,
        );
        assert!(result.is_err());

        let empty = RoleRecord::new(
            RoleSlug::super_admin(),
            "Super Admin",
            "Full access",
            BTreeSet::new(),
        );
        assert!(empty.is_ok());
    }
}
