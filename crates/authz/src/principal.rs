//! Principal capability interface.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use panelguard_core::PrincipalId;

use crate::role::RoleSlug;
use crate::Permission;

/// Capabilities every authenticated actor must expose to the engine.
///
/// This is a required contract, not duck typing: there is no legitimate
/// "principal without these capabilities" case, so the engine never falls
/// back to an implicit deny for a missing capability.
pub trait Principal {
    fn id(&self) -> PrincipalId;

    /// Membership test against the principal's resolved role→permission
    /// closure.
    fn has_permission(&self, permission: &Permission) -> bool;

    fn is_super_admin(&self) -> bool;

    fn has_role(&self, role: &RoleSlug) -> bool;
}

/// A fully resolved principal for authorization decisions.
///
/// Construction is intentionally decoupled from storage and transport: the
/// store (or a claims layer) materializes role slugs, the transitive
/// permission closure and the super-admin flag, and the engine only reads
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrincipal {
    pub principal_id: PrincipalId,
    pub roles: Vec<RoleSlug>,
    pub permissions: BTreeSet<Permission>,
    pub super_admin: bool,
}

impl ResolvedPrincipal {
    pub fn new(
        principal_id: PrincipalId,
        roles: Vec<RoleSlug>,
        permissions: BTreeSet<Permission>,
        super_admin: bool,
    ) -> Self {
        Self {
            principal_id,
            roles,
            permissions,
            super_admin,
        }
    }
}

impl Principal for ResolvedPrincipal {
    fn id(&self) -> PrincipalId {
        self.principal_id
    }

    fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    fn has_role(&self, role: &RoleSlug) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_principal_exposes_capabilities() {
        let mut permissions = BTreeSet::new();
        permissions.insert(Permission::new("users.view"));

        let principal = ResolvedPrincipal::new(
            PrincipalId::new(),
            vec![RoleSlug::new("editor").unwrap()],
            permissions,
            false,
        );

        assert!(principal.has_permission(&Permission::new("users.view")));
        assert!(!principal.has_permission(&Permission::new("users.delete")));
        assert!(principal.has_role(&RoleSlug::new("editor").unwrap()));
        assert!(!principal.has_role(&RoleSlug::new("admin").unwrap()));
        assert!(!principal.is_super_admin());
    }
}
