//! Static permission catalog.
//!
//! The catalog is the system of record for which permission names exist,
//! how they are displayed, and which display group they belong to. It is
//! versioned with the deployment: nothing mutates it at runtime. A sync
//! operation against a persistent store may add/remove *stored* entries,
//! but the catalog itself is the source it syncs from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use panelguard_core::DomainError;

use crate::role::RoleTier;
use crate::Permission;

/// One catalog entry: canonical name, human label, display group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: Permission,
    pub display_name: String,
    pub group: String,
}

/// Immutable catalog of all known permissions, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCatalog {
    entries: BTreeMap<Permission, CatalogEntry>,
}

/// Permission-management entries withheld from the admin tier.
const PERMISSION_MANAGEMENT: [&str; 2] = ["permissions.manage", "permissions.sync"];

/// Read-only subset granted to the user tier.
///
/// Scoping `users.view` to the principal's own record is the policy
/// engine's job, not the catalog's.
const USER_TIER_DEFAULTS: [&str; 1] = ["users.view"];

impl PermissionCatalog {
    /// Build a catalog from entries, validating the name grammar and
    /// rejecting duplicates (every name belongs to exactly one group).
    pub fn from_entries(
        entries: impl IntoIterator<Item = CatalogEntry>,
    ) -> Result<Self, DomainError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if !entry.name.is_well_formed() {
                return Err(DomainError::validation(format!(
                    "malformed permission name '{}'",
                    entry.name
                )));
            }
            let name = entry.name.clone();
            if map.insert(name.clone(), entry).is_some() {
                return Err(DomainError::conflict(format!(
                    "duplicate permission name '{name}'"
                )));
            }
        }
        Ok(Self { entries: map })
    }

    /// The catalog shipped with the panel builder.
    pub fn builtin() -> Self {
        let entries = [
            ("users.view", "View users", "Users"),
            ("users.create", "Create users", "Users"),
            ("users.update", "Update users", "Users"),
            ("users.update.roles", "Change user roles", "Users"),
            ("users.delete", "Delete users", "Users"),
            ("users.impersonate", "Impersonate users", "Users"),
            ("roles.view", "View roles", "Roles"),
            ("roles.create", "Create roles", "Roles"),
            ("roles.update", "Update roles", "Roles"),
            ("roles.delete", "Delete roles", "Roles"),
            ("roles.assign", "Assign roles", "Roles"),
            ("permissions.view", "View permissions", "Permissions"),
            ("permissions.manage", "Manage permissions", "Permissions"),
            ("permissions.sync", "Sync permission catalog", "Permissions"),
            ("panels.view", "View panels", "Panels"),
            ("panels.manage", "Manage panels", "Panels"),
            ("settings.view", "View settings", "Settings"),
            ("settings.update", "Update settings", "Settings"),
            ("activity.view", "View activity log", "Activity"),
        ]
        .into_iter()
        .map(|(name, display_name, group)| CatalogEntry {
            name: Permission::new(name),
            display_name: display_name.to_string(),
            group: group.to_string(),
        });

        Self::from_entries(entries).expect("builtin catalog is well-formed")
    }

    /// Membership test against the full catalog.
    pub fn is_valid(&self, name: &Permission) -> bool {
        self.entries.contains_key(name)
    }

    /// All entries whose resource segment equals `resource`, as an ordered
    /// name → display-name mapping.
    pub fn for_resource(&self, resource: &str) -> BTreeMap<Permission, String> {
        self.entries
            .values()
            .filter(|entry| entry.name.resource() == Some(resource))
            .map(|entry| (entry.name.clone(), entry.display_name.clone()))
            .collect()
    }

    /// Display group of a known permission, `None` for unknown names.
    pub fn group(&self, name: &Permission) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.group.as_str())
    }

    /// Default permission set for a built-in role tier.
    ///
    /// The super-admin tier receives the entire catalog; in practice its
    /// access comes from the policy engine bypass, and the enumeration only
    /// serves display surfaces.
    pub fn defaults_for(&self, tier: RoleTier) -> Vec<Permission> {
        match tier {
            RoleTier::SuperAdmin => self.entries.keys().cloned().collect(),
            RoleTier::Admin => self
                .entries
                .keys()
                .filter(|name| !PERMISSION_MANAGEMENT.contains(&name.as_str()))
                .cloned()
                .collect(),
            RoleTier::User => USER_TIER_DEFAULTS
                .iter()
                .map(|name| Permission::new(*name))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid_and_grouped() {
        let catalog = PermissionCatalog::builtin();
        assert!(catalog.is_valid(&Permission::new("users.create")));
        assert!(!catalog.is_valid(&Permission::new("users.nuke")));
        assert_eq!(catalog.group(&Permission::new("roles.assign")), Some("Roles"));
        assert_eq!(catalog.group(&Permission::new("nope.nope")), None);
    }

    #[test]
    fn for_resource_filters_by_first_segment() {
        let catalog = PermissionCatalog::builtin();
        let users = catalog.for_resource("users");
        assert!(users.contains_key(&Permission::new("users.update.roles")));
        assert!(users.keys().all(|name| name.resource() == Some("users")));
        assert!(catalog.for_resource("missing").is_empty());
    }

    #[test]
    fn admin_tier_excludes_permission_management() {
        let catalog = PermissionCatalog::builtin();
        let admin = catalog.defaults_for(RoleTier::Admin);
        assert!(!admin.contains(&Permission::new("permissions.manage")));
        assert!(!admin.contains(&Permission::new("permissions.sync")));
        assert!(admin.contains(&Permission::new("permissions.view")));
        assert_eq!(admin.len(), catalog.len() - 2);
    }

    #[test]
    fn super_admin_tier_receives_entire_catalog() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(catalog.defaults_for(RoleTier::SuperAdmin).len(), catalog.len());
    }

    #[test]
    fn user_tier_is_minimal_read_only() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(
            catalog.defaults_for(RoleTier::User),
            vec![Permission::new("users.view")]
        );
    }

    #[test]
    fn duplicate_names_rejected() {
        let entry = CatalogEntry {
            name: Permission::new("users.view"),
            display_name: "View users".to_string(),
            group: "Users".to_string(),
        };
        let result = PermissionCatalog::from_entries([entry.clone(), entry]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_names_rejected() {
        let entry = CatalogEntry {
            name: Permission::new("Users.View"),
            display_name: "View users".to_string(),
            group: "Users".to_string(),
        };
        assert!(PermissionCatalog::from_entries([entry]).is_err());
    }
}
