//! In-memory role/permission store.
//!
//! This is the reference implementation of the role/permission system of
//! record. Every write path fires the matching cache invalidation hook
//! *before* returning, so a completed mutation is never observable next to
//! a stale cached decision. Persistent backends should preserve exactly
//! that ordering at their transaction boundary.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use panelguard_core::{DomainError, DomainResult, PrincipalId};

use panelguard_authz::{
    AuthzConfig, CacheInvalidator, DecisionCache, HolderIndex, Permission, PermissionCatalog,
    ResolvedPrincipal, RoleRecord, RoleSlug, RoleTier,
};

#[derive(Debug, Default)]
struct StoreState {
    roles: BTreeMap<RoleSlug, RoleRecord>,
    assignments: HashMap<PrincipalId, BTreeSet<RoleSlug>>,
}

/// Reverse index over the shared assignment table, enabling targeted
/// invalidation for role-level events.
struct AssignmentIndex {
    state: Arc<RwLock<StoreState>>,
}

impl HolderIndex for AssignmentIndex {
    fn principals_with_role(&self, role: &RoleSlug) -> Option<Vec<PrincipalId>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Some(
            state
                .assignments
                .iter()
                .filter(|(_, roles)| roles.contains(role))
                .map(|(principal, _)| *principal)
                .collect(),
        )
    }
}

/// In-memory role store with synchronous cache invalidation.
pub struct InMemoryRoleStore {
    state: Arc<RwLock<StoreState>>,
    invalidator: CacheInvalidator,
    catalog: PermissionCatalog,
    config: AuthzConfig,
}

impl InMemoryRoleStore {
    /// Create an empty store wired to `cache`.
    pub fn new(
        cache: Arc<dyn DecisionCache>,
        config: AuthzConfig,
        catalog: PermissionCatalog,
    ) -> Self {
        let state = Arc::new(RwLock::new(StoreState::default()));
        let invalidator = CacheInvalidator::new(cache).with_holder_index(Arc::new(
            AssignmentIndex {
                state: state.clone(),
            },
        ));
        Self {
            state,
            invalidator,
            catalog,
            config,
        }
    }

    /// Create a store pre-seeded with the three system roles, each holding
    /// its tier's catalog defaults (`super_admin` deliberately empty).
    pub fn with_system_roles(
        cache: Arc<dyn DecisionCache>,
        config: AuthzConfig,
        catalog: PermissionCatalog,
    ) -> DomainResult<Self> {
        let store = Self::new(cache, config, catalog);
        {
            let mut state = store.write();
            for (slug, name, description, tier) in [
                ("super_admin", "Super Admin", "Unrestricted access", RoleTier::SuperAdmin),
                ("admin", "Administrator", "Panel administration", RoleTier::Admin),
                ("user", "User", "Basic access", RoleTier::User),
            ] {
                let slug = RoleSlug::new(slug)?;
                let permissions: BTreeSet<Permission> = match tier {
                    // The super_admin set stays empty: its access is the
                    // engine bypass, not an enumeration.
                    RoleTier::SuperAdmin => BTreeSet::new(),
                    tier => store.catalog.defaults_for(tier).into_iter().collect(),
                };
                let record = RoleRecord::new(slug.clone(), name, description, permissions)?;
                state.roles.insert(slug, record);
            }
        }
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Role CRUD
    // ─────────────────────────────────────────────────────────────────────

    pub fn role(&self, slug: &RoleSlug) -> Option<RoleRecord> {
        self.read().roles.get(slug).cloned()
    }

    pub fn roles(&self) -> Vec<RoleRecord> {
        self.read().roles.values().cloned().collect()
    }

    /// Create a role. Fails on duplicate slugs.
    pub fn create_role(&self, record: RoleRecord) -> DomainResult<()> {
        self.ensure_cataloged(record.permissions.iter())?;
        let mut state = self.write();
        if state.roles.contains_key(&record.slug) {
            return Err(DomainError::conflict(format!(
                "role '{}' already exists",
                record.slug
            )));
        }
        state.roles.insert(record.slug.clone(), record);
        // No holders yet, nothing cached to invalidate.
        Ok(())
    }

    /// Update a role's display attributes. System roles are immutable.
    pub fn update_role(
        &self,
        slug: &RoleSlug,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> DomainResult<()> {
        if slug.is_system() {
            return Err(DomainError::invariant(format!(
                "system role '{slug}' cannot be modified"
            )));
        }
        {
            let mut state = self.write();
            let record = state.roles.get_mut(slug).ok_or(DomainError::NotFound)?;
            record.name = name.into();
            record.description = description.into();
        }
        self.invalidator.on_role_changed(slug);
        Ok(())
    }

    /// Delete a role and detach it from every principal. System roles can
    /// never be deleted.
    pub fn delete_role(&self, slug: &RoleSlug) -> DomainResult<RoleRecord> {
        if slug.is_system() {
            return Err(DomainError::invariant(format!(
                "system role '{slug}' cannot be deleted"
            )));
        }
        let removed = {
            let mut state = self.write();
            let removed = state.roles.remove(slug).ok_or(DomainError::NotFound)?;
            for roles in state.assignments.values_mut() {
                roles.remove(slug);
            }
            removed
        };
        self.invalidator.on_role_deleted(slug);
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Role ↔ permission attachments
    // ─────────────────────────────────────────────────────────────────────

    pub fn attach_permissions(
        &self,
        slug: &RoleSlug,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> DomainResult<()> {
        let permissions: Vec<Permission> = permissions.into_iter().collect();
        self.ensure_cataloged(permissions.iter())?;
        self.mutate_permission_set(slug, |set| {
            set.extend(permissions.iter().cloned());
        })
    }

    pub fn detach_permissions(
        &self,
        slug: &RoleSlug,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> DomainResult<()> {
        let permissions: Vec<Permission> = permissions.into_iter().collect();
        self.mutate_permission_set(slug, |set| {
            for permission in &permissions {
                set.remove(permission);
            }
        })
    }

    /// Replace a role's permission set wholesale.
    pub fn sync_role_permissions(
        &self,
        slug: &RoleSlug,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> DomainResult<()> {
        let permissions: BTreeSet<Permission> = permissions.into_iter().collect();
        self.ensure_cataloged(permissions.iter())?;
        self.mutate_permission_set(slug, |set| {
            *set = permissions.clone();
        })
    }

    fn mutate_permission_set(
        &self,
        slug: &RoleSlug,
        mutate: impl FnOnce(&mut BTreeSet<Permission>),
    ) -> DomainResult<()> {
        if slug.is_super_admin() {
            return Err(DomainError::invariant(
                "the super_admin role carries no explicit permissions",
            ));
        }
        {
            let mut state = self.write();
            let record = state.roles.get_mut(slug).ok_or(DomainError::NotFound)?;
            mutate(&mut record.permissions);
        }
        self.invalidator.on_role_permissions_changed(slug);
        Ok(())
    }

    /// Reconcile stored attachments against a freshly deployed catalog:
    /// attachments to names the catalog no longer knows are dropped, with
    /// one invalidation event per dropped name.
    pub fn sync_catalog(&self, catalog: &PermissionCatalog) -> Vec<Permission> {
        let dropped: BTreeSet<Permission> = {
            let mut state = self.write();
            let mut dropped = BTreeSet::new();
            for record in state.roles.values_mut() {
                let stale: Vec<Permission> = record
                    .permissions
                    .iter()
                    .filter(|name| !catalog.is_valid(name))
                    .cloned()
                    .collect();
                for name in stale {
                    record.permissions.remove(&name);
                    dropped.insert(name);
                }
            }
            dropped
        };
        for name in &dropped {
            self.invalidator.on_permission_deleted(name);
        }
        dropped.into_iter().collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Principal ↔ role assignments
    // ─────────────────────────────────────────────────────────────────────

    pub fn assign_role(&self, principal: PrincipalId, slug: &RoleSlug) -> DomainResult<()> {
        {
            let mut state = self.write();
            if !state.roles.contains_key(slug) {
                return Err(DomainError::NotFound);
            }
            state
                .assignments
                .entry(principal)
                .or_default()
                .insert(slug.clone());
        }
        self.invalidator.on_principal_roles_changed(principal);
        Ok(())
    }

    pub fn revoke_role(&self, principal: PrincipalId, slug: &RoleSlug) -> DomainResult<()> {
        {
            let mut state = self.write();
            let roles = state
                .assignments
                .get_mut(&principal)
                .ok_or(DomainError::NotFound)?;
            if !roles.remove(slug) {
                return Err(DomainError::NotFound);
            }
        }
        self.invalidator.on_principal_roles_changed(principal);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Principal resolution
    // ─────────────────────────────────────────────────────────────────────

    /// Materialize the principal data the policy engine consumes: role
    /// slugs, transitive permission closure, super-admin flag.
    pub fn resolve_principal(&self, principal: PrincipalId) -> ResolvedPrincipal {
        let state = self.read();
        let roles: Vec<RoleSlug> = state
            .assignments
            .get(&principal)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default();

        let permissions: BTreeSet<Permission> = roles
            .iter()
            .filter_map(|slug| state.roles.get(slug))
            .flat_map(|record| record.permissions.iter().cloned())
            .collect();

        let super_admin = self
            .config
            .super_admin_role
            .as_ref()
            .is_some_and(|designated| roles.contains(designated));

        ResolvedPrincipal::new(principal, roles, permissions, super_admin)
    }

    fn ensure_cataloged<'a>(
        &self,
        permissions: impl Iterator<Item = &'a Permission>,
    ) -> DomainResult<()> {
        for permission in permissions {
            if !self.catalog.is_valid(permission) {
                return Err(DomainError::validation(format!(
                    "permission '{permission}' is not in the catalog"
                )));
            }
        }
        Ok(())
    }
}
