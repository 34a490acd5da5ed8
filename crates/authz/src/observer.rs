//! Mutation observers: cache invalidation on role/permission writes.
//!
//! The role/permission store calls these hooks synchronously inside its
//! write path, so by the time a mutation returns to its caller the
//! corresponding invalidation has already happened. A stale `allow` is a
//! security defect; a spurious extra invalidation is just a recompute.
//! All hooks are idempotent and commutative.

use std::sync::Arc;

use panelguard_core::PrincipalId;

use crate::cache::DecisionCache;
use crate::role::RoleSlug;
use crate::Permission;

/// Optional reverse index from role to current holders.
///
/// `None` from [`principals_with_role`](HolderIndex::principals_with_role)
/// means the holder set cannot be cheaply enumerated; callers then fall
/// back to global invalidation.
pub trait HolderIndex: Send + Sync {
    fn principals_with_role(&self, role: &RoleSlug) -> Option<Vec<PrincipalId>>;
}

/// Subscriber for role/permission mutations, driving cache invalidation.
pub struct CacheInvalidator {
    cache: Arc<dyn DecisionCache>,
    holders: Option<Arc<dyn HolderIndex>>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn DecisionCache>) -> Self {
        Self {
            cache,
            holders: None,
        }
    }

    /// Enable targeted invalidation through a holder index. Purely an
    /// optimization: without it every role-level event escalates to a
    /// global invalidation, which is always correct.
    pub fn with_holder_index(mut self, holders: Arc<dyn HolderIndex>) -> Self {
        self.holders = Some(holders);
        self
    }

    /// A principal's role assignments changed: drop that principal's
    /// cached decisions.
    pub fn on_principal_roles_changed(&self, principal: PrincipalId) {
        tracing::debug!(%principal, "principal roles changed");
        self.cache.invalidate(principal);
    }

    /// A role's own attributes changed: invalidate its holders when they
    /// can be enumerated, everything otherwise.
    pub fn on_role_changed(&self, role: &RoleSlug) {
        let holders = self
            .holders
            .as_ref()
            .and_then(|index| index.principals_with_role(role));

        match holders {
            Some(principals) => {
                tracing::debug!(role = %role, count = principals.len(), "targeted invalidation");
                for principal in principals {
                    self.cache.invalidate(principal);
                }
            }
            None => {
                tracing::debug!(role = %role, "holder set unknown, global invalidation");
                self.cache.invalidate_all();
            }
        }
    }

    /// A role's permission set changed: the derived closure of every
    /// holder shifted, and holders are not tracked per cache key, so
    /// invalidate globally.
    pub fn on_role_permissions_changed(&self, role: &RoleSlug) {
        tracing::debug!(role = %role, "role permissions changed, global invalidation");
        self.cache.invalidate_all();
    }

    /// Conservative: any principal might have held the deleted role.
    pub fn on_role_deleted(&self, role: &RoleSlug) {
        tracing::debug!(role = %role, "role deleted, global invalidation");
        self.cache.invalidate_all();
    }

    /// Name-based cache keys are stale after a rename.
    pub fn on_permission_renamed(&self, permission: &Permission) {
        tracing::debug!(permission = %permission, "permission renamed, global invalidation");
        self.cache.invalidate_all();
    }

    pub fn on_permission_deleted(&self, permission: &Permission) {
        tracing::debug!(permission = %permission, "permission deleted, global invalidation");
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use crate::cache::InMemoryDecisionCache;

    struct FixedHolders(Vec<PrincipalId>);

    impl HolderIndex for FixedHolders {
        fn principals_with_role(&self, _role: &RoleSlug) -> Option<Vec<PrincipalId>> {
            Some(self.0.clone())
        }
    }

    struct UnknownHolders;

    impl HolderIndex for UnknownHolders {
        fn principals_with_role(&self, _role: &RoleSlug) -> Option<Vec<PrincipalId>> {
            None
        }
    }

    fn seeded_cache(
        holder: PrincipalId,
        bystander: PrincipalId,
    ) -> Arc<InMemoryDecisionCache> {
        let cache = Arc::new(InMemoryDecisionCache::new(Duration::minutes(5)));
        cache.put(holder, &Permission::new("users.view"), true);
        cache.put(bystander, &Permission::new("users.view"), true);
        cache
    }

    #[test]
    fn role_changed_invalidates_holders_only_with_index() {
        let holder = PrincipalId::new();
        let bystander = PrincipalId::new();
        let cache = seeded_cache(holder, bystander);

        let invalidator = CacheInvalidator::new(cache.clone())
            .with_holder_index(Arc::new(FixedHolders(vec![holder])));
        invalidator.on_role_changed(&RoleSlug::new("editor").unwrap());

        assert_eq!(cache.get(holder, &Permission::new("users.view")), None);
        assert_eq!(cache.get(bystander, &Permission::new("users.view")), Some(true));
    }

    #[test]
    fn role_changed_escalates_to_global_without_enumeration() {
        let holder = PrincipalId::new();
        let bystander = PrincipalId::new();
        let cache = seeded_cache(holder, bystander);

        let invalidator =
            CacheInvalidator::new(cache.clone()).with_holder_index(Arc::new(UnknownHolders));
        invalidator.on_role_changed(&RoleSlug::new("editor").unwrap());

        assert!(cache.is_empty());
    }

    #[test]
    fn role_permission_changes_invalidate_globally() {
        let holder = PrincipalId::new();
        let bystander = PrincipalId::new();
        let cache = seeded_cache(holder, bystander);

        let invalidator = CacheInvalidator::new(cache.clone())
            .with_holder_index(Arc::new(FixedHolders(vec![holder])));
        invalidator.on_role_permissions_changed(&RoleSlug::new("editor").unwrap());

        assert!(cache.is_empty());
    }

    #[test]
    fn permission_and_role_deletions_invalidate_globally() {
        let holder = PrincipalId::new();
        let bystander = PrincipalId::new();

        let cache = seeded_cache(holder, bystander);
        CacheInvalidator::new(cache.clone()).on_permission_deleted(&Permission::new("users.view"));
        assert!(cache.is_empty());

        let cache = seeded_cache(holder, bystander);
        CacheInvalidator::new(cache.clone()).on_role_deleted(&RoleSlug::new("editor").unwrap());
        assert!(cache.is_empty());

        let cache = seeded_cache(holder, bystander);
        CacheInvalidator::new(cache.clone()).on_permission_renamed(&Permission::new("users.view"));
        assert!(cache.is_empty());
    }

    #[test]
    fn hooks_are_idempotent_and_commutative() {
        let holder = PrincipalId::new();
        let bystander = PrincipalId::new();
        let cache = seeded_cache(holder, bystander);
        let invalidator = CacheInvalidator::new(cache.clone());

        let role = RoleSlug::new("editor").unwrap();
        invalidator.on_role_permissions_changed(&role);
        invalidator.on_role_permissions_changed(&role);
        invalidator.on_principal_roles_changed(holder);

        assert_eq!(cache.get(holder, &Permission::new("users.view")), None);

        // Recompute path is unaffected: a fresh put lands normally.
        cache.put(holder, &Permission::new("users.view"), false);
        assert_eq!(cache.get(holder, &Permission::new("users.view")), Some(false));
    }
}
