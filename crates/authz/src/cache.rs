//! Authorization decision cache.
//!
//! The cache is purely an optimization layer: the role/permission store is
//! the system of record, and any miss safely recomputes from it. Entries
//! carry a TTL so that a stale `allow` can never outlive the configured
//! window even if an invalidation is lost — that bound, not targeted
//! invalidation, is the correctness backstop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use panelguard_core::PrincipalId;

use crate::Permission;

/// Process-wide cache of `(principal, permission) → decision`.
///
/// Implementations must be safe to share across request threads; per-key
/// operations are independent and need no external coordination.
pub trait DecisionCache: Send + Sync {
    /// Cached decision, or `None` on miss (absent or stale).
    fn get(&self, principal: PrincipalId, permission: &Permission) -> Option<bool>;

    fn put(&self, principal: PrincipalId, permission: &Permission, decision: bool);

    /// Drop every cached decision for one principal.
    fn invalidate(&self, principal: PrincipalId);

    /// Drop the entire cache. Always correct; targeted invalidation is an
    /// optimization on top of this.
    fn invalidate_all(&self);
}

impl<C> DecisionCache for Arc<C>
where
    C: DecisionCache + ?Sized,
{
    fn get(&self, principal: PrincipalId, permission: &Permission) -> Option<bool> {
        (**self).get(principal, permission)
    }

    fn put(&self, principal: PrincipalId, permission: &Permission, decision: bool) {
        (**self).put(principal, permission, decision)
    }

    fn invalidate(&self, principal: PrincipalId) {
        (**self).invalidate(principal)
    }

    fn invalidate_all(&self) {
        (**self).invalidate_all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CachedDecision {
    decision: bool,
    cached_at: DateTime<Utc>,
}

/// In-process `DecisionCache` backed by a mutexed map.
///
/// Stale entries are evicted lazily on read.
#[derive(Debug)]
pub struct InMemoryDecisionCache {
    ttl: Duration,
    entries: Mutex<HashMap<(PrincipalId, Permission), CachedDecision>>,
}

impl InMemoryDecisionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live (possibly stale) entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(PrincipalId, Permission), CachedDecision>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn put_at(
        &self,
        principal: PrincipalId,
        permission: &Permission,
        decision: bool,
        cached_at: DateTime<Utc>,
    ) {
        self.lock().insert(
            (principal, permission.clone()),
            CachedDecision { decision, cached_at },
        );
    }
}

impl DecisionCache for InMemoryDecisionCache {
    fn get(&self, principal: PrincipalId, permission: &Permission) -> Option<bool> {
        let key = (principal, permission.clone());
        let mut entries = self.lock();
        let entry = entries.get(&key).copied()?;

        let age = Utc::now().signed_duration_since(entry.cached_at);
        if age > self.ttl {
            entries.remove(&key);
            return None;
        }

        Some(entry.decision)
    }

    fn put(&self, principal: PrincipalId, permission: &Permission, decision: bool) {
        self.put_at(principal, permission, decision, Utc::now());
    }

    fn invalidate(&self, principal: PrincipalId) {
        let mut entries = self.lock();
        entries.retain(|(cached_principal, _), _| *cached_principal != principal);
        tracing::debug!(%principal, "invalidated cached decisions for principal");
    }

    fn invalidate_all(&self) {
        self.lock().clear();
        tracing::debug!("invalidated all cached decisions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> InMemoryDecisionCache {
        InMemoryDecisionCache::new(Duration::minutes(5))
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = cache();
        let principal = PrincipalId::new();
        let permission = Permission::new("users.view");

        assert_eq!(cache.get(principal, &permission), None);
        cache.put(principal, &permission, true);
        assert_eq!(cache.get(principal, &permission), Some(true));
        cache.put(principal, &permission, false);
        assert_eq!(cache.get(principal, &permission), Some(false));
    }

    #[test]
    fn stale_entries_are_misses_and_evicted() {
        let cache = cache();
        let principal = PrincipalId::new();
        let permission = Permission::new("users.view");

        let stale = Utc::now() - Duration::minutes(6);
        cache.put_at(principal, &permission, true, stale);

        assert_eq!(cache.get(principal, &permission), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_targets_one_principal() {
        let cache = cache();
        let alice = PrincipalId::new();
        let bob = PrincipalId::new();
        let permission = Permission::new("users.delete");

        cache.put(alice, &permission, true);
        cache.put(bob, &permission, false);

        cache.invalidate(alice);

        assert_eq!(cache.get(alice, &permission), None);
        assert_eq!(cache.get(bob, &permission), Some(false));
    }

    #[test]
    fn invalidate_is_idempotent() {
        let cache = cache();
        let principal = PrincipalId::new();
        let permission = Permission::new("roles.view");

        cache.put(principal, &permission, true);
        cache.invalidate(principal);
        cache.invalidate(principal);
        assert_eq!(cache.get(principal, &permission), None);

        cache.put(principal, &permission, true);
        assert_eq!(cache.get(principal, &permission), Some(true));
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let cache = cache();
        let alice = PrincipalId::new();
        let bob = PrincipalId::new();

        cache.put(alice, &Permission::new("users.view"), true);
        cache.put(bob, &Permission::new("roles.view"), true);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
