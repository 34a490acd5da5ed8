//! Policy engine: the ordered decision chain.
//!
//! Every rule is an evaluator returning `Option<Decision>`; the first
//! `Some` terminates the chain. Precedence:
//!
//! 1. missing principal → `Unauthenticated`
//! 2. kill-switch (authorization disabled) → `Allow`
//! 3. protected-entity guard (system roles) → `Deny`, super-admins included
//! 4. self-protection guard (own user record delete) → `Deny`, super-admins
//!    included
//! 5. super-admin bypass → `Allow`
//! 6. per-resource overrides (self-service, escalation guards)
//! 7. permission lookup through the decision cache

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use panelguard_core::PrincipalId;

use crate::cache::DecisionCache;
use crate::config::AuthzConfig;
use crate::principal::Principal;
use crate::registry::PermissionCatalog;
use crate::role::RoleSlug;
use crate::Permission;

/// Resource keys with bespoke override rules.
pub mod resources {
    pub const USERS: &str = "users";
    pub const ROLES: &str = "roles";
}

/// Actions referenced by the built-in override rules.
pub mod actions {
    pub const VIEW: &str = "view";
    pub const UPDATE: &str = "update";
    pub const UPDATE_ROLES: &str = "update.roles";
    pub const DELETE: &str = "delete";
    pub const IMPERSONATE: &str = "impersonate";
    pub const ASSIGN: &str = "assign";
}

/// Outcome of an authorization check.
///
/// `Unauthenticated` is distinct from `Deny` so callers can choose 401 vs
/// 403 semantics; the engine itself never surfaces errors on the decision
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    Unauthenticated,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Optional target entity of a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A user record: its identity plus whether that user is a super-admin
    /// (escalation guards evaluate the *target's* flag, not the actor's).
    User {
        id: PrincipalId,
        super_admin: bool,
    },
    /// A role record, identified by slug.
    Role { slug: RoleSlug },
}

impl Target {
    pub fn user(id: PrincipalId, super_admin: bool) -> Self {
        Self::User { id, super_admin }
    }

    pub fn role(slug: RoleSlug) -> Self {
        Self::Role { slug }
    }
}

/// Per-resource decision procedure over a principal's role/permission graph.
pub struct PolicyEngine {
    config: AuthzConfig,
    catalog: PermissionCatalog,
    cache: Arc<dyn DecisionCache>,
}

impl PolicyEngine {
    pub fn new(
        config: AuthzConfig,
        catalog: PermissionCatalog,
        cache: Arc<dyn DecisionCache>,
    ) -> Self {
        Self {
            config,
            catalog,
            cache,
        }
    }

    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Decide whether `principal` may perform `action` on `resource`,
    /// optionally against a concrete `target` entity.
    ///
    /// - No IO beyond the decision cache
    /// - No panics
    /// - Always resolves to a decision, never an error
    pub fn authorize(
        &self,
        principal: Option<&dyn Principal>,
        resource: &str,
        action: &str,
        target: Option<&Target>,
    ) -> Decision {
        let Some(principal) = principal else {
            return Decision::Unauthenticated;
        };

        if !self.config.enabled {
            return Decision::Allow;
        }

        if let Some(decision) = protected_role_guard(resource, action, target) {
            return decision;
        }

        if let Some(decision) = self_delete_guard(principal, resource, action, target) {
            return decision;
        }

        if principal.is_super_admin() {
            return Decision::Allow;
        }

        if let Some(decision) = resource_override(principal, resource, action, target) {
            return decision;
        }

        self.permission_lookup(principal, resource, action)
    }

    /// Step 7: canonical name, cache consult, closure evaluation on miss.
    fn permission_lookup(
        &self,
        principal: &dyn Principal,
        resource: &str,
        action: &str,
    ) -> Decision {
        let name = Permission::build(resource, action);

        if !self.catalog.is_valid(&name) {
            // Diagnostic only; the decision path is unchanged and the
            // lookup below resolves against the principal's closure.
            tracing::warn!(permission = %name, "permission name not in catalog");
        }

        if let Some(cached) = self.cache.get(principal.id(), &name) {
            tracing::trace!(principal = %principal.id(), permission = %name, cached, "cache hit");
            return if cached { Decision::Allow } else { Decision::Deny };
        }

        let granted = principal.has_permission(&name);
        self.cache.put(principal.id(), &name, granted);

        if granted {
            Decision::Allow
        } else {
            tracing::debug!(principal = %principal.id(), permission = %name, "permission denied");
            Decision::Deny
        }
    }
}

/// Step 3: system roles can never be updated or deleted, by anyone.
fn protected_role_guard(resource: &str, action: &str, target: Option<&Target>) -> Option<Decision> {
    if resource != resources::ROLES {
        return None;
    }
    if action != actions::UPDATE && action != actions::DELETE {
        return None;
    }
    match target {
        Some(Target::Role { slug }) if slug.is_system() => {
            tracing::debug!(role = %slug, action, "denied mutation of system role");
            Some(Decision::Deny)
        }
        _ => None,
    }
}

/// Step 4: a principal may never delete its own record, by anyone.
fn self_delete_guard(
    principal: &dyn Principal,
    resource: &str,
    action: &str,
    target: Option<&Target>,
) -> Option<Decision> {
    if resource != resources::USERS || action != actions::DELETE {
        return None;
    }
    match target {
        Some(Target::User { id, .. }) if *id == principal.id() => {
            tracing::debug!(principal = %principal.id(), "denied self-deletion");
            Some(Decision::Deny)
        }
        _ => None,
    }
}

/// Step 6: bespoke rules that run before permission lookup. Only the
/// `users` and `roles` resources declare overrides; everything else falls
/// through to the lookup.
fn resource_override(
    principal: &dyn Principal,
    resource: &str,
    action: &str,
    target: Option<&Target>,
) -> Option<Decision> {
    match resource {
        resources::USERS => users_override(principal, action, target),
        resources::ROLES => roles_override(action, target),
        _ => None,
    }
}

fn users_override(
    principal: &dyn Principal,
    action: &str,
    target: Option<&Target>,
) -> Option<Decision> {
    let Some(Target::User { id, super_admin }) = target else {
        return None;
    };

    if *id == principal.id() {
        // Role escalation is always denied to self, even with the matching
        // permission; plain view/update of the own record always allows.
        if action == actions::UPDATE_ROLES {
            return Some(Decision::Deny);
        }
        if action == actions::VIEW || action == actions::UPDATE {
            return Some(Decision::Allow);
        }
    }

    // Escalation guard: a non-super-admin may neither delete nor
    // impersonate a super-admin principal. (Super-admin actors never reach
    // this rule; the bypass fires first.)
    if *super_admin && (action == actions::DELETE || action == actions::IMPERSONATE) {
        tracing::debug!(target = %id, action, "denied action against super-admin principal");
        return Some(Decision::Deny);
    }

    None
}

fn roles_override(action: &str, target: Option<&Target>) -> Option<Decision> {
    let Some(Target::Role { slug }) = target else {
        return None;
    };

    // A non-super-admin may never hand out the super_admin role.
    if action == actions::ASSIGN && slug.is_super_admin() {
        tracing::debug!("denied assignment of super_admin role");
        return Some(Decision::Deny);
    }

    None
}
