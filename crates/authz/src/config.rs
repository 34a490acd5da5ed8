//! Engine configuration.
//!
//! Configuration is an immutable struct injected at construction, with a
//! lifecycle of process startup to shutdown. A config reload reconstructs
//! the engine; nothing mutates shared flags in place.

use chrono::Duration;
use thiserror::Error;

use crate::role::RoleSlug;

/// Malformed authorization configuration.
///
/// Detected at startup/validation time, never at decision time; deployment
/// validation treats these as fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("authorization is enabled but no super-admin role is designated")]
    MissingSuperAdminRole,

    #[error("super-admin designation '{0}' is not a system role")]
    NonSystemSuperAdmin(RoleSlug),

    #[error("cache TTL must be positive")]
    NonPositiveCacheTtl,
}

/// Authorization engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
    /// Deployment kill-switch: when false, every decision is `Allow`.
    pub enabled: bool,

    /// Role whose holders bypass permission lookup. Required while
    /// authorization is enabled.
    pub super_admin_role: Option<RoleSlug>,

    /// Staleness bound on cached decisions.
    pub cache_ttl: Duration,
}

impl AuthzConfig {
    /// Validate and construct a configuration.
    pub fn new(
        enabled: bool,
        super_admin_role: Option<RoleSlug>,
        cache_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            enabled,
            super_admin_role,
            cache_ttl,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled {
            match &self.super_admin_role {
                None => return Err(ConfigError::MissingSuperAdminRole),
                Some(slug) if !slug.is_system() => {
                    return Err(ConfigError::NonSystemSuperAdmin(slug.clone()));
                }
                Some(_) => {}
            }
        }
        if self.cache_ttl <= Duration::zero() {
            return Err(ConfigError::NonPositiveCacheTtl);
        }
        Ok(())
    }

    /// Kill-switch configuration: authorization off, every decision allows.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            super_admin_role: None,
            cache_ttl: Duration::minutes(5),
        }
    }
}

impl Default for AuthzConfig {
    /// Enabled, `super_admin` designated, five-minute cache TTL.
    fn default() -> Self {
        Self {
            enabled: true,
            super_admin_role: Some(RoleSlug::super_admin()),
            cache_ttl: Duration::minutes(5),
        }
    }
}
