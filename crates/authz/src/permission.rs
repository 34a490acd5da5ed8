//! Permission identifiers.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use panelguard_core::slug::is_valid_slug;

/// Permission identifier of the form `resource.action`.
///
/// Permissions are modeled as opaque strings (e.g. "users.create"). The
/// decision path never treats a malformed or unknown name as an error:
/// a name outside the catalog simply never matches anything and denies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Canonical name for a (resource, action) pair.
    ///
    /// Deterministic dot concatenation: `build("users", "create")` is
    /// `"users.create"`. Dotted sub-actions compose the same way:
    /// `build("users", "update.roles")` is `"users.update.roles"`.
    pub fn build(resource: &str, action: &str) -> Self {
        Self(Cow::Owned(format!("{resource}.{action}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(resource, action)` on the first dot.
    ///
    /// Returns `None` (not an error) when the name contains no dot.
    pub fn parse(&self) -> Option<(&str, &str)> {
        self.0.split_once('.')
    }

    /// The resource segment, when the name has one.
    pub fn resource(&self) -> Option<&str> {
        self.parse().map(|(resource, _)| resource)
    }

    /// Grammar check: two or more non-empty `[a-z0-9_]+` segments joined
    /// by dots.
    pub fn is_well_formed(&self) -> bool {
        let mut segments = 0;
        for segment in self.0.split('.') {
            if !is_valid_slug(segment) {
                return false;
            }
            segments += 1;
        }
        segments >= 2
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
