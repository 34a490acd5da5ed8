//! Panel access resolution.
//!
//! Panels are distinct administrative areas gated by role membership, not
//! by permission names. Resolution is a role-set intersection plus a
//! priority-ordered fallback to a default landing panel.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use panelguard_core::{DomainError, Slug};

use crate::principal::Principal;
use crate::role::RoleSlug;

/// Panel identifier users navigate to (e.g. `admin`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelKey(Slug);

impl PanelKey {
    pub fn new(value: impl Into<Cow<'static, str>>) -> Result<Self, DomainError> {
        Ok(Self(Slug::new(value)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl core::fmt::Display for PanelKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One administrative panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub key: PanelKey,
    pub label: String,
    pub path: String,
    /// Role slugs allowed in; an empty set means unrestricted.
    pub allowed_roles: Vec<RoleSlug>,
    /// Preferred landing target during default-panel resolution.
    pub default_entry: bool,
    pub active: bool,
    /// Resolution order; lower values resolve first.
    pub priority: i32,
}

impl Panel {
    /// Whether `principal` may enter this panel (ignoring `active`, which
    /// the set-level check owns).
    fn admits(&self, principal: &dyn Principal) -> bool {
        self.allowed_roles.is_empty()
            || self.allowed_roles.iter().any(|role| principal.has_role(role))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PanelSetError {
    #[error("panel key '{0}' already exists")]
    DuplicateKey(PanelKey),

    #[error("panel '{0}' not found")]
    UnknownPanel(PanelKey),

    #[error("panel '{0}' is the sole default panel and cannot be removed")]
    SoleDefault(PanelKey),
}

/// Outcome of a panel-entry request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEntry {
    /// Entry allowed; the resolved panel configuration is handed back so
    /// the caller can annotate its request context (resource scoping,
    /// menu generation).
    Allowed { panel: Panel },
    /// Entry denied, but another panel is accessible.
    Redirect { to: PanelKey },
    /// No panel is accessible to this principal.
    Denied,
}

/// The configured panels, resolved in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSet {
    panels: Vec<Panel>,
}

impl PanelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_panels(panels: impl IntoIterator<Item = Panel>) -> Result<Self, PanelSetError> {
        let mut set = Self::new();
        for panel in panels {
            set.insert(panel)?;
        }
        Ok(set)
    }

    /// Add a panel, keeping the set ordered by priority.
    pub fn insert(&mut self, panel: Panel) -> Result<(), PanelSetError> {
        if self.get(&panel.key).is_some() {
            return Err(PanelSetError::DuplicateKey(panel.key));
        }
        let position = self
            .panels
            .partition_point(|existing| existing.priority <= panel.priority);
        self.panels.insert(position, panel);
        Ok(())
    }

    /// Remove a panel. The sole active default panel cannot be removed;
    /// flip another panel's default flag first.
    pub fn remove(&mut self, key: &PanelKey) -> Result<Panel, PanelSetError> {
        let index = self
            .panels
            .iter()
            .position(|panel| &panel.key == key)
            .ok_or_else(|| PanelSetError::UnknownPanel(key.clone()))?;

        let is_sole_default = self.panels[index].default_entry
            && self.panels[index].active
            && !self
                .panels
                .iter()
                .enumerate()
                .any(|(i, panel)| i != index && panel.default_entry && panel.active);
        if is_sole_default {
            return Err(PanelSetError::SoleDefault(key.clone()));
        }

        Ok(self.panels.remove(index))
    }

    pub fn get(&self, key: &PanelKey) -> Option<&Panel> {
        self.panels.iter().find(|panel| &panel.key == key)
    }

    /// Panels in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter()
    }

    /// True iff the panel exists, is active, and the principal's role set
    /// intersects the panel's allowed set (or the panel is unrestricted).
    pub fn can_access(&self, principal: &dyn Principal, key: &PanelKey) -> bool {
        match self.get(key) {
            Some(panel) => panel.active && panel.admits(principal),
            None => false,
        }
    }

    /// First accessible panel in priority order, preferring panels flagged
    /// as default entry.
    pub fn default_panel_for(&self, principal: &dyn Principal) -> Option<PanelKey> {
        let accessible = || {
            self.panels
                .iter()
                .filter(|panel| panel.active && panel.admits(principal))
        };

        accessible()
            .find(|panel| panel.default_entry)
            .or_else(|| accessible().next())
            .map(|panel| panel.key.clone())
    }

    /// Panel-entry decision: allow, redirect to the principal's default
    /// panel, or deny outright when nothing is accessible.
    pub fn resolve_entry(&self, principal: &dyn Principal, requested: &PanelKey) -> PanelEntry {
        if let Some(panel) = self.get(requested) {
            if panel.active && panel.admits(principal) {
                return PanelEntry::Allowed {
                    panel: panel.clone(),
                };
            }
        }

        match self.default_panel_for(principal) {
            Some(to) => {
                tracing::debug!(requested = %requested, redirect = %to, "panel entry redirected");
                PanelEntry::Redirect { to }
            }
            None => {
                tracing::debug!(requested = %requested, "panel entry denied");
                PanelEntry::Denied
            }
        }
    }
}
