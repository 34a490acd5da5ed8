//! Slug value object: lowercase machine-readable names.
//!
//! Role slugs (`super_admin`), panel keys (`admin`) and permission name
//! segments all share one grammar: non-empty, ASCII lowercase letters,
//! digits and underscores.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A validated lowercase slug.
///
/// Slugs are compared by value. Construction validates the grammar once;
/// everything downstream can rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(Cow<'static, str>);

impl Slug {
    /// Validate and construct a slug.
    pub fn new(value: impl Into<Cow<'static, str>>) -> Result<Self, DomainError> {
        let value = value.into();
        if !is_valid_slug(&value) {
            return Err(DomainError::validation(format!(
                "invalid slug '{value}': expected non-empty [a-z0-9_]+"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check the slug grammar: non-empty `[a-z0-9_]+`.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
