//! Circle read model.
//!
//! Circles are owned by an external subsystem; this core only reads them to
//! resolve slugs and evaluate admission. Nothing here mutates a circle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{CircleId, ValidationError};

/// Human-readable circle identifier used in URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    /// Creates a slug, rejecting empty strings and characters that would not
    /// survive a URL path segment.
    pub fn new(slug: impl Into<String>) -> Result<Self, ValidationError> {
        let slug = slug.into();
        if slug.is_empty() {
            return Err(ValidationError::empty_field("slug"));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "slug",
                "only ASCII alphanumerics, '-' and '_' are allowed",
            ));
        }
        Ok(Self(slug))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounded private group users join via invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circle {
    pub id: CircleId,
    pub slug: Slug,
    /// Whether the circle caps its active membership.
    pub is_limited: bool,
    /// Member cap; meaningful only when `is_limited` is true.
    pub members_limit: u32,
}

impl Circle {
    /// Returns the member cap, or `None` for unlimited circles.
    pub fn member_cap(&self) -> Option<u32> {
        self.is_limited.then_some(self.members_limit)
    }
}
