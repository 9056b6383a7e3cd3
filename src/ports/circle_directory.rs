//! Circle directory port.
//!
//! Circles are owned by an external subsystem; this port is the read-only
//! collaborator that resolves a URL slug into a Circle for the core.

use crate::domain::circle::{Circle, Slug};
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Read-only lookup of circles by slug.
#[async_trait]
pub trait CircleDirectory: Send + Sync {
    /// Resolve a slug. Returns `None` when no circle carries it.
    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Circle>, DomainError>;
}
