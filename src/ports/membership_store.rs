//! Membership store port.
//!
//! Contract for persisting and retrieving Membership records. A membership
//! is identified by (user, circle); implementations must enforce that pair
//! as a unique constraint and must never hard-delete rows, since historical
//! `invited_by` references have to stay resolvable.

use crate::domain::foundation::{CircleId, DomainError, MembershipId, UserId};
use crate::domain::membership::Membership;
use async_trait::async_trait;

/// Store port for Membership persistence.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a new membership.
    ///
    /// # Errors
    ///
    /// - `AlreadyMember` if (user, circle) already exists, active or not
    /// - `DatabaseError` on persistence failure
    async fn create(&self, membership: &Membership) -> Result<(), DomainError>;

    /// Find a user's membership in a circle, regardless of status.
    ///
    /// Returns `None` if the user never joined the circle.
    async fn get(
        &self,
        user_id: &UserId,
        circle_id: &CircleId,
    ) -> Result<Option<Membership>, DomainError>;

    /// Whether any membership row (active or not) exists for (user, circle).
    async fn exists(&self, user_id: &UserId, circle_id: &CircleId) -> Result<bool, DomainError>;

    /// Count of active memberships in the circle.
    async fn active_count(&self, circle_id: &CircleId) -> Result<u32, DomainError>;

    /// Soft-delete: tag the membership as deactivated.
    ///
    /// # Errors
    ///
    /// - `MemberNotFound` if the user has no active membership in the circle
    async fn deactivate(&self, user_id: &UserId, circle_id: &CircleId)
        -> Result<(), DomainError>;

    /// All active memberships in the circle.
    async fn list_active(&self, circle_id: &CircleId) -> Result<Vec<Membership>, DomainError>;

    /// Active memberships in the circle sponsored by `invited_by`.
    async fn list_invited_by(
        &self,
        circle_id: &CircleId,
        invited_by: &MembershipId,
    ) -> Result<Vec<Membership>, DomainError>;
}
