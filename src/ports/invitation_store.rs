//! Invitation store port.
//!
//! Contract for invitation persistence. Codes are unique across the whole
//! system; implementations must enforce that with a constraint on `code`
//! and re-roll generation on collision rather than checking first
//! (check-then-act would race).

use crate::domain::foundation::{CircleId, DomainError, InvitationId, MembershipId, Timestamp, UserId};
use crate::domain::invitation::{Invitation, InvitationCode};
use async_trait::async_trait;

/// Store port for Invitation persistence.
#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Create a fresh, unused invitation with an auto-assigned unique code.
    ///
    /// # Errors
    ///
    /// - `CodeSpaceExhausted` if generation keeps colliding past the bound
    /// - `DatabaseError` on persistence failure
    async fn create(
        &self,
        circle_id: &CircleId,
        issued_by: &MembershipId,
    ) -> Result<Invitation, DomainError>;

    /// Find a redeemable invitation: code matches, circle matches, unused.
    ///
    /// Returns `None` for unknown, used and wrong-circle codes alike.
    async fn find_valid(
        &self,
        code: &InvitationCode,
        circle_id: &CircleId,
    ) -> Result<Option<Invitation>, DomainError>;

    /// Record redemption of an invitation.
    ///
    /// # Errors
    ///
    /// - `AlreadyRedeemed` if the invitation was already used
    /// - `InvitationNotFound` if no such invitation exists
    async fn mark_used(
        &self,
        id: &InvitationId,
        used_by: &UserId,
        at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Codes of the issuer's outstanding (unused) invitations in the circle.
    async fn list_unused_by_issuer(
        &self,
        issued_by: &MembershipId,
        circle_id: &CircleId,
    ) -> Result<Vec<InvitationCode>, DomainError>;
}
