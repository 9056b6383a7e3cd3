//! Invitation ledger port - the transactional core.
//!
//! Redemption spans three writes (membership insert, invitation update,
//! issuer counter update) plus the admission read, and all of it must be
//! one atomic unit. The ledger is its own port because that transaction
//! boundary cannot be expressed through the individual store traits.

use crate::domain::circle::Circle;
use crate::domain::foundation::UserId;
use crate::domain::invitation::InvitationCode;
use crate::domain::membership::{InvitationError, Membership};
use async_trait::async_trait;

/// Transactional redemption of invitation codes.
///
/// Implementations must guarantee, under concurrent callers:
/// - two redemptions of the same code cannot both succeed;
/// - a limited circle's active count never exceeds its cap;
/// - nothing is persisted when any step fails (full rollback).
///
/// The ledger does not retry; transient store conflicts surface to the
/// caller, which may retry a bounded number of times.
#[async_trait]
pub trait InvitationLedger: Send + Sync {
    /// Redeem `code` in `circle` on behalf of `candidate`.
    ///
    /// Preconditions, first failure wins:
    /// 1. candidate holds no membership (active or not) -> `AlreadyMember`
    /// 2. a valid invitation matches -> else `InvalidInvitationCode`
    /// 3. the circle can admit one more member -> else `CircleFull`
    ///
    /// On success the new membership is returned; the invitation is marked
    /// used and the issuer's quota moved (`remaining_invitations -= 1`,
    /// `used_invitation_count += 1`). An issuer with zero quota at this
    /// point is a broken invariant -> `QuotaInconsistency`.
    async fn redeem(
        &self,
        circle: &Circle,
        code: &InvitationCode,
        candidate: &UserId,
    ) -> Result<Membership, InvitationError>;
}
