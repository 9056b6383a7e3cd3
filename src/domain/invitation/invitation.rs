//! Invitation entity.

use serde::{Deserialize, Serialize};

use super::InvitationCode;
use crate::domain::foundation::{CircleId, InvitationId, MembershipId, Timestamp, UserId};
use crate::domain::membership::InvitationError;

/// Redemption state of an invitation.
///
/// `Unused -> Used` is the only transition and it is terminal. A `Revoked`
/// state could be added here later without touching `Used` semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum Redemption {
    Unused,
    Used { by: UserId, at: Timestamp },
}

/// A single-use code tying an issuer to a future member.
///
/// Invitations are never destroyed; redeemed ones stay as the audit trail
/// of who vouched for whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    /// Unique across the whole system, not just per circle.
    pub code: InvitationCode,
    pub circle_id: CircleId,
    /// Membership of the issuing member in `circle_id`.
    pub issued_by: MembershipId,
    pub redemption: Redemption,
    pub created_at: Timestamp,
}

impl Invitation {
    /// Issues a fresh, unused invitation.
    pub fn issue(
        code: InvitationCode,
        circle_id: CircleId,
        issued_by: MembershipId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: InvitationId::new(),
            code,
            circle_id,
            issued_by,
            redemption: Redemption::Unused,
            created_at,
        }
    }

    /// Returns true once the invitation has been redeemed.
    pub fn is_used(&self) -> bool {
        matches!(self.redemption, Redemption::Used { .. })
    }

    /// Who redeemed the invitation, if anyone.
    pub fn used_by(&self) -> Option<&UserId> {
        match &self.redemption {
            Redemption::Used { by, .. } => Some(by),
            Redemption::Unused => None,
        }
    }

    /// When the invitation was redeemed, if it was.
    pub fn used_at(&self) -> Option<Timestamp> {
        match &self.redemption {
            Redemption::Used { at, .. } => Some(*at),
            Redemption::Unused => None,
        }
    }

    /// Marks the invitation used. The transition is append-only: a second
    /// call fails with `AlreadyRedeemed` and changes nothing.
    pub fn mark_used(&mut self, by: UserId, at: Timestamp) -> Result<(), InvitationError> {
        if self.is_used() {
            return Err(InvitationError::AlreadyRedeemed);
        }
        self.redemption = Redemption::Used { by, at };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invitation::CodeGenerator;

    fn invitation() -> Invitation {
        Invitation::issue(
            CodeGenerator::seeded(11).generate(),
            CircleId::new(),
            MembershipId::new(),
            Timestamp::now(),
        )
    }

    #[test]
    fn issued_invitation_starts_unused() {
        let inv = invitation();
        assert!(!inv.is_used());
        assert_eq!(inv.used_by(), None);
        assert_eq!(inv.used_at(), None);
    }

    #[test]
    fn mark_used_sets_redeemer_and_time() {
        let mut inv = invitation();
        let user = UserId::new("newcomer").unwrap();
        let at = Timestamp::now();

        inv.mark_used(user.clone(), at).unwrap();

        assert!(inv.is_used());
        assert_eq!(inv.used_by(), Some(&user));
        assert_eq!(inv.used_at(), Some(at));
    }

    #[test]
    fn second_mark_used_fails_and_preserves_first_redemption() {
        let mut inv = invitation();
        let first = UserId::new("first").unwrap();
        let at = Timestamp::now();
        inv.mark_used(first.clone(), at).unwrap();

        let err = inv
            .mark_used(UserId::new("second").unwrap(), Timestamp::now())
            .unwrap_err();

        assert_eq!(err, InvitationError::AlreadyRedeemed);
        assert_eq!(inv.used_by(), Some(&first));
        assert_eq!(inv.used_at(), Some(at));
    }
}
