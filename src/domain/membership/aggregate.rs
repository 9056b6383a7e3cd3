//! Membership aggregate entity.

use serde::{Deserialize, Serialize};

use super::{InvitationError, MembershipStatus};
use crate::domain::foundation::{CircleId, MembershipId, Timestamp, UserId};

/// A user's standing within one circle.
///
/// Carries the invitation budget (`remaining_invitations`), the sponsorship
/// counter (`used_invitation_count`) and the link to the sponsoring
/// membership (`invited_by`, `None` only for circle founders).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub circle_id: CircleId,
    pub is_admin: bool,
    pub status: MembershipStatus,
    /// Invitations this member has successfully redeemed to sponsor others.
    pub used_invitation_count: u32,
    /// Additional members this member may still sponsor. Never negative.
    pub remaining_invitations: u32,
    /// Membership of the sponsoring user in the same circle.
    pub invited_by: Option<MembershipId>,
    /// Ride counters, mutated by the rides subsystem, read-only here.
    pub rides_taken: u32,
    pub rides_offered: u32,
    /// Immutable once set.
    pub joined_at: Timestamp,
}

impl Membership {
    /// Creates a membership for a user admitted through an invitation.
    pub fn join(
        user_id: UserId,
        circle_id: CircleId,
        invited_by: MembershipId,
        invitation_quota: u32,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            id: MembershipId::new(),
            user_id,
            circle_id,
            is_admin: false,
            status: MembershipStatus::Active,
            used_invitation_count: 0,
            remaining_invitations: invitation_quota,
            invited_by: Some(invited_by),
            rides_taken: 0,
            rides_offered: 0,
            joined_at,
        }
    }

    /// Creates a founding membership: admin rights and no sponsor.
    pub fn founder(
        user_id: UserId,
        circle_id: CircleId,
        invitation_quota: u32,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            id: MembershipId::new(),
            user_id,
            circle_id,
            is_admin: true,
            status: MembershipStatus::Active,
            used_invitation_count: 0,
            remaining_invitations: invitation_quota,
            invited_by: None,
            rides_taken: 0,
            rides_offered: 0,
            joined_at,
        }
    }

    /// Returns true while the membership has not been deactivated.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Records a successful sponsorship: one invitation consumed, one
    /// member vouched for.
    ///
    /// A zero quota at this point means an invitation existed whose issuer
    /// had no budget left - a broken invariant upstream, reported as
    /// `QuotaInconsistency` rather than clamped.
    pub fn record_sponsorship(&mut self) -> Result<(), InvitationError> {
        if self.remaining_invitations == 0 {
            return Err(InvitationError::quota_inconsistency(
                self.id,
                self.used_invitation_count,
            ));
        }
        self.remaining_invitations -= 1;
        self.used_invitation_count += 1;
        Ok(())
    }

    /// Tags the membership as deactivated. Idempotent; the row survives so
    /// `invited_by` links keep resolving.
    pub fn deactivate(&mut self) {
        self.status = MembershipStatus::Deactivated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Membership {
        Membership::join(
            UserId::new("newcomer").unwrap(),
            CircleId::new(),
            MembershipId::new(),
            10,
            Timestamp::now(),
        )
    }

    #[test]
    fn join_starts_active_with_full_quota() {
        let m = member();
        assert!(m.is_active());
        assert!(!m.is_admin);
        assert_eq!(m.remaining_invitations, 10);
        assert_eq!(m.used_invitation_count, 0);
        assert!(m.invited_by.is_some());
    }

    #[test]
    fn founder_has_no_sponsor_and_admin_rights() {
        let f = Membership::founder(
            UserId::new("founder").unwrap(),
            CircleId::new(),
            10,
            Timestamp::now(),
        );
        assert!(f.is_admin);
        assert!(f.invited_by.is_none());
    }

    #[test]
    fn record_sponsorship_moves_one_unit_of_quota() {
        let mut m = member();
        m.record_sponsorship().unwrap();
        assert_eq!(m.remaining_invitations, 9);
        assert_eq!(m.used_invitation_count, 1);
    }

    #[test]
    fn record_sponsorship_at_zero_quota_is_an_inconsistency() {
        let mut m = member();
        m.remaining_invitations = 0;
        let err = m.record_sponsorship().unwrap_err();
        assert!(matches!(err, InvitationError::QuotaInconsistency { .. }));
        // Nothing moved.
        assert_eq!(m.used_invitation_count, 0);
    }

    #[test]
    fn deactivate_is_idempotent() {
        let mut m = member();
        m.deactivate();
        m.deactivate();
        assert!(!m.is_active());
        assert_eq!(m.status, MembershipStatus::Deactivated);
    }
}
