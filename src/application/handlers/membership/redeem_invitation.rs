//! RedeemInvitationHandler - Command handler for joining a circle with a code.

use std::sync::Arc;

use tracing::info;

use crate::domain::circle::Circle;
use crate::domain::foundation::UserId;
use crate::domain::invitation::InvitationCode;
use crate::domain::membership::{InvitationError, Membership};
use crate::ports::{InvitationLedger, MembershipStore};

/// Command to redeem an invitation code into a membership.
#[derive(Debug, Clone)]
pub struct RedeemInvitationCommand {
    pub circle: Circle,
    pub candidate: UserId,
    /// Raw code as presented by the caller; parsed here.
    pub invitation_code: String,
}

/// Handler for invitation redemption.
pub struct RedeemInvitationHandler {
    ledger: Arc<dyn InvitationLedger>,
    memberships: Arc<dyn MembershipStore>,
}

impl RedeemInvitationHandler {
    pub fn new(ledger: Arc<dyn InvitationLedger>, memberships: Arc<dyn MembershipStore>) -> Self {
        Self {
            ledger,
            memberships,
        }
    }

    pub async fn handle(
        &self,
        cmd: RedeemInvitationCommand,
    ) -> Result<Membership, InvitationError> {
        // A malformed code cannot name any invitation; same answer as an
        // unknown one so the caller learns nothing about the code space.
        let code = InvitationCode::parse(&cmd.invitation_code)
            .map_err(|_| InvitationError::InvalidInvitationCode)?;

        // Fast-path membership check. The ledger re-validates inside the
        // transaction; this only fails the obvious case early.
        if self
            .memberships
            .exists(&cmd.candidate, &cmd.circle.id)
            .await?
        {
            return Err(InvitationError::already_member(
                cmd.candidate,
                cmd.circle.id,
            ));
        }

        let membership = self.ledger.redeem(&cmd.circle, &code, &cmd.candidate).await?;

        info!(
            circle = %cmd.circle.slug,
            member = %membership.user_id,
            sponsor = ?membership.invited_by,
            "invitation redeemed"
        );

        Ok(membership)
    }
}
