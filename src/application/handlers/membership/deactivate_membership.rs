//! DeactivateMembershipHandler - soft removal of a member from a circle.

use std::sync::Arc;

use tracing::info;

use crate::domain::circle::Circle;
use crate::domain::foundation::UserId;
use crate::domain::membership::{InvitationError, Membership};
use crate::ports::MembershipStore;

/// Command to deactivate a membership.
#[derive(Debug, Clone)]
pub struct DeactivateMembershipCommand {
    pub circle: Circle,
    pub member: UserId,
}

/// Handler for membership deactivation. The row is kept; only the status
/// flips, so sponsorship history stays intact.
pub struct DeactivateMembershipHandler {
    memberships: Arc<dyn MembershipStore>,
}

impl DeactivateMembershipHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    pub async fn handle(&self, cmd: DeactivateMembershipCommand) -> Result<(), InvitationError> {
        let member = self
            .memberships
            .get(&cmd.member, &cmd.circle.id)
            .await?
            .filter(Membership::is_active)
            .ok_or_else(|| InvitationError::member_not_found(cmd.member.clone(), cmd.circle.id))?;

        self.memberships
            .deactivate(&member.user_id, &cmd.circle.id)
            .await?;

        info!(circle = %cmd.circle.slug, member = %member.user_id, "membership deactivated");
        Ok(())
    }
}
