//! Membership command/query handlers.

mod deactivate_membership;
mod get_member;
mod invitation_breakdown;
mod list_members;
mod redeem_invitation;

pub use deactivate_membership::{DeactivateMembershipCommand, DeactivateMembershipHandler};
pub use get_member::{GetMemberHandler, GetMemberQuery};
pub use invitation_breakdown::{
    InvitationBreakdown, InvitationBreakdownHandler, InvitationBreakdownQuery,
};
pub use list_members::{ListMembersHandler, ListMembersQuery};
pub use redeem_invitation::{RedeemInvitationCommand, RedeemInvitationHandler};
