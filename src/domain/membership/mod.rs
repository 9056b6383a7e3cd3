//! Membership domain module.
//!
//! # Module Structure
//!
//! - `aggregate` - Membership aggregate entity
//! - `status` - Active/Deactivated soft-delete state
//! - `errors` - InvitationError taxonomy

mod aggregate;
mod errors;
mod status;

pub use aggregate::Membership;
pub use errors::InvitationError;
pub use status::MembershipStatus;
