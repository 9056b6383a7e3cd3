//! Invitation domain module.
//!
//! # Module Structure
//!
//! - `code` - Code alphabet, value object and collision-avoiding generator
//! - `invitation` - Invitation entity and its terminal Unused -> Used state

mod code;
mod invitation;

pub use code::{CodeGenerator, InvitationCode, CODE_ALPHABET, CODE_LENGTH, MAX_COLLISION_RETRIES};
pub use invitation::{Invitation, Redemption};
