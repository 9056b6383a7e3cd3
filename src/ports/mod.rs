//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `MembershipStore` - membership persistence
//! - `InvitationStore` - invitation persistence and code assignment
//! - `InvitationLedger` - the atomic redeem transaction
//! - `CircleDirectory` - slug resolution for externally-owned circles

mod circle_directory;
mod invitation_ledger;
mod invitation_store;
mod membership_store;

pub use circle_directory::CircleDirectory;
pub use invitation_ledger::InvitationLedger;
pub use invitation_store::InvitationStore;
pub use membership_store::MembershipStore;
