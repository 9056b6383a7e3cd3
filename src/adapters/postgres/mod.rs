//! PostgreSQL adapters for the store and ledger ports.

mod circle_directory;
mod invitation_ledger;
mod invitation_store;
mod membership_store;
mod queries;

pub use circle_directory::PostgresCircleDirectory;
pub use invitation_ledger::PostgresInvitationLedger;
pub use invitation_store::PostgresInvitationStore;
pub use membership_store::PostgresMembershipStore;
