//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `circle` - Circle read model and admission policy
//! - `membership` - Membership aggregate and the invitation error taxonomy
//! - `invitation` - Invitation lifecycle and code generation

pub mod circle;
pub mod foundation;
pub mod invitation;
pub mod membership;
