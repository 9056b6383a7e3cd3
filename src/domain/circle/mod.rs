//! Circle domain module.
//!
//! The circle itself is owned externally; this module carries the read
//! model plus the admission policy evaluated during redemption.

mod admission;
mod circle;

pub use admission::can_admit;
pub use circle::{Circle, Slug};
