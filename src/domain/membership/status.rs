//! MembershipStatus - soft-delete state for memberships.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A membership is never physically deleted: historical `invited_by`
/// references must remain resolvable, so leaving a circle only tags the
/// membership as deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Deactivated,
}

impl MembershipStatus {
    /// Returns true for the active state.
    pub fn is_active(&self) -> bool {
        matches!(self, MembershipStatus::Active)
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Deactivated => "deactivated",
        };
        write!(f, "{}", s)
    }
}
