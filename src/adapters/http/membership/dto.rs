//! HTTP DTOs (Data Transfer Objects) for circle membership endpoints.
//!
//! These types define the JSON request/response structure for the members
//! API. They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::handlers::membership::InvitationBreakdown;
use crate::domain::membership::{Membership, MembershipStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to join a circle with an invitation code.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemInvitationRequest {
    /// The single-use code handed out by an existing member.
    pub invitation_code: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A member of a circle as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    /// Membership ID.
    pub id: String,
    /// Username of the member.
    pub username: String,
    pub is_admin: bool,
    pub status: MembershipStatus,
    /// Members this member has sponsored so far.
    pub used_invitation_count: u32,
    /// Members this member may still sponsor.
    pub remaining_invitations: u32,
    /// Membership ID of the sponsor, null for founders.
    pub invited_by: Option<String>,
    pub rides_taken: u32,
    pub rides_offered: u32,
    /// When the member joined (ISO 8601).
    pub joined_at: String,
}

impl From<Membership> for MemberResponse {
    fn from(membership: Membership) -> Self {
        Self {
            id: membership.id.to_string(),
            username: membership.user_id.to_string(),
            is_admin: membership.is_admin,
            status: membership.status,
            used_invitation_count: membership.used_invitation_count,
            remaining_invitations: membership.remaining_invitations,
            invited_by: membership.invited_by.map(|id| id.to_string()),
            rides_taken: membership.rides_taken,
            rides_offered: membership.rides_offered,
            joined_at: membership.joined_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for the member list.
#[derive(Debug, Clone, Serialize)]
pub struct MembersListResponse {
    pub members: Vec<MemberResponse>,
}

/// Response for a member's invitation breakdown.
///
/// `invitation` is singular for compatibility with existing clients.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationBreakdownResponse {
    /// Active members sponsored by this member.
    pub used_invitations: Vec<MemberResponse>,
    /// Outstanding codes the member can still hand out.
    pub invitation: Vec<String>,
}

impl From<InvitationBreakdown> for InvitationBreakdownResponse {
    fn from(breakdown: InvitationBreakdown) -> Self {
        Self {
            used_invitations: breakdown
                .used_invitations
                .into_iter()
                .map(MemberResponse::from)
                .collect(),
            invitation: breakdown
                .available_codes
                .into_iter()
                .map(|code| code.to_string())
                .collect(),
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CircleId, MembershipId, Timestamp, UserId};

    #[test]
    fn member_response_exposes_sponsor_link() {
        let sponsor = MembershipId::new();
        let membership = Membership::join(
            UserId::new("rider").unwrap(),
            CircleId::new(),
            sponsor,
            10,
            Timestamp::now(),
        );

        let response = MemberResponse::from(membership);
        assert_eq!(response.username, "rider");
        assert_eq!(response.invited_by, Some(sponsor.to_string()));
        assert!(!response.is_admin);
    }

    #[test]
    fn founder_response_has_null_sponsor() {
        let membership = Membership::founder(
            UserId::new("founder").unwrap(),
            CircleId::new(),
            10,
            Timestamp::now(),
        );

        let response = MemberResponse::from(membership);
        assert_eq!(response.invited_by, None);
        assert!(response.is_admin);
    }
}
