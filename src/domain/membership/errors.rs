//! Invitation and membership error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | AlreadyMember | 409 |
//! | InvalidInvitationCode | 400 |
//! | CircleFull | 400 |
//! | AlreadyRedeemed | 409 |
//! | QuotaInconsistency | 500 |
//! | CodeSpaceExhausted | 500 |
//! | CircleNotFound | 404 |
//! | MemberNotFound | 404 |
//! | Forbidden | 403 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |
//!
//! `InvalidInvitationCode` deliberately conflates unknown, already-used and
//! wrong-circle codes so callers cannot probe which codes exist.

use crate::domain::foundation::{CircleId, DomainError, ErrorCode, MembershipId, UserId};

/// Errors raised by the invitation/membership core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvitationError {
    /// Candidate already holds a membership (active or not) in the circle.
    AlreadyMember { user_id: UserId, circle_id: CircleId },

    /// No redeemable invitation matches the presented code and circle.
    InvalidInvitationCode,

    /// The circle is limited and at capacity.
    CircleFull { circle_id: CircleId, limit: u32 },

    /// The invitation was already marked used. Defensive: unreachable under
    /// transaction isolation, handled anyway.
    AlreadyRedeemed,

    /// An invitation existed whose issuer had no remaining quota.
    QuotaInconsistency {
        issuer: MembershipId,
        used_invitation_count: u32,
    },

    /// Code generation kept colliding past the retry bound.
    CodeSpaceExhausted { attempts: u32 },

    /// No circle with the requested slug.
    CircleNotFound { slug: String },

    /// No active membership for the requested user in the circle.
    MemberNotFound { user_id: UserId, circle_id: CircleId },

    /// Caller is not an active member of the circle.
    Forbidden,

    /// Request-level validation failed.
    ValidationFailed { field: String, message: String },

    /// Store-layer failure.
    Infrastructure(String),
}

impl InvitationError {
    pub fn already_member(user_id: UserId, circle_id: CircleId) -> Self {
        InvitationError::AlreadyMember { user_id, circle_id }
    }

    pub fn circle_full(circle_id: CircleId, limit: u32) -> Self {
        InvitationError::CircleFull { circle_id, limit }
    }

    pub fn quota_inconsistency(issuer: MembershipId, used_invitation_count: u32) -> Self {
        InvitationError::QuotaInconsistency {
            issuer,
            used_invitation_count,
        }
    }

    pub fn code_space_exhausted(attempts: u32) -> Self {
        InvitationError::CodeSpaceExhausted { attempts }
    }

    pub fn circle_not_found(slug: impl Into<String>) -> Self {
        InvitationError::CircleNotFound { slug: slug.into() }
    }

    pub fn member_not_found(user_id: UserId, circle_id: CircleId) -> Self {
        InvitationError::MemberNotFound { user_id, circle_id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        InvitationError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        InvitationError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            InvitationError::AlreadyMember { .. } => ErrorCode::AlreadyMember,
            InvitationError::InvalidInvitationCode => ErrorCode::InvalidInvitationCode,
            InvitationError::CircleFull { .. } => ErrorCode::CircleFull,
            InvitationError::AlreadyRedeemed => ErrorCode::AlreadyRedeemed,
            InvitationError::QuotaInconsistency { .. } => ErrorCode::QuotaInconsistency,
            InvitationError::CodeSpaceExhausted { .. } => ErrorCode::CodeSpaceExhausted,
            InvitationError::CircleNotFound { .. } => ErrorCode::CircleNotFound,
            InvitationError::MemberNotFound { .. } => ErrorCode::MemberNotFound,
            InvitationError::Forbidden => ErrorCode::Forbidden,
            InvitationError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            InvitationError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            InvitationError::AlreadyMember { user_id, .. } => {
                format!("User {} is already a member of this circle", user_id)
            }
            InvitationError::InvalidInvitationCode => "Invalid invitation code".to_string(),
            InvitationError::CircleFull { limit, .. } => {
                format!("Circle has reached its member limit of {}", limit)
            }
            InvitationError::AlreadyRedeemed => {
                "Invitation has already been redeemed".to_string()
            }
            InvitationError::QuotaInconsistency { issuer, .. } => {
                format!("Issuer membership {} had no remaining invitations", issuer)
            }
            InvitationError::CodeSpaceExhausted { attempts } => {
                format!("Could not generate a unique code after {} attempts", attempts)
            }
            InvitationError::CircleNotFound { slug } => {
                format!("Circle '{}' not found", slug)
            }
            InvitationError::MemberNotFound { user_id, .. } => {
                format!("User {} is not an active member of this circle", user_id)
            }
            InvitationError::Forbidden => {
                "Caller is not an active member of this circle".to_string()
            }
            InvitationError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            InvitationError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Server faults indicate a broken invariant upstream; they are logged
    /// and surfaced as 5xx, never silently corrected.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            InvitationError::QuotaInconsistency { .. }
                | InvitationError::CodeSpaceExhausted { .. }
                | InvitationError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for InvitationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for InvitationError {}

impl From<DomainError> for InvitationError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::AlreadyMember => {
                // Constraint-level detection; identifiers were lost at the
                // store boundary, the message keeps the context.
                InvitationError::Infrastructure(err.to_string())
            }
            ErrorCode::InvalidInvitationCode => InvitationError::InvalidInvitationCode,
            ErrorCode::AlreadyRedeemed => InvitationError::AlreadyRedeemed,
            ErrorCode::CodeSpaceExhausted => InvitationError::CodeSpaceExhausted {
                attempts: crate::domain::invitation::MAX_COLLISION_RETRIES,
            },
            ErrorCode::ValidationFailed => InvitationError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => InvitationError::Infrastructure(err.to_string()),
        }
    }
}
