//! HTTP handlers for circle membership endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers. Every route is scoped to a circle slug; the slug resolves
//! through the directory first and an unknown slug is a 404 before any
//! other check runs.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::membership::{
    DeactivateMembershipCommand, DeactivateMembershipHandler, GetMemberHandler, GetMemberQuery,
    InvitationBreakdownHandler, InvitationBreakdownQuery, ListMembersHandler, ListMembersQuery,
    RedeemInvitationCommand, RedeemInvitationHandler,
};
use crate::domain::circle::{Circle, Slug};
use crate::domain::foundation::UserId;
use crate::domain::membership::InvitationError;
use crate::ports::{CircleDirectory, InvitationLedger, InvitationStore, MembershipStore};

use super::dto::{
    ErrorResponse, InvitationBreakdownResponse, MemberResponse, MembersListResponse,
    RedeemInvitationRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies for efficient sharing across handlers.
#[derive(Clone)]
pub struct CirclesAppState {
    pub circles: Arc<dyn CircleDirectory>,
    pub memberships: Arc<dyn MembershipStore>,
    pub invitations: Arc<dyn InvitationStore>,
    pub ledger: Arc<dyn InvitationLedger>,
    /// Built once: carries the per-member top-up serialization state.
    pub breakdown_handler: Arc<InvitationBreakdownHandler>,
}

impl CirclesAppState {
    pub fn new(
        circles: Arc<dyn CircleDirectory>,
        memberships: Arc<dyn MembershipStore>,
        invitations: Arc<dyn InvitationStore>,
        ledger: Arc<dyn InvitationLedger>,
    ) -> Self {
        let breakdown_handler = Arc::new(InvitationBreakdownHandler::new(
            memberships.clone(),
            invitations.clone(),
        ));
        Self {
            circles,
            memberships,
            invitations,
            ledger,
            breakdown_handler,
        }
    }

    /// Create stateless handlers on demand from the shared state.
    fn redeem_handler(&self) -> RedeemInvitationHandler {
        RedeemInvitationHandler::new(self.ledger.clone(), self.memberships.clone())
    }

    fn list_handler(&self) -> ListMembersHandler {
        ListMembersHandler::new(self.memberships.clone())
    }

    fn get_handler(&self) -> GetMemberHandler {
        GetMemberHandler::new(self.memberships.clone())
    }

    fn deactivate_handler(&self) -> DeactivateMembershipHandler {
        DeactivateMembershipHandler::new(self.memberships.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from request.
///
/// In production, this would be extracted from JWT/session by auth
/// middleware. For now, uses a header-based extraction for
/// development/testing.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // In production, this would validate a JWT from the
            // Authorization header. For development, we accept X-User-Id.
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedUser { user_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Shared Guards
// ════════════════════════════════════════════════════════════════════════════════

/// Resolves a slug to a circle; unknown and malformed slugs are both 404.
async fn resolve_circle(
    state: &CirclesAppState,
    slug: &str,
) -> Result<Circle, CirclesApiError> {
    let parsed =
        Slug::new(slug).map_err(|_| InvitationError::circle_not_found(slug.to_string()))?;
    let circle = state
        .circles
        .find_by_slug(&parsed)
        .await
        .map_err(InvitationError::from)?
        .ok_or_else(|| InvitationError::circle_not_found(slug.to_string()))?;
    Ok(circle)
}

/// Member-scoped reads and deletes require the caller to hold an active
/// membership in the circle.
async fn require_active_member(
    state: &CirclesAppState,
    user: &AuthenticatedUser,
    circle: &Circle,
) -> Result<(), CirclesApiError> {
    let is_member = state
        .memberships
        .get(&user.user_id, &circle.id)
        .await
        .map_err(InvitationError::from)?
        .map(|m| m.is_active())
        .unwrap_or(false);

    if is_member {
        Ok(())
    } else {
        Err(CirclesApiError(InvitationError::Forbidden))
    }
}

fn parse_username(username: &str) -> Result<UserId, CirclesApiError> {
    UserId::new(username)
        .map_err(|e| CirclesApiError(InvitationError::validation("username", e.to_string())))
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /circles/{slug}/members - Join a circle by redeeming an invitation.
pub async fn redeem_invitation(
    State(state): State<CirclesAppState>,
    Path(slug): Path<String>,
    user: AuthenticatedUser,
    Json(request): Json<RedeemInvitationRequest>,
) -> Result<impl IntoResponse, CirclesApiError> {
    let circle = resolve_circle(&state, &slug).await?;

    let handler = state.redeem_handler();
    let cmd = RedeemInvitationCommand {
        circle,
        candidate: user.user_id,
        invitation_code: request.invitation_code,
    };

    let membership = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(membership))))
}

/// GET /circles/{slug}/members - List the circle's active members.
pub async fn list_members(
    State(state): State<CirclesAppState>,
    Path(slug): Path<String>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, CirclesApiError> {
    let circle = resolve_circle(&state, &slug).await?;
    require_active_member(&state, &user, &circle).await?;

    let handler = state.list_handler();
    let members = handler.handle(ListMembersQuery { circle }).await?;

    let response = MembersListResponse {
        members: members.into_iter().map(MemberResponse::from).collect(),
    };
    Ok(Json(response))
}

/// GET /circles/{slug}/members/{username} - Fetch one active member.
pub async fn get_member(
    State(state): State<CirclesAppState>,
    Path((slug, username)): Path<(String, String)>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, CirclesApiError> {
    let circle = resolve_circle(&state, &slug).await?;
    require_active_member(&state, &user, &circle).await?;

    let handler = state.get_handler();
    let member = handler
        .handle(GetMemberQuery {
            circle,
            member: parse_username(&username)?,
        })
        .await?;

    Ok(Json(MemberResponse::from(member)))
}

/// GET /circles/{slug}/members/{username}/invitations - Invitation breakdown.
pub async fn invitation_breakdown(
    State(state): State<CirclesAppState>,
    Path((slug, username)): Path<(String, String)>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, CirclesApiError> {
    let circle = resolve_circle(&state, &slug).await?;
    require_active_member(&state, &user, &circle).await?;

    let breakdown = state
        .breakdown_handler
        .handle(InvitationBreakdownQuery {
            circle,
            member: parse_username(&username)?,
        })
        .await?;

    Ok(Json(InvitationBreakdownResponse::from(breakdown)))
}

/// DELETE /circles/{slug}/members/{username} - Deactivate a membership.
pub async fn deactivate_member(
    State(state): State<CirclesAppState>,
    Path((slug, username)): Path<(String, String)>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, CirclesApiError> {
    let circle = resolve_circle(&state, &slug).await?;
    require_active_member(&state, &user, &circle).await?;

    let handler = state.deactivate_handler();
    handler
        .handle(DeactivateMembershipCommand {
            circle,
            member: parse_username(&username)?,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct CirclesApiError(InvitationError);

impl From<InvitationError> for CirclesApiError {
    fn from(err: InvitationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CirclesApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            InvitationError::AlreadyMember { .. } | InvitationError::AlreadyRedeemed => {
                StatusCode::CONFLICT
            }
            InvitationError::InvalidInvitationCode
            | InvitationError::CircleFull { .. }
            | InvitationError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            InvitationError::CircleNotFound { .. } | InvitationError::MemberNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            InvitationError::Forbidden => StatusCode::FORBIDDEN,
            InvitationError::QuotaInconsistency { .. }
            | InvitationError::CodeSpaceExhausted { .. }
            | InvitationError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.0.is_server_fault() {
            tracing::error!(error = %self.0, code = %self.0.code(), "server fault");
        } else if matches!(self.0, InvitationError::AlreadyRedeemed) {
            // Row locking in the ledger should make this unreachable.
            tracing::warn!(error = %self.0, "already-redeemed surfaced to a caller");
        }

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CircleId;

    fn status_of(err: InvitationError) -> StatusCode {
        CirclesApiError(err).into_response().status()
    }

    #[test]
    fn client_faults_map_to_4xx() {
        assert_eq!(
            status_of(InvitationError::already_member(
                UserId::new("u").unwrap(),
                CircleId::new(),
            )),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(InvitationError::InvalidInvitationCode),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(InvitationError::circle_full(CircleId::new(), 5)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(InvitationError::circle_not_found("nope")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(InvitationError::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn broken_invariants_map_to_500() {
        assert_eq!(
            status_of(InvitationError::quota_inconsistency(
                crate::domain::foundation::MembershipId::new(),
                3,
            )),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(InvitationError::code_space_exhausted(100)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(InvitationError::infrastructure("db down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
