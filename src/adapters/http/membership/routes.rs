//! Axum router configuration for circle membership endpoints.
//!
//! This module defines the route structure for the members API and wires
//! it to the corresponding handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    deactivate_member, get_member, invitation_breakdown, list_members, redeem_invitation,
    CirclesAppState,
};

/// Create the members API router, nested under a circle slug.
///
/// # Routes
///
/// - `POST   /` - Join the circle by redeeming an invitation code
/// - `GET    /` - List the circle's active members
/// - `GET    /:username` - Fetch one active member
/// - `GET    /:username/invitations` - Member's invitation breakdown
/// - `DELETE /:username` - Deactivate a membership
pub fn members_routes() -> Router<CirclesAppState> {
    Router::new()
        .route("/", post(redeem_invitation).get(list_members))
        .route("/:username", get(get_member).delete(deactivate_member))
        .route("/:username/invitations", get(invitation_breakdown))
}

/// Create the complete circles module router.
///
/// Mounts the members routes under `/circles/:slug/members`, suitable for
/// merging into the application router.
pub fn circles_router() -> Router<CirclesAppState> {
    Router::new().nest("/circles/:slug/members", members_routes())
}
