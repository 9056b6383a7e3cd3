//! HTTP adapter for circle membership endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AuthenticatedUser, CirclesApiError, CirclesAppState};
pub use routes::{circles_router, members_routes};
