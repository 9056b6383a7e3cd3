//! PostgreSQL implementation of CircleDirectory.
//!
//! Read-only: circles are owned by another subsystem, this adapter only
//! resolves slugs.

use async_trait::async_trait;
use sqlx::PgPool;

use super::queries::CircleRow;
use crate::domain::circle::{Circle, Slug};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::CircleDirectory;

/// PostgreSQL implementation of the CircleDirectory port.
pub struct PostgresCircleDirectory {
    pool: PgPool,
}

impl PostgresCircleDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CircleDirectory for PostgresCircleDirectory {
    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Circle>, DomainError> {
        let row: Option<CircleRow> = sqlx::query_as(
            "SELECT id, slug, is_limited, members_limit FROM circles WHERE slug = $1",
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find circle: {}", e))
        })?;

        row.map(Circle::try_from).transpose()
    }
}
