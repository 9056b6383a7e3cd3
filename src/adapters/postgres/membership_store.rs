//! PostgreSQL implementation of MembershipStore.

use async_trait::async_trait;
use sqlx::PgPool;

use super::queries;
use crate::domain::foundation::{CircleId, DomainError, ErrorCode, MembershipId, UserId};
use crate::domain::membership::Membership;
use crate::ports::MembershipStore;

/// PostgreSQL implementation of the MembershipStore port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    /// Creates a new PostgresMembershipStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn create(&self, membership: &Membership) -> Result<(), DomainError> {
        queries::insert_membership(&self.pool, membership).await
    }

    async fn get(
        &self,
        user_id: &UserId,
        circle_id: &CircleId,
    ) -> Result<Option<Membership>, DomainError> {
        queries::fetch_membership(&self.pool, user_id, circle_id).await
    }

    async fn exists(&self, user_id: &UserId, circle_id: &CircleId) -> Result<bool, DomainError> {
        queries::membership_exists(&self.pool, user_id, circle_id).await
    }

    async fn active_count(&self, circle_id: &CircleId) -> Result<u32, DomainError> {
        queries::active_member_count(&self.pool, circle_id).await
    }

    async fn deactivate(
        &self,
        user_id: &UserId,
        circle_id: &CircleId,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE memberships SET status = 'deactivated' \
             WHERE user_id = $1 AND circle_id = $2 AND status = 'active'",
        )
        .bind(user_id.as_str())
        .bind(circle_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to deactivate membership: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::MemberNotFound,
                "No active membership to deactivate",
            ));
        }

        Ok(())
    }

    async fn list_active(&self, circle_id: &CircleId) -> Result<Vec<Membership>, DomainError> {
        queries::list_active_memberships(&self.pool, circle_id).await
    }

    async fn list_invited_by(
        &self,
        circle_id: &CircleId,
        invited_by: &MembershipId,
    ) -> Result<Vec<Membership>, DomainError> {
        queries::list_memberships_invited_by(&self.pool, circle_id, invited_by).await
    }
}
