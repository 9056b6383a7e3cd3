//! PostgreSQL implementation of InvitationStore.
//!
//! Code uniqueness is enforced by the `invitations_code_key` constraint,
//! not by checking first: `create` inserts optimistically and re-rolls the
//! code on a unique violation. Check-then-act would race between the check
//! and the insert.

use async_trait::async_trait;
use rand::rngs::StdRng;
use sqlx::PgPool;
use std::sync::Mutex;

use super::queries;
use crate::domain::foundation::{
    CircleId, DomainError, ErrorCode, InvitationId, MembershipId, Timestamp, UserId,
};
use crate::domain::invitation::{
    CodeGenerator, Invitation, InvitationCode, MAX_COLLISION_RETRIES,
};
use crate::ports::InvitationStore;

/// PostgreSQL implementation of the InvitationStore port.
pub struct PostgresInvitationStore {
    pool: PgPool,
    generator: Mutex<CodeGenerator<StdRng>>,
}

impl PostgresInvitationStore {
    /// Store with an entropy-seeded code generator.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            generator: Mutex::new(CodeGenerator::from_entropy()),
        }
    }

    fn next_code(&self) -> Result<InvitationCode, DomainError> {
        // The std mutex is never held across an await.
        let mut generator = self.generator.lock().map_err(|_| {
            DomainError::new(ErrorCode::InternalError, "Code generator lock poisoned")
        })?;
        Ok(generator.generate())
    }
}

fn is_code_collision(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("invitations_code_key")
    )
}

#[async_trait]
impl InvitationStore for PostgresInvitationStore {
    async fn create(
        &self,
        circle_id: &CircleId,
        issued_by: &MembershipId,
    ) -> Result<Invitation, DomainError> {
        for _ in 0..MAX_COLLISION_RETRIES {
            let invitation = Invitation::issue(
                self.next_code()?,
                *circle_id,
                *issued_by,
                Timestamp::now(),
            );

            let result = sqlx::query(
                r#"
                INSERT INTO invitations (id, code, circle_id, issued_by, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(invitation.id.as_uuid())
            .bind(invitation.code.as_str())
            .bind(invitation.circle_id.as_uuid())
            .bind(invitation.issued_by.as_uuid())
            .bind(invitation.created_at.as_datetime())
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => return Ok(invitation),
                Err(e) if is_code_collision(&e) => continue,
                Err(e) => {
                    return Err(DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to create invitation: {}", e),
                    ))
                }
            }
        }

        Err(DomainError::new(
            ErrorCode::CodeSpaceExhausted,
            format!(
                "Could not generate a unique code after {} attempts",
                MAX_COLLISION_RETRIES
            ),
        ))
    }

    async fn find_valid(
        &self,
        code: &InvitationCode,
        circle_id: &CircleId,
    ) -> Result<Option<Invitation>, DomainError> {
        queries::fetch_valid_invitation(&self.pool, code, circle_id, false).await
    }

    async fn mark_used(
        &self,
        id: &InvitationId,
        used_by: &UserId,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        queries::mark_invitation_used(&self.pool, id, used_by, at).await
    }

    async fn list_unused_by_issuer(
        &self,
        issued_by: &MembershipId,
        circle_id: &CircleId,
    ) -> Result<Vec<InvitationCode>, DomainError> {
        let codes: Vec<(String,)> = sqlx::query_as(
            "SELECT code FROM invitations \
             WHERE issued_by = $1 AND circle_id = $2 AND used_by IS NULL \
             ORDER BY created_at ASC",
        )
        .bind(issued_by.as_uuid())
        .bind(circle_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list unused invitations: {}", e),
            )
        })?;

        codes
            .into_iter()
            .map(|(code,)| {
                InvitationCode::parse(code).map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid code: {}", e))
                })
            })
            .collect()
    }
}
