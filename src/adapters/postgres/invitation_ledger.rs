//! PostgreSQL implementation of InvitationLedger.
//!
//! The whole redemption runs in one transaction. Two row locks serialize
//! the racy parts:
//!
//! - the circle row, taken before the admission count so two redeems into
//!   an almost-full circle cannot both pass the capacity check;
//! - the invitation row (`FOR UPDATE` on the fetch), so two redeems of the
//!   same code queue up and the loser sees it used.
//!
//! The issuer's membership row is also locked before its counters move.
//! Any error rolls the transaction back; no partial state survives.

use async_trait::async_trait;
use sqlx::PgPool;

use super::queries;
use crate::domain::circle::{can_admit, Circle};
use crate::domain::foundation::{ErrorCode, Timestamp, UserId};
use crate::domain::invitation::InvitationCode;
use crate::domain::membership::{InvitationError, Membership};
use crate::ports::InvitationLedger;

/// PostgreSQL implementation of the InvitationLedger port.
pub struct PostgresInvitationLedger {
    pool: PgPool,
    /// Quota handed to memberships created through redemption.
    default_quota: u32,
}

impl PostgresInvitationLedger {
    pub fn new(pool: PgPool, default_quota: u32) -> Self {
        Self {
            pool,
            default_quota,
        }
    }
}

#[async_trait]
impl InvitationLedger for PostgresInvitationLedger {
    async fn redeem(
        &self,
        circle: &Circle,
        code: &InvitationCode,
        candidate: &UserId,
    ) -> Result<Membership, InvitationError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| InvitationError::infrastructure(format!("Failed to begin: {}", e)))?;

        // Serialize admissions into this circle.
        sqlx::query("SELECT id FROM circles WHERE id = $1 FOR UPDATE")
            .bind(circle.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                InvitationError::infrastructure(format!("Failed to lock circle: {}", e))
            })?;

        if queries::membership_exists(&mut *tx, candidate, &circle.id).await? {
            return Err(InvitationError::already_member(
                candidate.clone(),
                circle.id,
            ));
        }

        let invitation = queries::fetch_valid_invitation(&mut *tx, code, &circle.id, true)
            .await?
            .ok_or(InvitationError::InvalidInvitationCode)?;

        let active = queries::active_member_count(&mut *tx, &circle.id).await?;
        if !can_admit(circle, active) {
            return Err(InvitationError::circle_full(circle.id, circle.members_limit));
        }

        let mut issuer = queries::fetch_membership_by_id(&mut *tx, &invitation.issued_by, true)
            .await?
            .ok_or_else(|| {
                InvitationError::infrastructure("Invitation issuer membership missing")
            })?;
        issuer.record_sponsorship()?;

        let now = Timestamp::now();
        let membership = Membership::join(
            candidate.clone(),
            circle.id,
            issuer.id,
            self.default_quota,
            now,
        );

        queries::insert_membership(&mut *tx, &membership)
            .await
            .map_err(|e| {
                if e.code == ErrorCode::AlreadyMember {
                    InvitationError::already_member(candidate.clone(), circle.id)
                } else {
                    InvitationError::from(e)
                }
            })?;
        queries::mark_invitation_used(&mut *tx, &invitation.id, candidate, now).await?;
        queries::update_sponsorship_counters(&mut *tx, &issuer).await?;

        tx.commit()
            .await
            .map_err(|e| InvitationError::infrastructure(format!("Failed to commit: {}", e)))?;

        Ok(membership)
    }
}
