//! Row types and query helpers shared by the Postgres adapters.
//!
//! Helpers are generic over the executor so the pool-backed store methods
//! and the ledger transaction run the exact same SQL.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::domain::circle::{Circle, Slug};
use crate::domain::foundation::{
    CircleId, DomainError, ErrorCode, InvitationId, MembershipId, Timestamp, UserId,
};
use crate::domain::invitation::{Invitation, InvitationCode, Redemption};
use crate::domain::membership::{Membership, MembershipStatus};

/// Database row representation of a circle.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct CircleRow {
    id: Uuid,
    slug: String,
    is_limited: bool,
    members_limit: i32,
}

impl TryFrom<CircleRow> for Circle {
    type Error = DomainError;

    fn try_from(row: CircleRow) -> Result<Self, Self::Error> {
        Ok(Circle {
            id: CircleId::from_uuid(row.id),
            slug: Slug::new(row.slug).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid slug: {}", e))
            })?,
            is_limited: row.is_limited,
            members_limit: non_negative(row.members_limit, "members_limit")?,
        })
    }
}

/// Database row representation of a membership.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct MembershipRow {
    id: Uuid,
    user_id: String,
    circle_id: Uuid,
    is_admin: bool,
    status: String,
    used_invitation_count: i32,
    remaining_invitations: i32,
    invited_by: Option<Uuid>,
    rides_taken: i32,
    rides_offered: i32,
    joined_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            id: MembershipId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            circle_id: CircleId::from_uuid(row.circle_id),
            is_admin: row.is_admin,
            status: parse_status(&row.status)?,
            used_invitation_count: non_negative(row.used_invitation_count, "used_invitation_count")?,
            remaining_invitations: non_negative(row.remaining_invitations, "remaining_invitations")?,
            invited_by: row.invited_by.map(MembershipId::from_uuid),
            rides_taken: non_negative(row.rides_taken, "rides_taken")?,
            rides_offered: non_negative(row.rides_offered, "rides_offered")?,
            joined_at: Timestamp::from_datetime(row.joined_at),
        })
    }
}

/// Database row representation of an invitation.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct InvitationRow {
    id: Uuid,
    code: String,
    circle_id: Uuid,
    issued_by: Uuid,
    used_by: Option<String>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = DomainError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        let redemption = match (row.used_by, row.used_at) {
            (None, None) => Redemption::Unused,
            (Some(by), Some(at)) => Redemption::Used {
                by: UserId::new(by).map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Invalid used_by: {}", e))
                })?,
                at: Timestamp::from_datetime(at),
            },
            _ => {
                return Err(DomainError::new(
                    ErrorCode::DatabaseError,
                    "Invitation row has mismatched used_by/used_at",
                ))
            }
        };

        Ok(Invitation {
            id: InvitationId::from_uuid(row.id),
            code: InvitationCode::parse(row.code).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid code: {}", e))
            })?,
            circle_id: CircleId::from_uuid(row.circle_id),
            issued_by: MembershipId::from_uuid(row.issued_by),
            redemption,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

pub(super) fn parse_status(s: &str) -> Result<MembershipStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "active" => Ok(MembershipStatus::Active),
        "deactivated" => Ok(MembershipStatus::Deactivated),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

pub(super) fn status_to_string(status: &MembershipStatus) -> &'static str {
    match status {
        MembershipStatus::Active => "active",
        MembershipStatus::Deactivated => "deactivated",
    }
}

fn non_negative(value: i32, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Negative value in column {}: {}", column, value),
        )
    })
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

const MEMBERSHIP_COLUMNS: &str = "id, user_id, circle_id, is_admin, status, \
     used_invitation_count, remaining_invitations, invited_by, \
     rides_taken, rides_offered, joined_at";

pub(super) async fn fetch_membership<'e>(
    exec: impl PgExecutor<'e>,
    user_id: &UserId,
    circle_id: &CircleId,
) -> Result<Option<Membership>, DomainError> {
    let row: Option<MembershipRow> = sqlx::query_as(&format!(
        "SELECT {} FROM memberships WHERE user_id = $1 AND circle_id = $2",
        MEMBERSHIP_COLUMNS
    ))
    .bind(user_id.as_str())
    .bind(circle_id.as_uuid())
    .fetch_optional(exec)
    .await
    .map_err(|e| db_error("Failed to fetch membership", e))?;

    row.map(Membership::try_from).transpose()
}

pub(super) async fn membership_exists<'e>(
    exec: impl PgExecutor<'e>,
    user_id: &UserId,
    circle_id: &CircleId,
) -> Result<bool, DomainError> {
    let exists: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM memberships WHERE user_id = $1 AND circle_id = $2")
            .bind(user_id.as_str())
            .bind(circle_id.as_uuid())
            .fetch_optional(exec)
            .await
            .map_err(|e| db_error("Failed to check membership", e))?;

    Ok(exists.is_some())
}

pub(super) async fn active_member_count<'e>(
    exec: impl PgExecutor<'e>,
    circle_id: &CircleId,
) -> Result<u32, DomainError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM memberships WHERE circle_id = $1 AND status = 'active'",
    )
    .bind(circle_id.as_uuid())
    .fetch_one(exec)
    .await
    .map_err(|e| db_error("Failed to count members", e))?;

    Ok(count as u32)
}

/// Inserts a membership row. The `(user_id, circle_id)` unique constraint
/// reports as `AlreadyMember`.
pub(super) async fn insert_membership<'e>(
    exec: impl PgExecutor<'e>,
    membership: &Membership,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO memberships (
            id, user_id, circle_id, is_admin, status,
            used_invitation_count, remaining_invitations, invited_by,
            rides_taken, rides_offered, joined_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(membership.id.as_uuid())
    .bind(membership.user_id.as_str())
    .bind(membership.circle_id.as_uuid())
    .bind(membership.is_admin)
    .bind(status_to_string(&membership.status))
    .bind(membership.used_invitation_count as i32)
    .bind(membership.remaining_invitations as i32)
    .bind(membership.invited_by.as_ref().map(|id| *id.as_uuid()))
    .bind(membership.rides_taken as i32)
    .bind(membership.rides_offered as i32)
    .bind(membership.joined_at.as_datetime())
    .execute(exec)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.constraint() == Some("memberships_user_id_circle_id_key") {
                return DomainError::new(
                    ErrorCode::AlreadyMember,
                    "User already has a membership in this circle",
                );
            }
        }
        db_error("Failed to insert membership", e)
    })?;

    Ok(())
}

pub(super) async fn list_active_memberships<'e>(
    exec: impl PgExecutor<'e>,
    circle_id: &CircleId,
) -> Result<Vec<Membership>, DomainError> {
    let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
        "SELECT {} FROM memberships \
         WHERE circle_id = $1 AND status = 'active' ORDER BY joined_at ASC",
        MEMBERSHIP_COLUMNS
    ))
    .bind(circle_id.as_uuid())
    .fetch_all(exec)
    .await
    .map_err(|e| db_error("Failed to list members", e))?;

    rows.into_iter().map(Membership::try_from).collect()
}

pub(super) async fn list_memberships_invited_by<'e>(
    exec: impl PgExecutor<'e>,
    circle_id: &CircleId,
    invited_by: &MembershipId,
) -> Result<Vec<Membership>, DomainError> {
    let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
        "SELECT {} FROM memberships \
         WHERE circle_id = $1 AND invited_by = $2 AND status = 'active' \
         ORDER BY joined_at ASC",
        MEMBERSHIP_COLUMNS
    ))
    .bind(circle_id.as_uuid())
    .bind(invited_by.as_uuid())
    .fetch_all(exec)
    .await
    .map_err(|e| db_error("Failed to list sponsored members", e))?;

    rows.into_iter().map(Membership::try_from).collect()
}

const INVITATION_COLUMNS: &str =
    "id, code, circle_id, issued_by, used_by, used_at, created_at";

/// Fetches a redeemable invitation. `lock` adds `FOR UPDATE` so the ledger
/// transaction serializes against concurrent redeems of the same code.
pub(super) async fn fetch_valid_invitation<'e>(
    exec: impl PgExecutor<'e>,
    code: &InvitationCode,
    circle_id: &CircleId,
    lock: bool,
) -> Result<Option<Invitation>, DomainError> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let row: Option<InvitationRow> = sqlx::query_as(&format!(
        "SELECT {} FROM invitations \
         WHERE code = $1 AND circle_id = $2 AND used_by IS NULL{}",
        INVITATION_COLUMNS, suffix
    ))
    .bind(code.as_str())
    .bind(circle_id.as_uuid())
    .fetch_optional(exec)
    .await
    .map_err(|e| db_error("Failed to fetch invitation", e))?;

    row.map(Invitation::try_from).transpose()
}

/// Marks an invitation used, guarded so an already-used row is untouched.
pub(super) async fn mark_invitation_used<'e>(
    exec: impl PgExecutor<'e>,
    id: &InvitationId,
    used_by: &UserId,
    at: Timestamp,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        "UPDATE invitations SET used_by = $2, used_at = $3 \
         WHERE id = $1 AND used_by IS NULL",
    )
    .bind(id.as_uuid())
    .bind(used_by.as_str())
    .bind(at.as_datetime())
    .execute(exec)
    .await
    .map_err(|e| db_error("Failed to mark invitation used", e))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::AlreadyRedeemed,
            "Invitation missing or already redeemed",
        ));
    }

    Ok(())
}

pub(super) async fn fetch_membership_by_id<'e>(
    exec: impl PgExecutor<'e>,
    id: &MembershipId,
    lock: bool,
) -> Result<Option<Membership>, DomainError> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let row: Option<MembershipRow> = sqlx::query_as(&format!(
        "SELECT {} FROM memberships WHERE id = $1{}",
        MEMBERSHIP_COLUMNS, suffix
    ))
    .bind(id.as_uuid())
    .fetch_optional(exec)
    .await
    .map_err(|e| db_error("Failed to fetch membership by id", e))?;

    row.map(Membership::try_from).transpose()
}

/// Writes back the sponsorship counters computed by the domain.
pub(super) async fn update_sponsorship_counters<'e>(
    exec: impl PgExecutor<'e>,
    issuer: &Membership,
) -> Result<(), DomainError> {
    sqlx::query(
        "UPDATE memberships \
         SET remaining_invitations = $2, used_invitation_count = $3 \
         WHERE id = $1",
    )
    .bind(issuer.id.as_uuid())
    .bind(issuer.remaining_invitations as i32)
    .bind(issuer.used_invitation_count as i32)
    .execute(exec)
    .await
    .map_err(|e| db_error("Failed to update sponsorship counters", e))?;

    Ok(())
}
