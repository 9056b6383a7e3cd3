//! InvitationBreakdownHandler - a member's invitation pool and its history.
//!
//! Read-mostly with one possible write: when a member holds fewer unused
//! codes than their remaining quota, the deficit is minted on the spot.
//! When quota was reduced out-of-band and the member holds more codes than
//! quota, nothing is truncated; outstanding codes stay valid until redeemed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::circle::Circle;
use crate::domain::foundation::{MembershipId, UserId};
use crate::domain::invitation::InvitationCode;
use crate::domain::membership::{InvitationError, Membership};
use crate::ports::{InvitationStore, MembershipStore};

/// Query for a member's invitation breakdown.
#[derive(Debug, Clone)]
pub struct InvitationBreakdownQuery {
    pub circle: Circle,
    pub member: UserId,
}

/// The two halves of the breakdown: who used this member's invitations,
/// and which codes are still outstanding.
#[derive(Debug, Clone)]
pub struct InvitationBreakdown {
    pub used_invitations: Vec<Membership>,
    pub available_codes: Vec<InvitationCode>,
}

/// Serializes lazy top-up per issuing membership.
///
/// Two racing breakdown requests for the same member must not both observe
/// the same deficit and double-mint codes. A membership id already scopes
/// one (member, circle) pair, so it is the whole key.
#[derive(Default)]
struct TopUpGate {
    locks: Mutex<HashMap<MembershipId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TopUpGate {
    async fn acquire(&self, member: MembershipId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("TopUpGate lock poisoned");
            // An entry with no outstanding clones has no holder or waiter;
            // sweeping them here keeps the map bounded by in-flight requests.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(member).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Handler computing the breakdown and topping up the code pool.
pub struct InvitationBreakdownHandler {
    memberships: Arc<dyn MembershipStore>,
    invitations: Arc<dyn InvitationStore>,
    topup: TopUpGate,
}

impl InvitationBreakdownHandler {
    pub fn new(
        memberships: Arc<dyn MembershipStore>,
        invitations: Arc<dyn InvitationStore>,
    ) -> Self {
        Self {
            memberships,
            invitations,
            topup: TopUpGate::default(),
        }
    }

    pub async fn handle(
        &self,
        query: InvitationBreakdownQuery,
    ) -> Result<InvitationBreakdown, InvitationError> {
        let member = self
            .memberships
            .get(&query.member, &query.circle.id)
            .await?
            .filter(Membership::is_active)
            .ok_or_else(|| {
                InvitationError::member_not_found(query.member.clone(), query.circle.id)
            })?;

        let used_invitations = self
            .memberships
            .list_invited_by(&query.circle.id, &member.id)
            .await?;

        // The unused-count read and the minting below must not interleave
        // with another request for the same member.
        let _guard = self.topup.acquire(member.id).await;

        let mut available_codes = self
            .invitations
            .list_unused_by_issuer(&member.id, &query.circle.id)
            .await?;

        let deficit = (member.remaining_invitations as i64) - (available_codes.len() as i64);
        if deficit > 0 {
            debug!(
                member = %member.user_id,
                circle = %query.circle.slug,
                deficit,
                "topping up invitation pool"
            );
            for _ in 0..deficit {
                let invitation = self
                    .invitations
                    .create(&query.circle.id, &member.id)
                    .await?;
                available_codes.push(invitation.code);
            }
        }

        Ok(InvitationBreakdown {
            used_invitations,
            available_codes,
        })
    }
}
