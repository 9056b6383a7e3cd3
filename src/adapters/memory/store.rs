//! In-memory implementation of the circle/membership/invitation ports.
//!
//! Backs unit and integration tests with deterministic, dependency-free
//! storage. The whole state sits behind one mutex, which is also what
//! makes `redeem` atomic here: checks and writes happen under a single
//! lock acquisition, mirroring the serializable transaction the Postgres
//! adapter gets from the database.
//!
//! # Panics
//!
//! Methods panic on poisoned locks. Acceptable for test code; this adapter
//! is not meant for production use.

use async_trait::async_trait;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::circle::{can_admit, Circle, Slug};
use crate::domain::foundation::{
    CircleId, DomainError, ErrorCode, InvitationId, MembershipId, Timestamp, UserId,
};
use crate::domain::invitation::{CodeGenerator, Invitation, InvitationCode};
use crate::domain::membership::{InvitationError, Membership};
use crate::ports::{CircleDirectory, InvitationLedger, InvitationStore, MembershipStore};

#[derive(Default)]
struct State {
    circles: HashMap<CircleId, Circle>,
    memberships: Vec<Membership>,
    invitations: Vec<Invitation>,
}

impl State {
    fn membership_of(&self, user_id: &UserId, circle_id: &CircleId) -> Option<&Membership> {
        self.memberships
            .iter()
            .find(|m| &m.user_id == user_id && &m.circle_id == circle_id)
    }

    fn valid_invitation(&self, code: &InvitationCode, circle_id: &CircleId) -> Option<&Invitation> {
        self.invitations
            .iter()
            .find(|i| &i.code == code && &i.circle_id == circle_id && !i.is_used())
    }

    fn active_count(&self, circle_id: &CircleId) -> u32 {
        self.memberships
            .iter()
            .filter(|m| &m.circle_id == circle_id && m.is_active())
            .count() as u32
    }

    fn code_taken(&self, code: &InvitationCode) -> bool {
        self.invitations.iter().any(|i| &i.code == code)
    }
}

/// In-memory store implementing every port of the crate.
pub struct MemoryStore {
    state: Mutex<State>,
    generator: Mutex<CodeGenerator<StdRng>>,
    /// Quota handed to memberships created through redemption.
    default_quota: u32,
}

impl MemoryStore {
    /// Entropy-seeded store with the given default invitation quota.
    pub fn new(default_quota: u32) -> Self {
        Self {
            state: Mutex::new(State::default()),
            generator: Mutex::new(CodeGenerator::from_entropy()),
            default_quota,
        }
    }

    /// Deterministic store for tests.
    pub fn seeded(seed: u64, default_quota: u32) -> Self {
        Self {
            state: Mutex::new(State::default()),
            generator: Mutex::new(CodeGenerator::seeded(seed)),
            default_quota,
        }
    }

    // === Test Helpers ===

    /// Registers a circle so the directory can resolve it.
    pub fn insert_circle(&self, circle: Circle) {
        self.state
            .lock()
            .expect("MemoryStore state lock poisoned")
            .circles
            .insert(circle.id, circle);
    }

    /// Seeds a membership directly, bypassing the redeem path.
    pub fn insert_membership(&self, membership: Membership) {
        self.state
            .lock()
            .expect("MemoryStore state lock poisoned")
            .memberships
            .push(membership);
    }

    /// Fetches an invitation by code regardless of state (for assertions).
    pub fn invitation_by_code(&self, code: &InvitationCode) -> Option<Invitation> {
        self.state
            .lock()
            .expect("MemoryStore state lock poisoned")
            .invitations
            .iter()
            .find(|i| &i.code == code)
            .cloned()
    }

    /// Fetches a membership by (user, circle) regardless of status.
    pub fn membership_of(&self, user_id: &UserId, circle_id: &CircleId) -> Option<Membership> {
        self.state
            .lock()
            .expect("MemoryStore state lock poisoned")
            .membership_of(user_id, circle_id)
            .cloned()
    }

    fn generate_code(&self, state: &State) -> Result<InvitationCode, DomainError> {
        self.generator
            .lock()
            .expect("MemoryStore generator lock poisoned")
            .generate_unique(|candidate| state.code_taken(candidate))
            .map_err(|e| DomainError::new(ErrorCode::CodeSpaceExhausted, e.message()))
    }
}

#[async_trait]
impl CircleDirectory for MemoryStore {
    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Circle>, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state.circles.values().find(|c| &c.slug == slug).cloned())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn create(&self, membership: &Membership) -> Result<(), DomainError> {
        let mut state = self.state.lock().expect("MemoryStore state lock poisoned");
        if state
            .membership_of(&membership.user_id, &membership.circle_id)
            .is_some()
        {
            return Err(DomainError::new(
                ErrorCode::AlreadyMember,
                "User already has a membership in this circle",
            ));
        }
        state.memberships.push(membership.clone());
        Ok(())
    }

    async fn get(
        &self,
        user_id: &UserId,
        circle_id: &CircleId,
    ) -> Result<Option<Membership>, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state.membership_of(user_id, circle_id).cloned())
    }

    async fn exists(&self, user_id: &UserId, circle_id: &CircleId) -> Result<bool, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state.membership_of(user_id, circle_id).is_some())
    }

    async fn active_count(&self, circle_id: &CircleId) -> Result<u32, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state.active_count(circle_id))
    }

    async fn deactivate(
        &self,
        user_id: &UserId,
        circle_id: &CircleId,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().expect("MemoryStore state lock poisoned");
        let member = state
            .memberships
            .iter_mut()
            .find(|m| &m.user_id == user_id && &m.circle_id == circle_id && m.is_active())
            .ok_or_else(|| {
                DomainError::new(ErrorCode::MemberNotFound, "No active membership to deactivate")
            })?;
        member.deactivate();
        Ok(())
    }

    async fn list_active(&self, circle_id: &CircleId) -> Result<Vec<Membership>, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state
            .memberships
            .iter()
            .filter(|m| &m.circle_id == circle_id && m.is_active())
            .cloned()
            .collect())
    }

    async fn list_invited_by(
        &self,
        circle_id: &CircleId,
        invited_by: &MembershipId,
    ) -> Result<Vec<Membership>, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state
            .memberships
            .iter()
            .filter(|m| {
                &m.circle_id == circle_id && m.invited_by.as_ref() == Some(invited_by) && m.is_active()
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn create(
        &self,
        circle_id: &CircleId,
        issued_by: &MembershipId,
    ) -> Result<Invitation, DomainError> {
        let mut state = self.state.lock().expect("MemoryStore state lock poisoned");
        let code = self.generate_code(&state)?;
        let invitation = Invitation::issue(code, *circle_id, *issued_by, Timestamp::now());
        state.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn find_valid(
        &self,
        code: &InvitationCode,
        circle_id: &CircleId,
    ) -> Result<Option<Invitation>, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state.valid_invitation(code, circle_id).cloned())
    }

    async fn mark_used(
        &self,
        id: &InvitationId,
        used_by: &UserId,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().expect("MemoryStore state lock poisoned");
        let invitation = state
            .invitations
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::InvitationNotFound, "No such invitation"))?;
        invitation.mark_used(used_by.clone(), at).map_err(|_| {
            DomainError::new(ErrorCode::AlreadyRedeemed, "Invitation already redeemed")
        })
    }

    async fn list_unused_by_issuer(
        &self,
        issued_by: &MembershipId,
        circle_id: &CircleId,
    ) -> Result<Vec<InvitationCode>, DomainError> {
        let state = self.state.lock().expect("MemoryStore state lock poisoned");
        Ok(state
            .invitations
            .iter()
            .filter(|i| &i.issued_by == issued_by && &i.circle_id == circle_id && !i.is_used())
            .map(|i| i.code.clone())
            .collect())
    }
}

#[async_trait]
impl InvitationLedger for MemoryStore {
    async fn redeem(
        &self,
        circle: &Circle,
        code: &InvitationCode,
        candidate: &UserId,
    ) -> Result<Membership, InvitationError> {
        // One lock acquisition covers every check and every write, so the
        // whole redemption is all-or-nothing.
        let mut state = self.state.lock().expect("MemoryStore state lock poisoned");

        if state.membership_of(candidate, &circle.id).is_some() {
            return Err(InvitationError::already_member(
                candidate.clone(),
                circle.id,
            ));
        }

        let invitation = state
            .valid_invitation(code, &circle.id)
            .cloned()
            .ok_or(InvitationError::InvalidInvitationCode)?;

        if !can_admit(circle, state.active_count(&circle.id)) {
            return Err(InvitationError::circle_full(circle.id, circle.members_limit));
        }

        // Apply effects on clones first; nothing is committed until every
        // step has succeeded.
        let mut issuer = state
            .memberships
            .iter()
            .find(|m| m.id == invitation.issued_by)
            .cloned()
            .ok_or_else(|| {
                InvitationError::infrastructure("Invitation issuer membership missing")
            })?;
        issuer.record_sponsorship()?;

        let now = Timestamp::now();
        let mut redeemed = invitation.clone();
        redeemed
            .mark_used(candidate.clone(), now)
            .map_err(|_| InvitationError::InvalidInvitationCode)?;

        let membership = Membership::join(
            candidate.clone(),
            circle.id,
            issuer.id,
            self.default_quota,
            now,
        );

        // Commit.
        if let Some(slot) = state.invitations.iter_mut().find(|i| i.id == redeemed.id) {
            *slot = redeemed;
        }
        if let Some(slot) = state.memberships.iter_mut().find(|m| m.id == issuer.id) {
            *slot = issuer;
        }
        state.memberships.push(membership.clone());

        Ok(membership)
    }
}
