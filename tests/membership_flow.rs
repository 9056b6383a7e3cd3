//! End-to-end membership flows over the in-memory adapter.
//!
//! These tests drive the application handlers the way the HTTP layer does,
//! with the memory store standing in for Postgres.

use std::sync::Arc;

use circles::adapters::memory::MemoryStore;
use circles::application::handlers::membership::{
    DeactivateMembershipCommand, DeactivateMembershipHandler, InvitationBreakdownHandler,
    InvitationBreakdownQuery, ListMembersHandler, ListMembersQuery, RedeemInvitationCommand,
    RedeemInvitationHandler,
};
use circles::domain::circle::{Circle, Slug};
use circles::domain::foundation::{CircleId, Timestamp, UserId};
use circles::domain::invitation::InvitationCode;
use circles::domain::membership::{InvitationError, Membership};
use circles::ports::{InvitationStore, MembershipStore};

fn circle(slug: &str, limit: Option<u32>) -> Circle {
    Circle {
        id: CircleId::new(),
        slug: Slug::new(slug).unwrap(),
        is_limited: limit.is_some(),
        members_limit: limit.unwrap_or(0),
    }
}

fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

/// Seeds a circle with a founding member and returns the founder.
fn seed(store: &MemoryStore, circle: &Circle, founder_quota: u32) -> Membership {
    let founder = Membership::founder(user("founder"), circle.id, founder_quota, Timestamp::now());
    store.insert_circle(circle.clone());
    store.insert_membership(founder.clone());
    founder
}

fn redeem_handler(store: &Arc<MemoryStore>) -> RedeemInvitationHandler {
    RedeemInvitationHandler::new(store.clone(), store.clone())
}

fn breakdown_handler(store: &Arc<MemoryStore>) -> InvitationBreakdownHandler {
    InvitationBreakdownHandler::new(store.clone(), store.clone())
}

#[tokio::test]
async fn breakdown_then_redeem_then_capacity_refusal() {
    // Limited circle with room for two: the founder plus one newcomer.
    let store = Arc::new(MemoryStore::seeded(100, 10));
    let c = circle("weekend-riders", Some(2));
    seed(&store, &c, 3);

    // The founder's first breakdown mints their full quota of codes.
    let breakdown = breakdown_handler(&store)
        .handle(InvitationBreakdownQuery {
            circle: c.clone(),
            member: user("founder"),
        })
        .await
        .unwrap();
    assert_eq!(breakdown.available_codes.len(), 3);
    assert!(breakdown.used_invitations.is_empty());

    // First redemption fills the last slot.
    let first_code = breakdown.available_codes[0].clone();
    let membership = redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("alice"),
            invitation_code: first_code.to_string(),
        })
        .await
        .unwrap();
    assert!(membership.is_active());

    // The circle is now full; a fresh code does not help.
    let second_code = breakdown.available_codes[1].clone();
    let err = redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("bob"),
            invitation_code: second_code.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::CircleFull { limit: 2, .. }));
}

#[tokio::test]
async fn redeem_commits_membership_invitation_and_quota_together() {
    let store = Arc::new(MemoryStore::seeded(101, 10));
    let c = circle("book-club", None);
    let founder = seed(&store, &c, 5);

    let invitation = InvitationStore::create(&*store, &c.id, &founder.id)
        .await
        .unwrap();

    let membership = redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("alice"),
            invitation_code: invitation.code.to_string(),
        })
        .await
        .unwrap();

    // New member: active, sponsored by the founder, default quota.
    assert_eq!(membership.invited_by, Some(founder.id));
    assert_eq!(membership.remaining_invitations, 10);
    assert!(!membership.is_admin);

    // Invitation: part of the audit trail now.
    let stored = store.invitation_by_code(&invitation.code).unwrap();
    assert_eq!(stored.used_by(), Some(&user("alice")));

    // Issuer: one unit of quota moved to the used counter.
    let issuer = store.membership_of(&user("founder"), &c.id).unwrap();
    assert_eq!(issuer.remaining_invitations, 4);
    assert_eq!(issuer.used_invitation_count, 1);
}

#[tokio::test]
async fn used_and_foreign_codes_read_as_invalid() {
    let store = Arc::new(MemoryStore::seeded(102, 10));
    let c = circle("runners", None);
    let founder = seed(&store, &c, 5);
    let other = circle("swimmers", None);
    store.insert_circle(other.clone());

    let invitation = InvitationStore::create(&*store, &c.id, &founder.id)
        .await
        .unwrap();
    redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("alice"),
            invitation_code: invitation.code.to_string(),
        })
        .await
        .unwrap();

    // Same code again, different candidate.
    let err = redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("bob"),
            invitation_code: invitation.code.to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, InvitationError::InvalidInvitationCode);

    // A code issued for one circle is not redeemable in another.
    let foreign = InvitationStore::create(&*store, &c.id, &founder.id)
        .await
        .unwrap();
    let err = redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: other.clone(),
            candidate: user("bob"),
            invitation_code: foreign.code.to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, InvitationError::InvalidInvitationCode);
}

#[tokio::test]
async fn concurrent_redeems_of_one_code_admit_exactly_one_member() {
    let store = Arc::new(MemoryStore::seeded(103, 10));
    let c = circle("open-circle", None);
    let founder = seed(&store, &c, 5);
    let invitation = InvitationStore::create(&*store, &c.id, &founder.id)
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        let c = c.clone();
        let code = invitation.code.to_string();
        tasks.push(tokio::spawn(async move {
            redeem_handler(&store)
                .handle(RedeemInvitationCommand {
                    circle: c,
                    candidate: user(&format!("racer-{}", i)),
                    invitation_code: code,
                })
                .await
        }));
    }

    let outcomes = futures::future::join_all(tasks).await;
    let mut successes = 0;
    for outcome in outcomes {
        match outcome.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(err, InvitationError::InvalidInvitationCode),
        }
    }
    assert_eq!(successes, 1);

    // Founder plus exactly one winner.
    let members = store.list_active(&c.id).await.unwrap();
    assert_eq!(members.len(), 2);
    let issuer = store.membership_of(&user("founder"), &c.id).unwrap();
    assert_eq!(issuer.used_invitation_count, 1);
}

#[tokio::test]
async fn concurrent_breakdowns_mint_the_quota_exactly_once() {
    let store = Arc::new(MemoryStore::seeded(109, 10));
    let c = circle("photographers", None);
    let founder = seed(&store, &c, 4);

    // One handler shared across requests, as the HTTP layer holds it.
    let handler = Arc::new(breakdown_handler(&store));
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let handler = handler.clone();
        let c = c.clone();
        tasks.push(tokio::spawn(async move {
            handler
                .handle(InvitationBreakdownQuery {
                    circle: c,
                    member: user("founder"),
                })
                .await
        }));
    }

    // Every request observes a fully topped-up pool, never a double-mint.
    for outcome in futures::future::join_all(tasks).await {
        let breakdown = outcome.unwrap().unwrap();
        assert_eq!(breakdown.available_codes.len(), 4);
    }

    let outstanding = store
        .list_unused_by_issuer(&founder.id, &c.id)
        .await
        .unwrap();
    assert_eq!(outstanding.len(), 4);
}

#[tokio::test]
async fn breakdown_is_idempotent_and_never_truncates() {
    let store = Arc::new(MemoryStore::seeded(104, 10));
    let c = circle("hikers", None);
    let founder = seed(&store, &c, 2);

    let handler = breakdown_handler(&store);
    let query = InvitationBreakdownQuery {
        circle: c.clone(),
        member: user("founder"),
    };

    let first = handler.handle(query.clone()).await.unwrap();
    let second = handler.handle(query.clone()).await.unwrap();
    assert_eq!(first.available_codes.len(), 2);
    assert_eq!(second.available_codes.len(), 2);

    // Extra codes beyond the quota survive a breakdown untouched.
    for _ in 0..3 {
        InvitationStore::create(&*store, &c.id, &founder.id)
            .await
            .unwrap();
    }
    let third = handler.handle(query).await.unwrap();
    assert_eq!(third.available_codes.len(), 5);
}

#[tokio::test]
async fn breakdown_reports_sponsored_members_and_tops_up_the_pool() {
    let store = Arc::new(MemoryStore::seeded(105, 10));
    let c = circle("climbers", None);
    seed(&store, &c, 3);

    let handler = breakdown_handler(&store);
    let query = InvitationBreakdownQuery {
        circle: c.clone(),
        member: user("founder"),
    };

    let breakdown = handler.handle(query.clone()).await.unwrap();
    let code = breakdown.available_codes[0].clone();
    redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("alice"),
            invitation_code: code.to_string(),
        })
        .await
        .unwrap();

    // Redemption consumed one code and one unit of quota: quota is now 2,
    // two codes are outstanding, so nothing new is minted.
    let after = handler.handle(query).await.unwrap();
    assert_eq!(after.used_invitations.len(), 1);
    assert_eq!(after.used_invitations[0].user_id, user("alice"));
    assert_eq!(after.available_codes.len(), 2);
}

#[tokio::test]
async fn deactivated_member_stays_out_but_blocks_rejoining() {
    let store = Arc::new(MemoryStore::seeded(106, 10));
    let c = circle("chess-club", None);
    let founder = seed(&store, &c, 5);

    let invitation = InvitationStore::create(&*store, &c.id, &founder.id)
        .await
        .unwrap();
    redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("alice"),
            invitation_code: invitation.code.to_string(),
        })
        .await
        .unwrap();

    DeactivateMembershipHandler::new(store.clone())
        .handle(DeactivateMembershipCommand {
            circle: c.clone(),
            member: user("alice"),
        })
        .await
        .unwrap();

    let members = ListMembersHandler::new(store.clone())
        .handle(ListMembersQuery { circle: c.clone() })
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, user("founder"));

    // The row survives, so a second admission of the same user is refused
    // even with a fresh code.
    let fresh = InvitationStore::create(&*store, &c.id, &founder.id)
        .await
        .unwrap();
    let err = redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("alice"),
            invitation_code: fresh.code.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::AlreadyMember { .. }));
}

#[tokio::test]
async fn malformed_codes_are_rejected_without_touching_state() {
    let store = Arc::new(MemoryStore::seeded(107, 10));
    let c = circle("divers", None);
    seed(&store, &c, 5);

    for bad in ["", "short", "lowercase!!", "WAY-TOO-LONG-FOR-A-CODE"] {
        let err = redeem_handler(&store)
            .handle(RedeemInvitationCommand {
                circle: c.clone(),
                candidate: user("alice"),
                invitation_code: bad.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, InvitationError::InvalidInvitationCode, "code: {bad:?}");
    }

    assert_eq!(store.list_active(&c.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn well_formed_unknown_code_is_invalid() {
    let store = Arc::new(MemoryStore::seeded(108, 10));
    let c = circle("sailors", None);
    seed(&store, &c, 5);

    let unknown = InvitationCode::parse("ABCDEFGH12").unwrap();
    let err = redeem_handler(&store)
        .handle(RedeemInvitationCommand {
            circle: c.clone(),
            candidate: user("alice"),
            invitation_code: unknown.to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, InvitationError::InvalidInvitationCode);
}
