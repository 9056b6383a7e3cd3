//! GetMemberHandler - single active member lookup by username.

use std::sync::Arc;

use crate::domain::circle::Circle;
use crate::domain::foundation::UserId;
use crate::domain::membership::{InvitationError, Membership};
use crate::ports::MembershipStore;

/// Query for one member of a circle.
#[derive(Debug, Clone)]
pub struct GetMemberQuery {
    pub circle: Circle,
    pub member: UserId,
}

pub struct GetMemberHandler {
    memberships: Arc<dyn MembershipStore>,
}

impl GetMemberHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    pub async fn handle(&self, query: GetMemberQuery) -> Result<Membership, InvitationError> {
        self.memberships
            .get(&query.member, &query.circle.id)
            .await?
            .filter(Membership::is_active)
            .ok_or_else(|| InvitationError::member_not_found(query.member, query.circle.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::circle::Slug;
    use crate::domain::foundation::{CircleId, DomainError, MembershipId, Timestamp};
    use async_trait::async_trait;

    struct MockMembershipStore {
        member: Option<Membership>,
    }

    #[async_trait]
    impl MembershipStore for MockMembershipStore {
        async fn create(&self, _membership: &Membership) -> Result<(), DomainError> {
            Ok(())
        }

        async fn get(
            &self,
            user_id: &UserId,
            _circle_id: &CircleId,
        ) -> Result<Option<Membership>, DomainError> {
            Ok(self.member.clone().filter(|m| &m.user_id == user_id))
        }

        async fn exists(
            &self,
            _user_id: &UserId,
            _circle_id: &CircleId,
        ) -> Result<bool, DomainError> {
            Ok(self.member.is_some())
        }

        async fn active_count(&self, _circle_id: &CircleId) -> Result<u32, DomainError> {
            Ok(0)
        }

        async fn deactivate(
            &self,
            _user_id: &UserId,
            _circle_id: &CircleId,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn list_active(&self, _circle_id: &CircleId) -> Result<Vec<Membership>, DomainError> {
            Ok(vec![])
        }

        async fn list_invited_by(
            &self,
            _circle_id: &CircleId,
            _invited_by: &MembershipId,
        ) -> Result<Vec<Membership>, DomainError> {
            Ok(vec![])
        }
    }

    fn test_circle() -> Circle {
        Circle {
            id: CircleId::new(),
            slug: Slug::new("test-circle").unwrap(),
            is_limited: false,
            members_limit: 0,
        }
    }

    #[tokio::test]
    async fn finds_active_member() {
        let circle = test_circle();
        let member = Membership::founder(
            UserId::new("founder").unwrap(),
            circle.id,
            10,
            Timestamp::now(),
        );
        let store = Arc::new(MockMembershipStore {
            member: Some(member.clone()),
        });

        let handler = GetMemberHandler::new(store);
        let found = handler
            .handle(GetMemberQuery {
                circle,
                member: UserId::new("founder").unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(found, member);
    }

    #[tokio::test]
    async fn deactivated_member_is_not_found() {
        let circle = test_circle();
        let mut member = Membership::founder(
            UserId::new("gone").unwrap(),
            circle.id,
            10,
            Timestamp::now(),
        );
        member.deactivate();
        let store = Arc::new(MockMembershipStore {
            member: Some(member),
        });

        let handler = GetMemberHandler::new(store);
        let err = handler
            .handle(GetMemberQuery {
                circle,
                member: UserId::new("gone").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, InvitationError::MemberNotFound { .. }));
    }
}
