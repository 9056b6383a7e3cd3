//! ListMembersHandler - active members of a circle.

use std::sync::Arc;

use crate::domain::circle::Circle;
use crate::domain::membership::{InvitationError, Membership};
use crate::ports::MembershipStore;

/// Query for the active member roster of a circle.
#[derive(Debug, Clone)]
pub struct ListMembersQuery {
    pub circle: Circle,
}

pub struct ListMembersHandler {
    memberships: Arc<dyn MembershipStore>,
}

impl ListMembersHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    pub async fn handle(&self, query: ListMembersQuery) -> Result<Vec<Membership>, InvitationError> {
        let members = self.memberships.list_active(&query.circle.id).await?;
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::circle::Slug;
    use crate::domain::foundation::{CircleId, DomainError, MembershipId, Timestamp, UserId};
    use async_trait::async_trait;

    struct MockMembershipStore {
        active: Vec<Membership>,
    }

    #[async_trait]
    impl MembershipStore for MockMembershipStore {
        async fn create(&self, _membership: &Membership) -> Result<(), DomainError> {
            Ok(())
        }

        async fn get(
            &self,
            _user_id: &UserId,
            _circle_id: &CircleId,
        ) -> Result<Option<Membership>, DomainError> {
            Ok(None)
        }

        async fn exists(
            &self,
            _user_id: &UserId,
            _circle_id: &CircleId,
        ) -> Result<bool, DomainError> {
            Ok(false)
        }

        async fn active_count(&self, _circle_id: &CircleId) -> Result<u32, DomainError> {
            Ok(self.active.len() as u32)
        }

        async fn deactivate(
            &self,
            _user_id: &UserId,
            _circle_id: &CircleId,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn list_active(&self, _circle_id: &CircleId) -> Result<Vec<Membership>, DomainError> {
            Ok(self.active.clone())
        }

        async fn list_invited_by(
            &self,
            _circle_id: &CircleId,
            _invited_by: &MembershipId,
        ) -> Result<Vec<Membership>, DomainError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn returns_active_members() {
        let circle = Circle {
            id: CircleId::new(),
            slug: Slug::new("test-circle").unwrap(),
            is_limited: false,
            members_limit: 0,
        };
        let founder = Membership::founder(
            UserId::new("founder").unwrap(),
            circle.id,
            10,
            Timestamp::now(),
        );
        let store = Arc::new(MockMembershipStore {
            active: vec![founder.clone()],
        });

        let handler = ListMembersHandler::new(store);
        let members = handler.handle(ListMembersQuery { circle }).await.unwrap();
        assert_eq!(members, vec![founder]);
    }
}
