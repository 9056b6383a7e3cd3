//! Invitation policy configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Invitation policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InvitationsConfig {
    /// Invitation budget handed to every newly admitted member.
    #[serde(default = "default_remaining_invitations")]
    pub default_remaining_invitations: u32,
}

impl InvitationsConfig {
    /// Validate invitation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_remaining_invitations == 0 {
            return Err(ValidationError::InvalidInvitationQuota);
        }
        Ok(())
    }
}

impl Default for InvitationsConfig {
    fn default() -> Self {
        Self {
            default_remaining_invitations: default_remaining_invitations(),
        }
    }
}

fn default_remaining_invitations() -> u32 {
    10
}
