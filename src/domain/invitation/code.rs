//! Invitation code value object and generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;
use crate::domain::membership::InvitationError;

/// Fixed length of every invitation code.
pub const CODE_LENGTH: usize = 10;

/// Alphabet invitation codes are drawn from: A-Z, 0-9, '.' and '-'.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789.-";

/// Upper bound on consecutive collisions before generation gives up.
///
/// The key space is 38^10, so hitting this bound means something other
/// than bad luck is wrong (e.g. the existence check is stuck on true).
pub const MAX_COLLISION_RETRIES: u32 = 100;

/// A single-use invitation code, unique across the whole system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct InvitationCode(String);

impl InvitationCode {
    /// Parses a code, enforcing length and alphabet.
    pub fn parse(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.len() != CODE_LENGTH {
            return Err(ValidationError::invalid_format(
                "invitation_code",
                format!("expected {} characters, got {}", CODE_LENGTH, code.len()),
            ));
        }
        if !code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            return Err(ValidationError::invalid_format(
                "invitation_code",
                "characters outside A-Z, 0-9, '.', '-'",
            ));
        }
        Ok(Self(code))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InvitationCode {
    type Error = ValidationError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::parse(code)
    }
}

impl fmt::Display for InvitationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Produces unpredictable invitation codes from an injected random source.
///
/// The source is explicit so tests can seed it; production wiring uses
/// [`CodeGenerator::from_entropy`].
pub struct CodeGenerator<R: Rng> {
    rng: R,
}

impl CodeGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> CodeGenerator<R> {
    /// Wraps an arbitrary random source.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draws one code. Collision handling is the caller's concern.
    pub fn generate(&mut self) -> InvitationCode {
        let code: String = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[self.rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        InvitationCode(code)
    }

    /// Draws codes until `exists` reports false for the candidate.
    ///
    /// Pure with respect to the provided existence check; no side effects.
    /// Fails with `CodeSpaceExhausted` after [`MAX_COLLISION_RETRIES`]
    /// consecutive collisions.
    pub fn generate_unique(
        &mut self,
        mut exists: impl FnMut(&InvitationCode) -> bool,
    ) -> Result<InvitationCode, InvitationError> {
        for _ in 0..MAX_COLLISION_RETRIES {
            let candidate = self.generate();
            if !exists(&candidate) {
                return Ok(candidate);
            }
        }
        Err(InvitationError::code_space_exhausted(MAX_COLLISION_RETRIES))
    }
}
