//! Credential key generation.

use rand::Rng;

use super::model::CredentialKind;

/// Random bytes behind a token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Source of fresh credential keys.
#[cfg_attr(test, mockall::automock)]
pub trait KeyGenerator: Send + Sync {
    fn generate(&self, kind: CredentialKind) -> String;
}

/// Keys from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self, kind: CredentialKind) -> String {
        let mut rng = rand::rng();
        match kind {
            CredentialKind::Token => {
                let mut bytes = [0u8; TOKEN_BYTES];
                rng.fill(&mut bytes);
                hex::encode(bytes)
            }
            // Drawn from the six-digit range directly so there is never a leading zero to lose.
            CredentialKind::Code => rng.random_range(100_000..=999_999u32).to_string(),
        }
    }
}
