//! services/api/src/adapters/password.rs
//!
//! Argon2id implementation of the `PasswordHasher` port. Each hash carries its
//! own random salt in PHC string format.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Argon2,
};
use ledger_digest_core::ports::{PasswordHasher, PortError, PortResult};

#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {e}")))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> PortResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PortError::Unexpected(format!("Failed to parse password hash: {e}")))?;
        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
