use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::users::error::DirectoryError;

/// Salted argon2id hashing with a fixed cost.
///
/// Hashing and verification are CPU-bound; the async variants run them on
/// tokio's blocking pool so request handling is not stalled.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, plain: &str) -> Result<String, DirectoryError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                DirectoryError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Cost parameters are read from `hash` itself, so records hashed under
    /// an older configuration still verify.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, DirectoryError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            DirectoryError::Hashing(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    pub async fn hash_async(&self, plain: &str) -> Result<String, DirectoryError> {
        let hasher = self.clone();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    pub async fn verify_async(&self, plain: &str, hash: String) -> Result<bool, DirectoryError> {
        let hasher = self.clone();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await?
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> CredentialHasher {
    CredentialHasher::new(Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid params"))
}
