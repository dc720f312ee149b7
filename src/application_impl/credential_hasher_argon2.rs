use crate::domain_port::CredentialHasher;
use anyhow::anyhow;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// Argon2id work factor. Fixed for the life of the process; verification
/// reads the parameters back out of each stored hash.
#[derive(Debug, Clone, Copy)]
pub struct HashingParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        let params = Params::default();
        HashingParams {
            memory_kib: params.m_cost(),
            iterations: params.t_cost(),
            parallelism: params.p_cost(),
        }
    }
}

pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
}

impl Argon2CredentialHasher {
    pub fn try_new(params: HashingParams) -> anyhow::Result<Self> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|e| anyhow!("invalid argon2 params: {}", e))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2CredentialHasher {
    async fn hash(&self, secret: &str) -> anyhow::Result<String> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow!("hash error: {}", e))
        })
        .await?
    }

    async fn verify(&self, secret: &str, encoded: &str) -> anyhow::Result<bool> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();
        let encoded = encoded.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed =
                PasswordHash::new(&encoded).map_err(|e| anyhow!("invalid PHC hash: {}", e))?;

            match argon2.verify_password(secret.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(anyhow!("verify error: {}", e)),
            }
        })
        .await?
    }
}
