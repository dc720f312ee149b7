use crate::domain_model::*;
use crate::domain_port::CredentialStoreError;

#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("credential pair not found")]
    NotFound,
    #[error("refresh credential rejected")]
    Unauthorized,
    #[error("credential pair was already rotated")]
    Conflict,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<CredentialStoreError> for RotationError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::NotFound => RotationError::NotFound,
            CredentialStoreError::Conflict => RotationError::Conflict,
            CredentialStoreError::Store(e) => RotationError::Store(e),
            CredentialStoreError::InternalError(e) => RotationError::InternalError(e.to_string()),
        }
    }
}

/// Mints signed credential pairs. Pure: no I/O, no shared state.
pub trait TokenFactory: Send + Sync {
    fn create_pair(&self, user: &UserGuid) -> Result<CredentialPair, RotationError>;

    /// Verify both signatures and that the refresh credential was minted
    /// alongside the presented access credential.
    fn check_binding(&self, pair: &CredentialPair) -> Result<(), RotationError>;
}

#[async_trait::async_trait]
pub trait RotationService: Send + Sync {
    async fn create_pair(&self, user: &str) -> Result<CredentialPair, RotationError>;

    /// Exchange a live pair for a fresh one, retiring the old record.
    async fn refresh(&self, presented: &CredentialPair) -> Result<CredentialPair, RotationError>;

    /// Returns `false` when no live record matches; that is not an error.
    async fn remove_by_refresh_credential(&self, refresh: &str) -> Result<bool, RotationError>;

    async fn remove_all_for_user(&self, user: &str) -> Result<u64, RotationError>;
}
