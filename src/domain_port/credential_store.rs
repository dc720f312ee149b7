use super::CredentialHasher;
use crate::domain_model::*;
use anyhow::anyhow;

#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("credential pair not found")]
    NotFound,
    #[error("credential pair was replaced or removed concurrently")]
    Conflict,
    #[error("infra error: {0}")]
    Store(String),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Durable home of live credential pairs, one record per pair.
///
/// Implementations hash the refresh credential on the write path
/// (`insert` / `replace`); plaintext never reaches the backing store.
/// Each mutation is its own transaction.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `Conflict` if the access credential is already live.
    async fn insert(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError>;

    async fn find_by_access_credential(
        &self,
        access: &AccessCredential,
    ) -> Result<StoredRecord, CredentialStoreError>;

    /// Every live record, in no particular order.
    async fn list_all(&self) -> Result<Vec<StoredRecord>, CredentialStoreError>;

    /// Swap the record keyed by `old_access` for one derived from `new_pair`.
    ///
    /// Readers see either the old record or the new one. If the old record is
    /// no longer live the call fails with `Conflict` and writes nothing; any
    /// other failure leaves the old record in place.
    async fn replace(
        &self,
        old_access: &AccessCredential,
        new_pair: &CredentialPair,
    ) -> Result<(), CredentialStoreError>;

    /// Remove the record with exactly this identity. Returns `false` when no
    /// such record is live, for instance because it was rotated meanwhile.
    async fn delete(&self, record: &StoredRecord) -> Result<bool, CredentialStoreError>;

    async fn delete_all_for_user(&self, user: &UserGuid) -> Result<u64, CredentialStoreError>;
}

/// Build the persisted form of `pair`, hashing its refresh credential.
pub async fn seal_record(
    hasher: &dyn CredentialHasher,
    pair: &CredentialPair,
) -> Result<StoredRecord, CredentialStoreError> {
    let user = pair
        .user
        .clone()
        .ok_or_else(|| anyhow!("credential pair has no owner"))?;
    let refresh_credential_hash = hasher.hash(&pair.refresh_credential.0).await?;

    Ok(StoredRecord {
        user,
        access_credential: pair.access_credential.clone(),
        refresh_credential_hash,
    })
}
