use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local store. Nothing survives a restart; meant for development
/// and tests.
pub struct MemoryCredentialStore {
    hasher: Arc<dyn CredentialHasher>,
    records: RwLock<HashMap<AccessCredential, StoredRecord>>,
}

impl MemoryCredentialStore {
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        MemoryCredentialStore {
            hasher,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        // Hash outside the lock; it is the slow part.
        let record = seal_record(self.hasher.as_ref(), pair).await?;

        let mut records = self.records.write().await;
        if records.contains_key(&record.access_credential) {
            return Err(CredentialStoreError::Conflict);
        }
        records.insert(record.access_credential.clone(), record);
        Ok(())
    }

    async fn find_by_access_credential(
        &self,
        access: &AccessCredential,
    ) -> Result<StoredRecord, CredentialStoreError> {
        self.records
            .read()
            .await
            .get(access)
            .cloned()
            .ok_or(CredentialStoreError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>, CredentialStoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn replace(
        &self,
        old_access: &AccessCredential,
        new_pair: &CredentialPair,
    ) -> Result<(), CredentialStoreError> {
        let record = seal_record(self.hasher.as_ref(), new_pair).await?;

        let mut records = self.records.write().await;
        if !records.contains_key(old_access) {
            return Err(CredentialStoreError::Conflict);
        }
        if old_access != &record.access_credential
            && records.contains_key(&record.access_credential)
        {
            return Err(CredentialStoreError::Conflict);
        }
        records.remove(old_access);
        records.insert(record.access_credential.clone(), record);
        Ok(())
    }

    async fn delete(&self, record: &StoredRecord) -> Result<bool, CredentialStoreError> {
        let mut records = self.records.write().await;
        if records.get(&record.access_credential) != Some(record) {
            return Ok(false);
        }
        records.remove(&record.access_credential);
        Ok(true)
    }

    async fn delete_all_for_user(&self, user: &UserGuid) -> Result<u64, CredentialStoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| &record.user != user);
        Ok((before - records.len()) as u64)
    }
}
