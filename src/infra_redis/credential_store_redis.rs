use crate::domain_model::*;
use crate::domain_port::*;
use anyhow::anyhow;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static INSERT: LazyLock<Script> = LazyLock::new(|| Script::new(include_str!("insert.lua")));
static REPLACE: LazyLock<Script> = LazyLock::new(|| Script::new(include_str!("replace.lua")));
static DELETE: LazyLock<Script> = LazyLock::new(|| Script::new(include_str!("delete.lua")));
static DELETE_ALL_FOR_USER: LazyLock<Script> =
    LazyLock::new(|| Script::new(include_str!("delete_all_for_user.lua")));

/// Value stored under each access credential in the pairs hash.
#[derive(Debug, Serialize, Deserialize)]
struct RedisRecord {
    user: String,
    refresh_credential_hash: String,
}

/// Layout:
/// - `{prefix}:pairs` hash, access credential -> JSON [`RedisRecord`]
/// - `{prefix}:user:{guid}` set of the access credentials a user owns
///
/// Every mutation is a single Lua script, so it applies atomically.
pub struct RedisCredentialStore {
    conn: ConnectionManager,
    prefix: String,
    hasher: Arc<dyn CredentialHasher>,
}

impl RedisCredentialStore {
    pub fn new(
        conn: ConnectionManager,
        prefix: impl Into<String>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        RedisCredentialStore {
            conn,
            prefix: prefix.into(),
            hasher,
        }
    }

    pub async fn connect(dsn: &str, connect_timeout: Duration) -> anyhow::Result<ConnectionManager> {
        let client = redis::Client::open(dsn)?;
        let manager = tokio::time::timeout(connect_timeout, client.get_connection_manager())
            .await
            .map_err(|_| anyhow!("redis connection timed out after {:?}", connect_timeout))??;
        Ok(manager)
    }

    fn pairs_key(&self) -> String {
        format!("{}:pairs", self.prefix)
    }

    fn user_prefix(&self) -> String {
        format!("{}:user:", self.prefix)
    }

    fn user_key(&self, user: &UserGuid) -> String {
        format!("{}{}", self.user_prefix(), user)
    }

    fn encode(record: &StoredRecord) -> Result<String, CredentialStoreError> {
        serde_json::to_string(&RedisRecord {
            user: record.user.0.clone(),
            refresh_credential_hash: record.refresh_credential_hash.clone(),
        })
        .map_err(|e| CredentialStoreError::InternalError(anyhow!(e)))
    }

    fn decode(access: String, raw: &str) -> Result<StoredRecord, CredentialStoreError> {
        let record: RedisRecord = serde_json::from_str(raw)
            .map_err(|e| CredentialStoreError::Store(format!("corrupt record: {}", e)))?;
        Ok(StoredRecord {
            user: UserGuid(record.user),
            access_credential: AccessCredential(access),
            refresh_credential_hash: record.refresh_credential_hash,
        })
    }
}

#[async_trait::async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn insert(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        let record = seal_record(self.hasher.as_ref(), pair).await?;
        let encoded = Self::encode(&record)?;

        let mut conn = self.conn.clone();
        let inserted: i64 = INSERT
            .key(self.pairs_key())
            .key(self.user_key(&record.user))
            .arg(&record.access_credential.0)
            .arg(encoded)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        match inserted {
            1 => Ok(()),
            _ => Err(CredentialStoreError::Conflict),
        }
    }

    async fn find_by_access_credential(
        &self,
        access: &AccessCredential,
    ) -> Result<StoredRecord, CredentialStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .hget(self.pairs_key(), &access.0)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        match raw {
            Some(raw) => Self::decode(access.0.clone(), &raw),
            None => Err(CredentialStoreError::NotFound),
        }
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>, CredentialStoreError> {
        let mut conn = self.conn.clone();
        let all: HashMap<String, String> = conn
            .hgetall(self.pairs_key())
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        all.into_iter()
            .map(|(access, raw)| Self::decode(access, &raw))
            .collect()
    }

    async fn replace(
        &self,
        old_access: &AccessCredential,
        new_pair: &CredentialPair,
    ) -> Result<(), CredentialStoreError> {
        let record = seal_record(self.hasher.as_ref(), new_pair).await?;
        let encoded = Self::encode(&record)?;

        let mut conn = self.conn.clone();
        let status: i64 = REPLACE
            .key(self.pairs_key())
            .key(self.user_key(&record.user))
            .arg(self.user_prefix())
            .arg(&old_access.0)
            .arg(&record.access_credential.0)
            .arg(encoded)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        match status {
            1 => Ok(()),
            0 | -1 => Err(CredentialStoreError::Conflict),
            _ => Err(CredentialStoreError::InternalError(anyhow!(
                "unknown replace script status {}",
                status
            ))),
        }
    }

    async fn delete(&self, record: &StoredRecord) -> Result<bool, CredentialStoreError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = DELETE
            .key(self.pairs_key())
            .key(self.user_key(&record.user))
            .arg(&record.access_credential.0)
            .arg(&record.user.0)
            .arg(&record.refresh_credential_hash)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        Ok(deleted == 1)
    }

    async fn delete_all_for_user(&self, user: &UserGuid) -> Result<u64, CredentialStoreError> {
        let mut conn = self.conn.clone();
        let removed: u64 = DELETE_ALL_FOR_USER
            .key(self.pairs_key())
            .key(self.user_key(user))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_encoding_keeps_fields_by_name() {
        let record = StoredRecord {
            user: UserGuid::from("a0e9b0af-206a-4cc9-92e2-0dc3e8676059"),
            access_credential: AccessCredential("access".into()),
            refresh_credential_hash: "$argon2id$v=19$m=64,t=1,p=1$c2FsdA$aGFzaA".into(),
        };

        let encoded = RedisCredentialStore::encode(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["user"], "a0e9b0af-206a-4cc9-92e2-0dc3e8676059");
        assert_eq!(value["refresh_credential_hash"], record.refresh_credential_hash);

        let decoded = RedisCredentialStore::decode("access".into(), &encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn corrupt_records_are_store_errors() {
        assert!(matches!(
            RedisCredentialStore::decode("access".into(), "{not json"),
            Err(CredentialStoreError::Store(_))
        ));
    }
}
