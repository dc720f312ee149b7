use super::util::{insert_err, store_err};
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::sync::Arc;
use std::time::Duration;

const CREDENTIAL_PAIR_SCHEMA: &str = include_str!("credential_pair.sql");

pub struct MySqlCredentialStore {
    pool: MySqlPool,
    hasher: Arc<dyn CredentialHasher>,
}

impl MySqlCredentialStore {
    pub fn new(pool: MySqlPool, hasher: Arc<dyn CredentialHasher>) -> Self {
        MySqlCredentialStore { pool, hasher }
    }

    /// Open a pool, giving up if the first connection is not established
    /// within `connect_timeout`.
    pub async fn connect_pool(
        dsn: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> anyhow::Result<MySqlPool> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(dsn)
            .await?;
        Ok(pool)
    }

    pub async fn ensure_schema(&self) -> Result<(), CredentialStoreError> {
        sqlx::query(CREDENTIAL_PAIR_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    fn row_to_record(row: MySqlRow) -> Result<StoredRecord, CredentialStoreError> {
        let user: String = row.try_get("user_guid").map_err(store_err)?;
        let access_credential: String = row.try_get("access_credential").map_err(store_err)?;
        let hash_bytes: Vec<u8> = row
            .try_get("refresh_credential_hash")
            .map_err(store_err)?;
        let refresh_credential_hash = String::from_utf8(hash_bytes)
            .map_err(|e| CredentialStoreError::Store(format!("corrupt hash column: {}", e)))?;

        Ok(StoredRecord {
            user: UserGuid(user),
            access_credential: AccessCredential(access_credential),
            refresh_credential_hash,
        })
    }
}

#[async_trait::async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn insert(&self, pair: &CredentialPair) -> Result<(), CredentialStoreError> {
        let record = seal_record(self.hasher.as_ref(), pair).await?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;
        sqlx::query(
            r#"
INSERT INTO credential_pair (access_credential, user_guid, refresh_credential_hash)
VALUES (?, ?, ?)
"#,
        )
        .bind(&record.access_credential.0)
        .bind(&record.user.0)
        .bind(record.refresh_credential_hash.as_bytes())
        .execute(&mut *tx)
        .await
        .map_err(insert_err)?;
        tx.commit().await.map_err(store_err)?;

        Ok(())
    }

    async fn find_by_access_credential(
        &self,
        access: &AccessCredential,
    ) -> Result<StoredRecord, CredentialStoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_guid, access_credential, refresh_credential_hash
FROM credential_pair
WHERE access_credential = ?
"#,
        )
        .bind(&access.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt
            .map(Self::row_to_record)
            .transpose()?
            .ok_or(CredentialStoreError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<StoredRecord>, CredentialStoreError> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
SELECT user_guid, access_credential, refresh_credential_hash
FROM credential_pair
"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn replace(
        &self,
        old_access: &AccessCredential,
        new_pair: &CredentialPair,
    ) -> Result<(), CredentialStoreError> {
        let record = seal_record(self.hasher.as_ref(), new_pair).await?;

        // The DELETE takes the row lock; a concurrent replace of the same
        // key waits here and then finds nothing to delete.
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        let deleted = sqlx::query("DELETE FROM credential_pair WHERE access_credential = ?")
            .bind(&old_access.0)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await.map_err(store_err)?;
            return Err(CredentialStoreError::Conflict);
        }

        sqlx::query(
            r#"
INSERT INTO credential_pair (access_credential, user_guid, refresh_credential_hash)
VALUES (?, ?, ?)
"#,
        )
        .bind(&record.access_credential.0)
        .bind(&record.user.0)
        .bind(record.refresh_credential_hash.as_bytes())
        .execute(&mut *tx)
        .await
        .map_err(insert_err)?;
        tx.commit().await.map_err(store_err)?;

        Ok(())
    }

    async fn delete(&self, record: &StoredRecord) -> Result<bool, CredentialStoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        let deleted = sqlx::query(
            r#"
DELETE FROM credential_pair
WHERE access_credential = ? AND user_guid = ? AND refresh_credential_hash = ?
"#,
        )
        .bind(&record.access_credential.0)
        .bind(&record.user.0)
        .bind(record.refresh_credential_hash.as_bytes())
        .execute(&mut *tx)
        .await
        .map_err(store_err)?
        .rows_affected();
        tx.commit().await.map_err(store_err)?;

        Ok(deleted == 1)
    }

    async fn delete_all_for_user(&self, user: &UserGuid) -> Result<u64, CredentialStoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        let deleted = sqlx::query("DELETE FROM credential_pair WHERE user_guid = ?")
            .bind(&user.0)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?
            .rows_affected();
        tx.commit().await.map_err(store_err)?;

        Ok(deleted)
    }
}
