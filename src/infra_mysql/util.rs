use crate::domain_port::CredentialStoreError;
use sqlx::mysql::MySqlDatabaseError;

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

pub fn store_err(err: sqlx::Error) -> CredentialStoreError {
    CredentialStoreError::Store(err.to_string())
}

pub fn insert_err(err: sqlx::Error) -> CredentialStoreError {
    if is_dup_key(&err) {
        CredentialStoreError::Conflict
    } else {
        store_err(err)
    }
}
