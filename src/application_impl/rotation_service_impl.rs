use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Upper bound on every individual store call.
    pub operation_timeout: Duration,
    /// Check signatures and the refresh/access binding before touching the store.
    pub verify_on_refresh: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        RotationConfig {
            operation_timeout: Duration::from_secs(5),
            verify_on_refresh: false,
        }
    }
}

pub struct RealRotationService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn CredentialHasher>,
    token_factory: Arc<dyn TokenFactory>,
    cfg: RotationConfig,
}

impl RealRotationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn CredentialHasher>,
        token_factory: Arc<dyn TokenFactory>,
        cfg: RotationConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            token_factory,
            cfg,
        }
    }

    async fn within<T, F>(&self, op: &'static str, fut: F) -> Result<T, RotationError>
    where
        F: Future<Output = Result<T, CredentialStoreError>>,
    {
        match tokio::time::timeout(self.cfg.operation_timeout, fut).await {
            Ok(result) => result.map_err(RotationError::from),
            Err(_) => {
                warn!(op, timeout = ?self.cfg.operation_timeout, "store call exceeded deadline");
                Err(RotationError::Store(format!(
                    "{} timed out after {:?}",
                    op, self.cfg.operation_timeout
                )))
            }
        }
    }

    fn validate_guid(user: &str) -> Result<UserGuid, RotationError> {
        if user.is_empty() {
            return Err(RotationError::Validation("GUID can't be empty".to_string()));
        }
        if !UserGuid::is_well_formed(user) {
            return Err(RotationError::Validation(
                "GUID should be like a0e9b0af-206a-4cc9-92e2-0dc3e8676059".to_string(),
            ));
        }
        Ok(UserGuid::from(user))
    }
}

#[async_trait::async_trait]
impl RotationService for RealRotationService {
    async fn create_pair(&self, user: &str) -> Result<CredentialPair, RotationError> {
        let user = Self::validate_guid(user)?;

        let pair = self.token_factory.create_pair(&user)?;
        self.within("insert", self.store.insert(&pair)).await?;

        info!(%user, "credential pair issued");
        Ok(pair)
    }

    async fn refresh(&self, presented: &CredentialPair) -> Result<CredentialPair, RotationError> {
        if self.cfg.verify_on_refresh {
            self.token_factory
                .check_binding(presented)
                .inspect_err(|_| warn!("refresh rejected: signature or binding check failed"))?;
        }

        let record = self
            .within(
                "find_by_access_credential",
                self.store
                    .find_by_access_credential(&presented.access_credential),
            )
            .await
            .inspect_err(|e| debug!(error = %e, "refresh lookup failed"))?;

        let matches = self
            .hasher
            .verify(&presented.refresh_credential.0, &record.refresh_credential_hash)
            .await
            .map_err(|e| RotationError::InternalError(e.to_string()))?;
        if !matches {
            warn!(user = %record.user, "refresh rejected: refresh credential mismatch");
            return Err(RotationError::Unauthorized);
        }

        // The stored owner is authoritative; the presented pair carries none.
        let new_pair = self.token_factory.create_pair(&record.user)?;

        match self
            .within(
                "replace",
                self.store.replace(&record.access_credential, &new_pair),
            )
            .await
        {
            Ok(()) => {
                info!(user = %record.user, "credential pair rotated");
                Ok(new_pair)
            }
            Err(RotationError::Conflict) => {
                warn!(user = %record.user, "refresh lost a race against a concurrent rotation");
                Err(RotationError::Conflict)
            }
            Err(e) => Err(e),
        }
    }

    async fn remove_by_refresh_credential(&self, refresh: &str) -> Result<bool, RotationError> {
        if refresh.is_empty() {
            return Err(RotationError::Validation(
                "refresh token can't be empty".to_string(),
            ));
        }

        let records = self.within("list_all", self.store.list_all()).await?;
        debug!(candidates = records.len(), "scanning for refresh credential");

        for record in records {
            match self
                .hasher
                .verify(refresh, &record.refresh_credential_hash)
                .await
            {
                Ok(true) => {
                    let removed = self.within("delete", self.store.delete(&record)).await?;
                    if removed {
                        info!(user = %record.user, "credential pair revoked");
                    } else {
                        warn!(user = %record.user, "matched pair was rotated before it could be revoked");
                    }
                    return Ok(removed);
                }
                Ok(false) => continue,
                Err(e) => {
                    warn!(user = %record.user, error = %e, "revoke scan hit an unreadable hash");
                    return Err(RotationError::InternalError(e.to_string()));
                }
            }
        }

        debug!("no live credential pair matched the refresh credential");
        Ok(false)
    }

    async fn remove_all_for_user(&self, user: &str) -> Result<u64, RotationError> {
        if user.is_empty() {
            return Err(RotationError::Validation("GUID can't be empty".to_string()));
        }
        let user = UserGuid::from(user);

        let count = self
            .within("delete_all_for_user", self.store.delete_all_for_user(&user))
            .await?;

        info!(%user, count, "credential pairs revoked for user");
        Ok(count)
    }
}
