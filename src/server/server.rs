use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use jsonwebtoken::Algorithm;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

/// Connection held for the life of the process, released by `shutdown`.
enum StoreHandle {
    MySql(MySqlPool),
    Redis,
    Memory,
}

pub struct Server {
    pub rotation_service: Arc<dyn RotationService>,
    store_handle: StoreHandle,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let credential_hasher: Arc<dyn CredentialHasher> =
            Arc::new(Argon2CredentialHasher::try_new(HashingParams {
                memory_kib: settings.hashing.memory_kib,
                iterations: settings.hashing.iterations,
                parallelism: settings.hashing.parallelism,
            })?);

        let algorithm = settings
            .tokens
            .algorithm
            .parse::<Algorithm>()
            .map_err(|e| anyhow!("unknown signing algorithm {}: {}", settings.tokens.algorithm, e))?;
        let token_factory: Arc<dyn TokenFactory> = Arc::new(JwtTokenFactory::try_new(JwtConfig {
            algorithm,
            signing_key: settings.tokens.signing_key()?,
        })?);

        let connect_timeout = Duration::from_secs(settings.store.connect_timeout_secs);
        let (store, store_handle): (Arc<dyn CredentialStore>, StoreHandle) =
            match settings.store.backend.as_str() {
                "mysql" => {
                    let dsn = settings
                        .store
                        .mysql_dsn
                        .as_deref()
                        .ok_or_else(|| anyhow!("store.mysql_dsn is required for the mysql backend"))?;
                    let pool = MySqlCredentialStore::connect_pool(
                        dsn,
                        settings.store.max_connections,
                        connect_timeout,
                    )
                    .await?;
                    let store = MySqlCredentialStore::new(pool.clone(), credential_hasher.clone());
                    if settings.store.ensure_schema {
                        store.ensure_schema().await?;
                        info!("credential_pair schema ensured");
                    }
                    (Arc::new(store), StoreHandle::MySql(pool))
                }
                "redis" => {
                    let dsn = settings
                        .store
                        .redis_dsn
                        .as_deref()
                        .ok_or_else(|| anyhow!("store.redis_dsn is required for the redis backend"))?;
                    let manager = RedisCredentialStore::connect(dsn, connect_timeout).await?;
                    let store = RedisCredentialStore::new(
                        manager,
                        settings.store.redis_prefix.clone(),
                        credential_hasher.clone(),
                    );
                    (Arc::new(store), StoreHandle::Redis)
                }
                "memory" => {
                    warn!("memory store backend: credential pairs will not survive a restart");
                    let store = MemoryCredentialStore::new(credential_hasher.clone());
                    (Arc::new(store), StoreHandle::Memory)
                }
                other => return Err(anyhow!("Unknown store backend: {}", other)),
            };

        let rotation_service: Arc<dyn RotationService> = Arc::new(RealRotationService::new(
            store,
            credential_hasher,
            token_factory,
            RotationConfig {
                operation_timeout: Duration::from_secs(settings.store.operation_timeout_secs),
                verify_on_refresh: settings.tokens.verify_on_refresh,
            },
        ));

        info!(backend = %settings.store.backend, "server started");

        Ok(Self {
            rotation_service,
            store_handle,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        match &self.store_handle {
            StoreHandle::MySql(pool) => pool.close().await,
            StoreHandle::Redis | StoreHandle::Memory => {}
        }
    }
}
