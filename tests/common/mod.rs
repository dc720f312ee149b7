#![allow(dead_code)]

use jsonwebtoken::Algorithm;
use pairauth::application_impl::*;
use pairauth::application_port::*;
use pairauth::domain_port::*;
use pairauth::infra_memory::MemoryCredentialStore;
use std::sync::Arc;
use std::time::Duration;

pub const USER_U: &str = "a0e9b0af-206a-4cc9-92e2-0dc3e8676059";
pub const USER_V: &str = "{5f1d7c2e-9b44-4e0a-8c1f-3a6b2d9e7f10}";

pub struct Harness {
    pub store: Arc<MemoryCredentialStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub service: Arc<dyn RotationService>,
}

pub fn fast_hasher() -> Arc<dyn CredentialHasher> {
    Arc::new(
        Argon2CredentialHasher::try_new(HashingParams {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap(),
    )
}

pub fn token_factory() -> Arc<dyn TokenFactory> {
    Arc::new(
        JwtTokenFactory::try_new(JwtConfig {
            algorithm: Algorithm::HS512,
            signing_key: b"integration-test-key".to_vec(),
        })
        .unwrap(),
    )
}

pub fn harness(verify_on_refresh: bool) -> Harness {
    let hasher = fast_hasher();
    let store = Arc::new(MemoryCredentialStore::new(hasher.clone()));
    let service: Arc<dyn RotationService> = Arc::new(RealRotationService::new(
        store.clone(),
        hasher.clone(),
        token_factory(),
        RotationConfig {
            operation_timeout: Duration::from_secs(5),
            verify_on_refresh,
        },
    ));

    Harness {
        store,
        hasher,
        service,
    }
}

/// Replace the last character with a different one.
pub fn alter_last_char(s: &str) -> String {
    let mut chars: Vec<char> = s.chars().collect();
    let last = chars.last_mut().unwrap();
    *last = if *last == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}

/// Behaviour every `CredentialStore` backend must share.
pub async fn store_contract(store: &dyn CredentialStore, hasher: &dyn CredentialHasher) {
    use pairauth::domain_model::*;

    let factory = token_factory();
    let user = UserGuid(uuid::Uuid::new_v4().to_string());
    let other = UserGuid(uuid::Uuid::new_v4().to_string());

    let pair = factory.create_pair(&user).unwrap();
    store.insert(&pair).await.unwrap();
    assert!(matches!(
        store.insert(&pair).await,
        Err(CredentialStoreError::Conflict)
    ));

    let record = store
        .find_by_access_credential(&pair.access_credential)
        .await
        .unwrap();
    assert_eq!(record.user, user);
    assert_ne!(record.refresh_credential_hash, pair.refresh_credential.0);
    assert!(
        hasher
            .verify(&pair.refresh_credential.0, &record.refresh_credential_hash)
            .await
            .unwrap()
    );

    let listed = store.list_all().await.unwrap();
    assert!(listed.contains(&record));

    let successor = factory.create_pair(&user).unwrap();
    store
        .replace(&pair.access_credential, &successor)
        .await
        .unwrap();
    assert!(matches!(
        store.find_by_access_credential(&pair.access_credential).await,
        Err(CredentialStoreError::NotFound)
    ));
    let again = factory.create_pair(&user).unwrap();
    assert!(matches!(
        store.replace(&pair.access_credential, &again).await,
        Err(CredentialStoreError::Conflict)
    ));

    let successor_record = store
        .find_by_access_credential(&successor.access_credential)
        .await
        .unwrap();
    assert!(!store.delete(&record).await.unwrap());
    assert!(store.delete(&successor_record).await.unwrap());
    assert!(!store.delete(&successor_record).await.unwrap());
    assert!(matches!(
        store
            .find_by_access_credential(&successor.access_credential)
            .await,
        Err(CredentialStoreError::NotFound)
    ));

    for _ in 0..3 {
        store.insert(&factory.create_pair(&user).unwrap()).await.unwrap();
    }
    let spared = factory.create_pair(&other).unwrap();
    store.insert(&spared).await.unwrap();

    assert_eq!(store.delete_all_for_user(&user).await.unwrap(), 3);
    assert_eq!(store.delete_all_for_user(&user).await.unwrap(), 0);
    assert!(
        store
            .find_by_access_credential(&spared.access_credential)
            .await
            .is_ok()
    );
    assert_eq!(store.delete_all_for_user(&other).await.unwrap(), 1);
}
