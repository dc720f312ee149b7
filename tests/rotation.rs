mod common;

use common::*;
use pairauth::application_port::*;
use pairauth::domain_model::*;
use pairauth::domain_port::*;

#[tokio::test]
async fn create_then_refresh_yields_a_new_pair() {
    let h = harness(false);

    let pair = h.service.create_pair(USER_U).await.unwrap();
    assert_eq!(pair.user, Some(UserGuid::from(USER_U)));

    let rotated = h.service.refresh(&pair.clone().without_user()).await.unwrap();
    assert_ne!(rotated.access_credential, pair.access_credential);
    assert_ne!(rotated.refresh_credential, pair.refresh_credential);
    assert_eq!(rotated.user, Some(UserGuid::from(USER_U)));
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn malformed_guids_are_rejected() {
    let h = harness(false);

    for bad in ["", "not-a-guid", "xa0e9b0af-206a-4cc9-92e2-0dc3e8676059"] {
        assert!(
            matches!(h.service.create_pair(bad).await, Err(RotationError::Validation(_))),
            "{bad:?} should be rejected"
        );
    }
    assert_eq!(h.store.len().await, 0);

    assert!(h.service.create_pair(USER_U).await.is_ok());
    assert!(h.service.create_pair(USER_V).await.is_ok());
}

#[tokio::test]
async fn refresh_credential_is_stored_only_as_a_hash() {
    let h = harness(false);
    let pair = h.service.create_pair(USER_U).await.unwrap();

    let record = h
        .store
        .find_by_access_credential(&pair.access_credential)
        .await
        .unwrap();
    let plaintext = &pair.refresh_credential.0;

    assert_ne!(&record.refresh_credential_hash, plaintext);
    assert!(record.refresh_credential_hash.starts_with("$argon2id$"));
    assert!(
        h.hasher
            .verify(plaintext, &record.refresh_credential_hash)
            .await
            .unwrap()
    );
    assert!(
        !h.hasher
            .verify(&alter_last_char(plaintext), &record.refresh_credential_hash)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn refresh_with_wrong_refresh_credential_leaves_record_intact() {
    let h = harness(false);
    let pair = h.service.create_pair(USER_U).await.unwrap();
    let before = h
        .store
        .find_by_access_credential(&pair.access_credential)
        .await
        .unwrap();

    let forged = CredentialPair::presented(pair.access_credential.0.clone(), "some-other-string");
    assert!(matches!(
        h.service.refresh(&forged).await,
        Err(RotationError::Unauthorized)
    ));

    let after = h
        .store
        .find_by_access_credential(&pair.access_credential)
        .await
        .unwrap();
    assert_eq!(before, after);

    assert!(h.service.refresh(&pair).await.is_ok());
}

#[tokio::test]
async fn refresh_of_unknown_access_credential_is_not_found() {
    let h = harness(false);
    let presented = CredentialPair::presented("never-issued", "whatever");

    assert!(matches!(
        h.service.refresh(&presented).await,
        Err(RotationError::NotFound)
    ));
}

#[tokio::test]
async fn old_pair_is_unusable_after_rotation() {
    let h = harness(false);
    let pair = h.service.create_pair(USER_U).await.unwrap();

    let rotated = h.service.refresh(&pair).await.unwrap();

    assert!(matches!(
        h.service.refresh(&pair).await,
        Err(RotationError::NotFound)
    ));
    assert!(h.service.refresh(&rotated).await.is_ok());
}

#[tokio::test]
async fn remove_all_for_user_counts_and_spares_other_users() {
    let h = harness(false);
    for _ in 0..3 {
        h.service.create_pair(USER_U).await.unwrap();
    }
    let other = h.service.create_pair(USER_V).await.unwrap();

    assert_eq!(h.service.remove_all_for_user(USER_U).await.unwrap(), 3);
    assert_eq!(h.store.len().await, 1);
    assert!(h.service.refresh(&other).await.is_ok());

    assert_eq!(h.service.remove_all_for_user(USER_U).await.unwrap(), 0);
}

#[tokio::test]
async fn remove_by_refresh_credential_is_idempotent() {
    let h = harness(false);
    let pair = h.service.create_pair(USER_U).await.unwrap();
    let kept = h.service.create_pair(USER_U).await.unwrap();

    let refresh = &pair.refresh_credential.0;
    assert!(h.service.remove_by_refresh_credential(refresh).await.unwrap());
    assert!(!h.service.remove_by_refresh_credential(refresh).await.unwrap());

    assert_eq!(h.store.len().await, 1);
    assert!(matches!(
        h.service.refresh(&pair).await,
        Err(RotationError::NotFound)
    ));
    assert!(h.service.refresh(&kept).await.is_ok());
}

#[tokio::test]
async fn concurrent_refreshes_of_one_pair_yield_one_live_successor() {
    let h = harness(false);
    let pair = h.service.create_pair(USER_U).await.unwrap();

    let (first, second) = tokio::join!(h.service.refresh(&pair), h.service.refresh(&pair));

    let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in [&first, &second] {
        if let Err(e) = result {
            assert!(
                matches!(e, RotationError::Conflict | RotationError::NotFound),
                "unexpected error: {e:?}"
            );
        }
    }
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refreshes_on_a_multi_thread_runtime() {
    let h = harness(false);
    let pair = h.service.create_pair(USER_U).await.unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let service = h.service.clone();
            let pair = pair.clone();
            tokio::spawn(async move { service.refresh(&pair).await })
        })
        .collect();

    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn binding_check_rejects_crossed_pairs_when_enabled() {
    let h = harness(true);
    let a = h.service.create_pair(USER_U).await.unwrap();
    let b = h.service.create_pair(USER_U).await.unwrap();

    let crossed = CredentialPair::presented(a.access_credential.0.clone(), b.refresh_credential.0.clone());
    assert!(matches!(
        h.service.refresh(&crossed).await,
        Err(RotationError::Unauthorized)
    ));

    assert!(h.service.refresh(&a).await.is_ok());
}

#[tokio::test]
async fn binding_check_rejects_unsigned_strings_before_lookup() {
    let h = harness(true);
    let presented = CredentialPair::presented("never-issued", "whatever");

    assert!(matches!(
        h.service.refresh(&presented).await,
        Err(RotationError::Unauthorized)
    ));
}
