//! Identity registry tests.

use cupid::store::{users, NewUser, StoreError};

use crate::support::{memory_store, register};

#[tokio::test]
async fn registered_user_starts_unblocked() {
    let store = memory_store().await;
    let user = register(&store, 42, Some("alex")).await;

    assert_eq!(user.external_id, 42);
    assert!(!user.blocked);
    assert!(user.blocked_reason.is_empty());

    let loaded = store
        .user_by_external_id(42)
        .await
        .expect("lookup should succeed");
    assert_eq!(loaded, Some(user));
}

#[tokio::test]
async fn user_without_username_round_trips_as_none() {
    let store = memory_store().await;
    let user = register(&store, 7, None).await;

    let loaded = store
        .user_by_id(user.id)
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert_eq!(loaded.user_name, None);
}

#[tokio::test]
async fn second_registration_is_rejected() {
    let store = memory_store().await;
    register(&store, 42, Some("alex")).await;

    let again = store
        .register_user(&NewUser {
            external_id: 42,
            full_name: "Someone Else".to_owned(),
            user_name: None,
            phone: "100".to_owned(),
        })
        .await;
    assert!(matches!(again, Err(StoreError::AlreadyRegistered(42))));

    let loaded = store
        .user_by_external_id(42)
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert_eq!(loaded.full_name, "User 42");
}

#[tokio::test]
async fn unknown_user_is_none() {
    let store = memory_store().await;
    let loaded = store
        .user_by_external_id(999)
        .await
        .expect("lookup should succeed");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn set_blocked_overwrites_reason() {
    let store = memory_store().await;
    let user = register(&store, 5, None).await;

    let mut tx = store.begin().await.expect("transaction should start");
    assert!(users::set_blocked(&mut tx, user.id, "spam")
        .await
        .expect("update should succeed"));
    assert!(users::set_blocked(&mut tx, user.id, "abuse")
        .await
        .expect("update should succeed"));
    tx.commit().await.expect("commit should succeed");

    let loaded = store
        .user_by_id(user.id)
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(loaded.blocked);
    assert_eq!(loaded.blocked_reason, "abuse");
}

#[tokio::test]
async fn set_blocked_on_missing_row_reports_false() {
    let store = memory_store().await;
    let mut tx = store.begin().await.expect("transaction should start");
    let updated = users::set_blocked(&mut tx, 12345, "spam")
        .await
        .expect("update should succeed");
    assert!(!updated);
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let store = memory_store().await;
    let user = register(&store, 5, None).await;

    {
        let mut tx = store.begin().await.expect("transaction should start");
        users::set_blocked(&mut tx, user.id, "spam")
            .await
            .expect("update should succeed");
    }

    let loaded = store
        .user_by_id(user.id)
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(!loaded.blocked);
}
