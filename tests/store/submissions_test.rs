//! Submission store tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use cupid::store::{NewSubmission, Store, StoreError};

use crate::support::{memory_store, register};

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 14, 12, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn submission(sender: i64, admin_message_id: i64, created_at: DateTime<Utc>) -> NewSubmission {
    NewSubmission {
        sender,
        recipient: "@sam".to_owned(),
        body: format!("valentine {admin_message_id}"),
        created_at,
        admin_message_id,
    }
}

async fn store_with_sender() -> (Store, i64) {
    let store = memory_store().await;
    let user = register(&store, 42, Some("alex")).await;
    (store, user.id)
}

#[tokio::test]
async fn inserted_submission_is_found_by_admin_message() {
    let (store, sender) = store_with_sender().await;
    let stored = store
        .insert_submission(&submission(sender, 1001, at(0)))
        .await
        .expect("insert should succeed");

    let found = store
        .submission_by_admin_message(1001)
        .await
        .expect("lookup should succeed");
    assert_eq!(found, Some(stored));
}

#[tokio::test]
async fn unknown_admin_message_is_none() {
    let (store, _) = store_with_sender().await;
    let found = store
        .submission_by_admin_message(4242)
        .await
        .expect("lookup should succeed");
    assert!(found.is_none());
}

#[tokio::test]
async fn duplicate_admin_message_is_rejected() {
    let (store, sender) = store_with_sender().await;
    store
        .insert_submission(&submission(sender, 1001, at(0)))
        .await
        .expect("insert should succeed");

    let again = store
        .insert_submission(&submission(sender, 1001, at(5)))
        .await;
    assert!(matches!(again, Err(StoreError::DuplicateAdminMessage(1001))));
}

#[tokio::test]
async fn latest_is_most_recent_by_time_not_insert_order() {
    let (store, sender) = store_with_sender().await;
    for (id, minute) in [(1001, 30), (1002, 10), (1003, 20)] {
        store
            .insert_submission(&submission(sender, id, at(minute)))
            .await
            .expect("insert should succeed");
    }

    let latest = store
        .latest_submission(sender)
        .await
        .expect("lookup should succeed")
        .expect("a submission should exist");
    assert_eq!(latest.admin_message_id, 1001);
    assert_eq!(latest.created_at, at(30));
}

#[tokio::test]
async fn latest_breaks_ties_by_insertion() {
    let (store, sender) = store_with_sender().await;
    store
        .insert_submission(&submission(sender, 1001, at(0)))
        .await
        .expect("insert should succeed");
    store
        .insert_submission(&submission(sender, 1002, at(0)))
        .await
        .expect("insert should succeed");

    let latest = store
        .latest_submission(sender)
        .await
        .expect("lookup should succeed")
        .expect("a submission should exist");
    assert_eq!(latest.admin_message_id, 1002);
}

#[tokio::test]
async fn sub_second_timestamps_keep_their_order() {
    let (store, sender) = store_with_sender().await;
    let base = at(0);
    store
        .insert_submission(&submission(sender, 1001, base + Duration::milliseconds(900)))
        .await
        .expect("insert should succeed");
    store
        .insert_submission(&submission(sender, 1002, base + Duration::milliseconds(100)))
        .await
        .expect("insert should succeed");

    let latest = store
        .latest_submission(sender)
        .await
        .expect("lookup should succeed")
        .expect("a submission should exist");
    assert_eq!(latest.admin_message_id, 1001);
}

#[tokio::test]
async fn sender_without_submissions_has_no_latest() {
    let (store, sender) = store_with_sender().await;
    let latest = store
        .latest_submission(sender)
        .await
        .expect("lookup should succeed");
    assert!(latest.is_none());
    assert!(store
        .submissions_of(sender)
        .await
        .expect("lookup should succeed")
        .is_empty());
}

#[tokio::test]
async fn submissions_of_lists_oldest_first() {
    let (store, sender) = store_with_sender().await;
    let other = register(&store, 43, None).await;
    for (who, id, minute) in [(sender, 1001, 20), (other.id, 1002, 15), (sender, 1003, 10)] {
        store
            .insert_submission(&submission(who, id, at(minute)))
            .await
            .expect("insert should succeed");
    }

    let ids: Vec<i64> = store
        .submissions_of(sender)
        .await
        .expect("lookup should succeed")
        .into_iter()
        .map(|s| s.admin_message_id)
        .collect();
    assert_eq!(ids, vec![1003, 1001]);
}

#[tokio::test]
async fn submission_for_unknown_sender_violates_foreign_key() {
    let store = memory_store().await;
    let result = store
        .insert_submission(&submission(999, 1001, at(0)))
        .await;
    assert!(matches!(result, Err(StoreError::Database(_))));
}
