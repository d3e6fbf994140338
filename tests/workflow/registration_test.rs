//! Contact-share registration.

use cupid::workflow::{Keyboard, SharedContact};

use crate::support::{profile, Harness};

#[tokio::test]
async fn own_contact_registers_user() {
    let h = Harness::new().await;
    let alex = profile(42, Some("alex"));

    let reply = h.share_own_contact(&alex).await;
    assert!(reply.text.contains("Thanks for confirming"));
    assert_eq!(reply.keyboard, Keyboard::Remove);

    let user = h
        .store
        .user_by_external_id(42)
        .await
        .expect("lookup should succeed")
        .expect("user should be registered");
    assert_eq!(user.full_name, "Alex Doe");
    assert_eq!(user.user_name.as_deref(), Some("alex"));
    assert_eq!(user.phone, "+15550100");
    assert!(!user.blocked);
}

#[tokio::test]
async fn second_share_reports_already_registered() {
    let h = Harness::new().await;
    let alex = profile(42, None);
    h.share_own_contact(&alex).await;

    let reply = h.share_own_contact(&alex).await;
    assert!(reply.text.contains("already confirmed"));
}

#[tokio::test]
async fn foreign_contact_is_refused() {
    let h = Harness::new().await;
    let alex = profile(42, None);
    let contact = SharedContact {
        user_id: Some(43),
        first_name: "Sam".to_owned(),
        last_name: None,
        phone: "+15550199".to_owned(),
    };

    let reply = h.workflow.handle_contact(&alex, &contact).await;
    assert_eq!(reply.keyboard, Keyboard::RequestContact);
    assert!(h
        .store
        .user_by_external_id(42)
        .await
        .expect("lookup should succeed")
        .is_none());
    assert!(h
        .store
        .user_by_external_id(43)
        .await
        .expect("lookup should succeed")
        .is_none());
}

#[tokio::test]
async fn contact_without_telegram_account_is_refused() {
    let h = Harness::new().await;
    let alex = profile(42, None);
    let contact = SharedContact {
        user_id: None,
        first_name: "Alex".to_owned(),
        last_name: None,
        phone: "+15550100".to_owned(),
    };

    let reply = h.workflow.handle_contact(&alex, &contact).await;
    assert!(reply.text.contains("your own contact"));
}

#[tokio::test]
async fn store_failure_during_registration_is_reported() {
    let h = Harness::new().await;
    h.store.pool().close().await;

    let reply = h.share_own_contact(&profile(42, None)).await;
    assert!(reply.text.contains("contact support"));
}
