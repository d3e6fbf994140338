//! Admin chat commands: `/who` and `/block` as replies to mirrored posts.

use cupid::guard::{Denial, Verdict};
use cupid::moderation::UNSPECIFIED_REASON;
use cupid::workflow::Keyboard;

use crate::support::{profile, Harness, ADMIN_CHAT};

/// Register Alex and send one valentine; returns the admin message id.
async fn sent_valentine(h: &Harness) -> i64 {
    let alex = profile(42, Some("alex"));
    h.share_own_contact(&alex).await;
    h.say(&alex, &["/valentine", "Happy day", "Sam", "yes", "send"])
        .await;
    h.outbox.last_admin_message_id()
}

#[tokio::test]
async fn block_reply_blocks_sender() {
    let h = Harness::new().await;
    let message_id = sent_valentine(&h).await;

    let reply = h
        .workflow
        .handle_admin(ADMIN_CHAT, Some("/block spam"), Some(message_id))
        .await
        .expect("admin command should be answered");
    assert_eq!(reply.text, "User blocked. Reason: spam");
    assert_eq!(reply.keyboard, Keyboard::Keep);

    let user = h
        .store
        .user_by_external_id(42)
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(user.blocked);
    assert_eq!(user.blocked_reason, "spam");

    let guard = cupid::guard::SubmissionGuard::new(h.store.clone(), chrono::Duration::zero());
    assert_eq!(
        guard.may_post(42).await,
        Verdict::Deny(Denial::Blocked {
            reason: "spam".to_owned()
        })
    );
}

#[tokio::test]
async fn block_without_reason_uses_default() {
    let h = Harness::new().await;
    let message_id = sent_valentine(&h).await;

    let reply = h
        .workflow
        .handle_admin(ADMIN_CHAT, Some("/block@cupid_bot"), Some(message_id))
        .await
        .expect("admin command should be answered");
    assert!(reply.text.ends_with(UNSPECIFIED_REASON));
}

#[tokio::test]
async fn block_on_unrelated_message_is_not_found() {
    let h = Harness::new().await;
    sent_valentine(&h).await;

    let reply = h
        .workflow
        .handle_admin(ADMIN_CHAT, Some("/block spam"), Some(1))
        .await
        .expect("admin command should be answered");
    assert_eq!(reply.text, "User not found!");

    let user = h
        .store
        .user_by_external_id(42)
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(!user.blocked);
}

#[tokio::test]
async fn who_shows_sender_card() {
    let h = Harness::new().await;
    let message_id = sent_valentine(&h).await;

    let reply = h
        .workflow
        .handle_admin(ADMIN_CHAT, Some("/who"), Some(message_id))
        .await
        .expect("admin command should be answered");
    assert!(reply.text.contains("@alex"));
    assert!(reply.text.contains("Alex Doe"));
    assert!(reply.text.contains("https://t.me/+15550100"));
    assert!(reply.text.contains("<code>42</code>"));
    assert!(reply.text.contains("Valentines sent: 1"));
}

#[tokio::test]
async fn command_without_reply_gets_usage_hint() {
    let h = Harness::new().await;
    let reply = h
        .workflow
        .handle_admin(ADMIN_CHAT, Some("/who"), None)
        .await
        .expect("admin command should be answered");
    assert!(reply.text.contains("Reply to a valentine"));
}

#[tokio::test]
async fn other_chats_and_messages_are_ignored() {
    let h = Harness::new().await;
    let message_id = sent_valentine(&h).await;

    assert!(h
        .workflow
        .handle_admin(-1, Some("/block spam"), Some(message_id))
        .await
        .is_none());
    assert!(h
        .workflow
        .handle_admin(ADMIN_CHAT, Some("nice one"), Some(message_id))
        .await
        .is_none());
    assert!(h
        .workflow
        .handle_admin(ADMIN_CHAT, Some("/valentine"), Some(message_id))
        .await
        .is_none());
    assert!(h
        .workflow
        .handle_admin(ADMIN_CHAT, None, Some(message_id))
        .await
        .is_none());

    let user = h
        .store
        .user_by_external_id(42)
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(!user.blocked);
}
