//! Per-user conversation slots.

use std::sync::Arc;

use cupid::conversation::{Command, Conversation, Conversations, Input, State};

#[tokio::test]
async fn idle_slot_is_dropped_on_release() {
    let conversations = Conversations::new();
    let slot = conversations.slot(1).await;
    assert_eq!(conversations.active_count().await, 1);

    conversations.release(1, slot).await;
    assert_eq!(conversations.active_count().await, 0);
}

#[tokio::test]
async fn busy_slot_survives_release() {
    let conversations = Conversations::new();
    let slot = conversations.slot(1).await;
    *slot.lock().await = Conversation::admit();
    conversations.release(1, slot).await;

    assert_eq!(conversations.active_count().await, 1);
    assert_eq!(conversations.state_of(1).await, State::AwaitingBody);
}

#[tokio::test]
async fn shared_slot_is_kept_until_last_release() {
    let conversations = Conversations::new();
    let first = conversations.slot(1).await;
    let second = conversations.slot(1).await;
    assert!(Arc::ptr_eq(&first, &second));

    conversations.release(1, first).await;
    assert_eq!(conversations.active_count().await, 1);

    conversations.release(1, second).await;
    assert_eq!(conversations.active_count().await, 0);
}

#[tokio::test]
async fn unknown_user_is_idle() {
    let conversations = Conversations::new();
    assert_eq!(conversations.state_of(99).await, State::Idle);
}

#[tokio::test]
async fn slots_are_per_user() {
    let conversations = Conversations::new();
    let alex = conversations.slot(1).await;
    let sam = conversations.slot(2).await;
    assert!(!Arc::ptr_eq(&alex, &sam));

    {
        let mut conversation = alex.lock().await;
        *conversation = Conversation::admit();
        let next = conversation.step(&Input::Text("Happy day".to_owned()));
        *conversation = next.conversation;
    }
    conversations.release(1, alex).await;
    conversations.release(2, sam).await;

    assert_eq!(conversations.state_of(1).await, State::AwaitingRecipient);
    assert_eq!(conversations.state_of(2).await, State::Idle);

    let slot = conversations.slot(1).await;
    let cancelled = slot.lock().await.step(&Input::Command(Command::Cancel));
    *slot.lock().await = cancelled.conversation;
    conversations.release(1, slot).await;
    assert_eq!(conversations.active_count().await, 0);
}
