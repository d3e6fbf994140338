//! Per-user conversation slots.
//!
//! Each Telegram user with a valentine in progress owns one slot. A slot is
//! locked for the whole handling of one inbound message, so messages of the
//! same user are processed one at a time while other users proceed
//! concurrently. Idle slots are dropped once nobody else holds them.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::{Conversation, State};

/// Shared handle to one user's conversation.
pub type Slot = Arc<Mutex<Conversation>>;

/// Conversation slots keyed by Telegram user id.
#[derive(Debug, Default)]
pub struct Conversations {
    slots: Mutex<HashMap<i64, Slot>>,
}

impl Conversations {
    /// Create an empty slot table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot for `user_id`, creating an idle one if needed.
    pub async fn slot(&self, user_id: i64) -> Slot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(user_id).or_default())
    }

    /// Return a slot obtained from [`slot`](Self::slot).
    ///
    /// The slot is removed from the table when its conversation is idle and
    /// no other task holds a reference to it.
    pub async fn release(&self, user_id: i64, slot: Slot) {
        let mut slots = self.slots.lock().await;
        let Some(current) = slots.get(&user_id) else {
            return;
        };
        if !Arc::ptr_eq(current, &slot) {
            return;
        }
        // One reference in the table, one held by the caller.
        if Arc::strong_count(&slot) != 2 {
            return;
        }
        let idle = slot.try_lock().map(|c| c.is_idle()).unwrap_or(false);
        if idle {
            slots.remove(&user_id);
            debug!(user_id, "conversation slot dropped");
        }
    }

    /// Copy of `user_id`'s conversation; idle when there is no slot.
    pub async fn snapshot(&self, user_id: i64) -> Conversation {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(&user_id).map(Arc::clone)
        };
        match slot {
            Some(slot) => slot.lock().await.clone(),
            None => Conversation::new(),
        }
    }

    /// Current state of `user_id`'s conversation.
    pub async fn state_of(&self, user_id: i64) -> State {
        self.snapshot(user_id).await.state()
    }

    /// Number of users with a live slot.
    pub async fn active_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}
