//! Transport-independent handling of inbound user and admin actions.
//!
//! The [`Workflow`] ties the pieces together: it classifies private
//! messages, runs them through the caller's [`Conversation`] (holding that
//! user's slot for the whole action), executes the requested effects via the
//! [`SubmissionGuard`] and the [`ModerationLinker`], and returns the
//! [`Reply`]s to send. Contact shares go to the identity registry; admin
//! commands go straight to the linker without any conversation state.

pub mod replies;

use tracing::{debug, error, info, warn};

use crate::conversation::{
    classify, Command, Conversation, Conversations, Effect, Input, Prompt, State, Transition,
    Valentine,
};
use crate::guard::{Denial, SubmissionGuard, Verdict};
use crate::moderation::{ModerationError, ModerationLinker, SubmitError};
use crate::store::{NewUser, Store, StoreError};
use crate::telegram::commands;

// ---------------------------------------------------------------------------
// Inbound / outbound types
// ---------------------------------------------------------------------------

/// The Telegram account behind an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Telegram user id.
    pub id: i64,
    /// First name.
    pub first_name: String,
    /// Last name, if set.
    pub last_name: Option<String>,
    /// Username without the `@`, if set.
    pub username: Option<String>,
}

/// A contact card shared through the contact-request button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedContact {
    /// Telegram user id of the contact, when it belongs to a Telegram user.
    pub user_id: Option<i64>,
    /// First name.
    pub first_name: String,
    /// Last name, if set.
    pub last_name: Option<String>,
    /// Phone number.
    pub phone: String,
}

impl SharedContact {
    /// First and last name joined with a space.
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, self.last_name.as_deref())
    }
}

fn join_name(first: &str, last: Option<&str>) -> String {
    match last.filter(|l| !l.is_empty()) {
        Some(last) => format!("{first} {last}"),
        None => first.to_owned(),
    }
}

/// Reply keyboard to attach to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave whatever keyboard is showing.
    Keep,
    /// Hide the reply keyboard.
    Remove,
    /// Contact-request button.
    RequestContact,
    /// `Yes` / `No`.
    YesNo,
    /// `Send` / `Cancel`.
    SendCancel,
}

/// An HTML message to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTML text.
    pub text: String,
    /// Keyboard to attach.
    pub keyboard: Keyboard,
}

impl Reply {
    /// Create a reply.
    pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }
}

/// Settings the workflow needs from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Chat id of the admin review chat.
    pub admin_chat_id: i64,
    /// Public link to the valentines channel, if any.
    pub channel_link: Option<String>,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Handles inbound actions and produces replies.
#[derive(Debug)]
pub struct Workflow {
    store: Store,
    guard: SubmissionGuard,
    linker: ModerationLinker,
    conversations: Conversations,
    settings: WorkflowSettings,
}

impl Workflow {
    /// Create a workflow over the given components.
    pub fn new(
        store: Store,
        guard: SubmissionGuard,
        linker: ModerationLinker,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            store,
            guard,
            linker,
            conversations: Conversations::new(),
            settings,
        }
    }

    /// Current conversation state of a user.
    pub async fn state_of(&self, user_id: i64) -> State {
        self.conversations.state_of(user_id).await
    }

    /// Copy of a user's conversation, including the draft.
    pub async fn conversation_of(&self, user_id: i64) -> Conversation {
        self.conversations.snapshot(user_id).await
    }

    /// Number of users with a valentine in progress.
    pub async fn active_conversations(&self) -> usize {
        self.conversations.active_count().await
    }

    /// Handle a message in a private chat.
    ///
    /// `text` is `None` for messages without text.
    pub async fn handle_private(&self, from: &Profile, text: Option<&str>) -> Vec<Reply> {
        let input = classify(text);

        match &input {
            Input::Command(Command::Start) => {
                return vec![Reply::new(
                    commands::handle_start(self.settings.channel_link.as_deref()),
                    Keyboard::RequestContact,
                )];
            }
            Input::Command(Command::Help) => {
                return vec![Reply::new(
                    commands::handle_help(self.guard.cooldown().num_minutes()),
                    Keyboard::Keep,
                )];
            }
            _ => {}
        }

        let slot = self.conversations.slot(from.id).await;
        let replies = {
            let mut conversation = slot.lock().await;
            self.advance(&mut conversation, from, &input).await
        };
        self.conversations.release(from.id, slot).await;
        replies
    }

    /// Apply one input to a locked conversation and carry out its effect.
    async fn advance(
        &self,
        conversation: &mut Conversation,
        from: &Profile,
        input: &Input,
    ) -> Vec<Reply> {
        let Transition {
            conversation: next,
            effect,
        } = conversation.step(input);
        *conversation = next;

        match effect {
            Effect::CheckGuard => match self.guard.may_post(from.id).await {
                Verdict::Allow => {
                    *conversation = Conversation::admit();
                    vec![replies::prompt(Prompt::Body)]
                }
                Verdict::Deny(denial) => {
                    info!(user_id = from.id, %denial, "valentine refused by guard");
                    vec![replies::denied(&denial)]
                }
            },
            Effect::Prompt(prompt) => vec![replies::prompt(prompt)],
            Effect::Reject(rejection) => {
                debug!(user_id = from.id, ?rejection, "input rejected");
                vec![replies::rejected(rejection)]
            }
            Effect::Preview(valentine) => match self.store.user_by_external_id(from.id).await {
                Ok(Some(sender)) => replies::preview(&sender, &valentine),
                Ok(None) => {
                    *conversation = Conversation::new();
                    vec![replies::denied(&Denial::NotRegistered)]
                }
                Err(e) => {
                    error!(user_id = from.id, error = %e, "sender lookup for preview failed");
                    *conversation = Conversation::new();
                    vec![replies::internal_error()]
                }
            },
            Effect::Dispatch(valentine) => vec![self.dispatch(from, &valentine).await],
            Effect::Cancelled => vec![replies::cancelled()],
            Effect::Discarded => vec![replies::discarded()],
        }
    }

    /// Re-check the guard, then submit through the linker.
    async fn dispatch(&self, from: &Profile, valentine: &Valentine) -> Reply {
        if let Verdict::Deny(denial) = self.guard.may_post(from.id).await {
            info!(user_id = from.id, %denial, "valentine refused at confirmation");
            return replies::denied(&denial);
        }

        let sender = match self.store.user_by_external_id(from.id).await {
            Ok(Some(user)) => user,
            Ok(None) => return replies::denied(&Denial::NotRegistered),
            Err(e) => {
                error!(user_id = from.id, error = %e, "sender lookup failed");
                return replies::internal_error();
            }
        };

        match self.linker.submit(&sender, valentine).await {
            Ok(_) => replies::sent(self.settings.channel_link.as_deref()),
            Err(SubmitError::Dispatch(e)) => {
                error!(user_id = from.id, error = %e, "valentine dispatch failed");
                replies::dispatch_failed()
            }
            Err(SubmitError::Store(_)) => replies::internal_error(),
        }
    }

    /// Handle a shared contact in a private chat.
    pub async fn handle_contact(&self, from: &Profile, contact: &SharedContact) -> Reply {
        if contact.user_id != Some(from.id) {
            warn!(user_id = from.id, "contact of another user shared");
            return replies::foreign_contact();
        }

        match self.store.user_by_external_id(from.id).await {
            Ok(Some(_)) => return replies::already_registered(),
            Ok(None) => {}
            Err(e) => {
                error!(user_id = from.id, error = %e, "registration lookup failed");
                return replies::internal_error();
            }
        }

        let new = NewUser {
            external_id: from.id,
            full_name: contact.full_name(),
            user_name: from.username.clone(),
            phone: contact.phone.clone(),
        };
        match self.store.register_user(&new).await {
            Ok(_) => replies::registered(),
            Err(StoreError::AlreadyRegistered(_)) => replies::already_registered(),
            Err(e) => {
                error!(user_id = from.id, error = %e, "registration failed");
                replies::internal_error()
            }
        }
    }

    /// Handle a message in a group chat.
    ///
    /// Only `/who` and `/block` in the admin chat are answered. `reply_to` is
    /// the message id the command replies to.
    pub async fn handle_admin(
        &self,
        chat_id: i64,
        text: Option<&str>,
        reply_to: Option<i64>,
    ) -> Option<Reply> {
        if chat_id != self.settings.admin_chat_id {
            return None;
        }
        let Input::Command(command) = classify(text) else {
            return None;
        };
        if !matches!(command, Command::Block { .. } | Command::Who) {
            return None;
        }
        let Some(admin_message_id) = reply_to else {
            return Some(Reply::new(commands::handle_admin_usage(), Keyboard::Keep));
        };

        let reply = match command {
            Command::Block { reason } => {
                match self
                    .linker
                    .block_sender(admin_message_id, reason.as_deref())
                    .await
                {
                    Ok(user) => replies::sender_blocked(&user.blocked_reason),
                    Err(e) => moderation_failure(admin_message_id, &e),
                }
            }
            _ => match self.linker.resolve_sender(admin_message_id).await {
                Ok(user) => match self.linker.submission_count(&user).await {
                    Ok(count) => Reply::new(commands::who_card(&user, count), Keyboard::Keep),
                    Err(e) => {
                        error!(admin_message_id, error = %e, "submission count failed");
                        admin_internal_error()
                    }
                },
                Err(e) => moderation_failure(admin_message_id, &e),
            },
        };
        Some(reply)
    }
}

fn moderation_failure(admin_message_id: i64, err: &ModerationError) -> Reply {
    match err {
        ModerationError::NotFound(_) => {
            info!(admin_message_id, "moderation target not found");
            replies::sender_not_found()
        }
        ModerationError::Store(e) => {
            error!(admin_message_id, error = %e, "moderation lookup failed");
            admin_internal_error()
        }
    }
}

fn admin_internal_error() -> Reply {
    Reply {
        keyboard: Keyboard::Keep,
        ..replies::internal_error()
    }
}
