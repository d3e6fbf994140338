//! Moderation linker: dispatches finished valentines and maps admin-chat
//! posts back to their senders.
//!
//! [`ModerationLinker::submit`] posts to the public channel and the admin
//! chat through an [`Outbox`], then persists the submission keyed by the
//! admin post's message id. Nothing is written unless both posts succeed.
//! [`ModerationLinker::resolve_sender`] and
//! [`ModerationLinker::block_sender`] use that id for reverse lookups.

pub mod render;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::conversation::Valentine;
use crate::store::{submissions, users, NewSubmission, Store, StoreError, Submission, User};

/// Reason recorded when an administrator blocks without giving one.
pub const UNSPECIFIED_REASON: &str = "not specified";

// ---------------------------------------------------------------------------
// Outbox port
// ---------------------------------------------------------------------------

/// Where a post goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// The public valentines channel.
    Public,
    /// The private admin review chat.
    Admin,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Markup of an outbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Telegram HTML parse mode.
    Html,
    /// No parse mode.
    Plain,
}

/// A post could not be delivered.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{destination} post failed: {reason}")]
pub struct DispatchError {
    /// Which destination failed.
    pub destination: Destination,
    /// Transport error text.
    pub reason: String,
}

/// Outbound transport for channel and admin posts.
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Post `text` and return the transport-issued message id.
    async fn post(
        &self,
        destination: Destination,
        text: &str,
        format: TextFormat,
    ) -> Result<i64, DispatchError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of [`ModerationLinker::submit`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// A post failed; nothing was persisted.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// Both posts went out but the record could not be written.
    #[error("failed to persist submission: {0}")]
    Store(#[from] StoreError),
}

/// Failure of a moderation lookup.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    /// No submission is linked to this admin message.
    #[error("no submission linked to admin message {0}")]
    NotFound(i64),
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Linker
// ---------------------------------------------------------------------------

/// Dispatches valentines and resolves admin posts to senders.
#[derive(Clone)]
pub struct ModerationLinker {
    store: Store,
    outbox: Arc<dyn Outbox>,
    footer: String,
}

impl fmt::Debug for ModerationLinker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerationLinker")
            .field("footer", &self.footer)
            .finish_non_exhaustive()
    }
}

impl ModerationLinker {
    /// Create a linker. `footer` is the call-to-action appended to public posts.
    pub fn new(store: Store, outbox: Arc<dyn Outbox>, footer: impl Into<String>) -> Self {
        Self {
            store,
            outbox,
            footer: footer.into(),
        }
    }

    /// Dispatch a valentine from `sender` and persist it.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Dispatch`] if either post fails (nothing persisted),
    /// [`SubmitError::Store`] if the record cannot be written.
    pub async fn submit(
        &self,
        sender: &User,
        valentine: &Valentine,
    ) -> Result<Submission, SubmitError> {
        self.submit_at(sender, valentine, Utc::now()).await
    }

    /// [`submit`](Self::submit) with an explicit capture time.
    pub async fn submit_at(
        &self,
        sender: &User,
        valentine: &Valentine,
        now: DateTime<Utc>,
    ) -> Result<Submission, SubmitError> {
        let public = render::public_post(sender, valentine, &self.footer);
        let admin = render::admin_post(sender, valentine);

        self.outbox
            .post(Destination::Public, &public, TextFormat::Html)
            .await
            .inspect_err(|e| warn!(user_id = sender.external_id, error = %e, "public post failed"))?;

        let admin_message_id = self
            .outbox
            .post(Destination::Admin, &admin, TextFormat::Plain)
            .await
            .inspect_err(|e| warn!(user_id = sender.external_id, error = %e, "admin post failed"))?;

        let new = NewSubmission {
            sender: sender.id,
            recipient: valentine.recipient.clone(),
            body: valentine.body.clone(),
            created_at: now,
            admin_message_id,
        };
        let submission = self.store.insert_submission(&new).await.inspect_err(|e| {
            error!(
                user_id = sender.external_id,
                admin_message_id,
                error = %e,
                "valentine posted but not persisted"
            );
        })?;

        info!(
            user_id = sender.external_id,
            submission_id = submission.id,
            admin_message_id,
            anonymous = valentine.anonymous,
            "valentine submitted"
        );
        Ok(submission)
    }

    /// Find the sender of the submission posted as `admin_message_id`.
    ///
    /// # Errors
    ///
    /// [`ModerationError::NotFound`] if no submission carries that id.
    pub async fn resolve_sender(&self, admin_message_id: i64) -> Result<User, ModerationError> {
        let mut tx = self.store.begin().await?;
        let user = resolve_in(&mut tx, admin_message_id).await?;
        tx.commit().await.map_err(StoreError::from)?;
        Ok(user)
    }

    /// Block the sender of the submission posted as `admin_message_id`.
    ///
    /// A missing or blank reason is recorded as [`UNSPECIFIED_REASON`].
    /// Blocking an already blocked user overwrites the reason.
    ///
    /// # Errors
    ///
    /// [`ModerationError::NotFound`] if no submission carries that id.
    pub async fn block_sender(
        &self,
        admin_message_id: i64,
        reason: Option<&str>,
    ) -> Result<User, ModerationError> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(UNSPECIFIED_REASON);

        let mut tx = self.store.begin().await?;
        let mut user = resolve_in(&mut tx, admin_message_id).await?;
        if !users::set_blocked(&mut tx, user.id, reason).await? {
            return Err(ModerationError::NotFound(admin_message_id));
        }
        tx.commit().await.map_err(StoreError::from)?;

        user.blocked = true;
        user.blocked_reason = reason.to_owned();
        info!(
            user_id = user.external_id,
            admin_message_id,
            reason,
            "sender blocked"
        );
        Ok(user)
    }

    /// Number of submissions `user` has made.
    pub async fn submission_count(&self, user: &User) -> Result<usize, StoreError> {
        Ok(self.store.submissions_of(user.id).await?.len())
    }
}

/// Resolve a sender inside an open transaction.
async fn resolve_in(
    conn: &mut sqlx::SqliteConnection,
    admin_message_id: i64,
) -> Result<User, ModerationError> {
    let submission = submissions::fetch_by_admin_message(conn, admin_message_id)
        .await?
        .ok_or(ModerationError::NotFound(admin_message_id))?;
    users::fetch_by_id(conn, submission.sender)
        .await?
        .ok_or(ModerationError::NotFound(admin_message_id))
}
