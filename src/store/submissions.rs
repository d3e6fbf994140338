//! Submission store: append-only record of confirmed valentines.
//!
//! Rows are never updated or deleted. `admin_message_id` is unique and is
//! the key for every moderation lookup.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use super::{decode_timestamp, encode_timestamp, is_unique_violation, StoreError};

/// A persisted valentine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Internal row id.
    pub id: i64,
    /// Row id of the sending [`User`](super::User).
    pub sender: i64,
    /// Free-text recipient label.
    pub recipient: String,
    /// Message body.
    pub body: String,
    /// Capture time.
    pub created_at: DateTime<Utc>,
    /// Message id of the post in the admin chat.
    pub admin_message_id: i64,
}

/// Data for a submission about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    /// Row id of the sending user.
    pub sender: i64,
    /// Recipient label.
    pub recipient: String,
    /// Message body.
    pub body: String,
    /// Capture time.
    pub created_at: DateTime<Utc>,
    /// Message id of the already-dispatched admin post.
    pub admin_message_id: i64,
}

/// Raw row: `(id, sender, recipient, body, created_at, admin_message_id)`.
type SubmissionRow = (i64, i64, String, String, String, i64);

const SELECT_SUBMISSION: &str =
    "SELECT id, sender, recipient, body, created_at, admin_message_id FROM valentines";

fn row_to_submission(row: SubmissionRow) -> Result<Submission, StoreError> {
    let (id, sender, recipient, body, created_at, admin_message_id) = row;
    Ok(Submission {
        id,
        sender,
        recipient,
        body,
        created_at: decode_timestamp(&created_at)?,
        admin_message_id,
    })
}

/// Insert a submission.
///
/// # Errors
///
/// Returns [`StoreError::DuplicateAdminMessage`] when the admin message id is
/// already in use.
pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewSubmission,
) -> Result<Submission, StoreError> {
    let result = sqlx::query(
        "INSERT INTO valentines (sender, recipient, body, created_at, admin_message_id) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(new.sender)
    .bind(&new.recipient)
    .bind(&new.body)
    .bind(encode_timestamp(new.created_at))
    .bind(new.admin_message_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::DuplicateAdminMessage(new.admin_message_id)
        } else {
            StoreError::Database(e)
        }
    })?;

    let id = result.last_insert_rowid();
    debug!(id, sender = new.sender, admin_message_id = new.admin_message_id, "submission stored");

    Ok(Submission {
        id,
        sender: new.sender,
        recipient: new.recipient.clone(),
        body: new.body.clone(),
        created_at: new.created_at,
        admin_message_id: new.admin_message_id,
    })
}

/// Most recent submission of `sender`.
///
/// Ties on `created_at` are broken by insertion order.
pub async fn fetch_latest(
    conn: &mut SqliteConnection,
    sender: i64,
) -> Result<Option<Submission>, StoreError> {
    let row: Option<SubmissionRow> = sqlx::query_as(&format!(
        "{SELECT_SUBMISSION} WHERE sender = ?1 ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .bind(sender)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(row_to_submission).transpose()
}

/// Submission linked to an admin-chat message.
pub async fn fetch_by_admin_message(
    conn: &mut SqliteConnection,
    admin_message_id: i64,
) -> Result<Option<Submission>, StoreError> {
    let row: Option<SubmissionRow> =
        sqlx::query_as(&format!("{SELECT_SUBMISSION} WHERE admin_message_id = ?1"))
            .bind(admin_message_id)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(row_to_submission).transpose()
}

/// All submissions of `sender`, oldest first.
pub async fn fetch_by_sender(
    conn: &mut SqliteConnection,
    sender: i64,
) -> Result<Vec<Submission>, StoreError> {
    let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
        "{SELECT_SUBMISSION} WHERE sender = ?1 ORDER BY created_at ASC, id ASC"
    ))
    .bind(sender)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(row_to_submission).collect()
}
