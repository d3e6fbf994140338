//! SQLite persistence for registered users and their submissions.
//!
//! The [`Store`] wraps the shared [`SqlitePool`]. Every public operation runs
//! inside its own [`Transaction`]: the transaction is committed on success and
//! rolled back when dropped on any error or early-return path, which also
//! hands the connection back to the pool.
//!
//! Operations that span several statements (the submission guard, moderation
//! lookups) open a transaction with [`Store::begin`] and call the
//! connection-level functions in [`users`] and [`submissions`] directly.

pub mod submissions;
pub mod users;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

pub use self::submissions::{NewSubmission, Submission};
pub use self::users::{NewUser, User};

/// Schema applied by [`Store::migrate`]. Only `IF NOT EXISTS` statements.
pub const SCHEMA: &str = include_str!("../../migrations/001_schema.sql");

/// Pool size for file-backed databases.
const MAX_CONNECTIONS: u32 = 5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        /// The raw column value.
        value: String,
        /// Parser error.
        #[source]
        source: chrono::ParseError,
    },

    /// A user with this Telegram id already exists.
    #[error("user {0} is already registered")]
    AlreadyRegistered(i64),

    /// Another submission already carries this admin message id.
    #[error("admin message {0} is already linked to a submission")]
    DuplicateAdminMessage(i64),
}

/// Returns `true` when the error is a UNIQUE constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Encode a timestamp as fixed-width RFC 3339 UTC text.
pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp written by [`encode_timestamp`].
pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| StoreError::InvalidTimestamp {
            value: value.to_owned(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Handle to the users/valentines database.
///
/// Cheap to clone: clones share the underlying pool.
#[derive(Debug, Clone)]
pub struct Store {
    db: SqlitePool,
}

impl Store {
    /// Wrap an existing pool. The schema is not touched.
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open a pool for `url`, creating the database file if missing.
    ///
    /// In-memory URLs get a single connection that is never recycled: every
    /// SQLite connection to `:memory:` is a separate database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the database cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { MAX_CONNECTIONS };

        let mut pool = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // Closing the only connection would drop the database.
            pool = pool.idle_timeout(None).max_lifetime(None);
        }
        let db = pool.connect_with(options).await?;

        info!(max_connections, "database pool opened");
        Ok(Self { db })
    }

    /// Create tables and indexes if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.db).await?;
        info!("database schema ensured");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Start a transaction for a multi-statement operation.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be acquired.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.db.begin().await?)
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyRegistered`] if the Telegram id is taken.
    pub async fn register_user(&self, new: &NewUser) -> Result<User, StoreError> {
        let mut tx = self.begin().await?;
        let user = users::insert(&mut tx, new).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Find a user by Telegram id.
    pub async fn user_by_external_id(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        let mut tx = self.begin().await?;
        let user = users::fetch_by_external_id(&mut tx, external_id).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Find a user by internal row id.
    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let mut tx = self.begin().await?;
        let user = users::fetch_by_id(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Persist a submission.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateAdminMessage`] if the admin message id
    /// is already linked to another submission.
    pub async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let mut tx = self.begin().await?;
        let submission = submissions::insert(&mut tx, new).await?;
        tx.commit().await?;
        Ok(submission)
    }

    /// Most recent submission of a sender, if any.
    pub async fn latest_submission(&self, sender: i64) -> Result<Option<Submission>, StoreError> {
        let mut tx = self.begin().await?;
        let submission = submissions::fetch_latest(&mut tx, sender).await?;
        tx.commit().await?;
        Ok(submission)
    }

    /// Submission whose admin-channel post has the given message id.
    pub async fn submission_by_admin_message(
        &self,
        admin_message_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let mut tx = self.begin().await?;
        let submission = submissions::fetch_by_admin_message(&mut tx, admin_message_id).await?;
        tx.commit().await?;
        Ok(submission)
    }

    /// All submissions of a sender, oldest first.
    pub async fn submissions_of(&self, sender: i64) -> Result<Vec<Submission>, StoreError> {
        let mut tx = self.begin().await?;
        let list = submissions::fetch_by_sender(&mut tx, sender).await?;
        tx.commit().await?;
        Ok(list)
    }
}
