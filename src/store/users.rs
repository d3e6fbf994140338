//! Identity registry: one row per registered sender.
//!
//! Display attributes are written once at registration. Only the
//! moderation attributes (`blocked`, `blocked_reason`) change afterwards.

use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::{is_unique_violation, StoreError};

/// A registered sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Internal row id, referenced by submissions.
    pub id: i64,
    /// Telegram user id.
    pub external_id: i64,
    /// Full name from the shared contact.
    pub full_name: String,
    /// Telegram username without the `@`, if the user has one.
    pub user_name: Option<String>,
    /// Phone number from the shared contact.
    pub phone: String,
    /// Whether an administrator blocked this user.
    pub blocked: bool,
    /// Reason given with the block; empty when never blocked.
    pub blocked_reason: String,
}

/// Attributes captured when a user shares their contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Telegram user id.
    pub external_id: i64,
    /// Full name.
    pub full_name: String,
    /// Telegram username, if any.
    pub user_name: Option<String>,
    /// Phone number.
    pub phone: String,
}

/// Raw row: `(id, user_id, full_name, user_name, phone, blocked, blocked_reason)`.
type UserRow = (i64, i64, String, Option<String>, String, bool, String);

const SELECT_USER: &str = "SELECT id, user_id, full_name, user_name, phone, blocked, blocked_reason \
                           FROM users";

fn row_to_user(row: UserRow) -> User {
    let (id, external_id, full_name, user_name, phone, blocked, blocked_reason) = row;
    User {
        id,
        external_id,
        full_name,
        user_name,
        phone,
        blocked,
        blocked_reason,
    }
}

/// Insert a new user.
///
/// # Errors
///
/// Returns [`StoreError::AlreadyRegistered`] when the Telegram id exists.
pub async fn insert(conn: &mut SqliteConnection, new: &NewUser) -> Result<User, StoreError> {
    let result = sqlx::query(
        "INSERT INTO users (user_id, full_name, user_name, phone) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(new.external_id)
    .bind(&new.full_name)
    .bind(&new.user_name)
    .bind(&new.phone)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::AlreadyRegistered(new.external_id)
        } else {
            StoreError::Database(e)
        }
    })?;

    info!(user_id = new.external_id, "user registered");

    Ok(User {
        id: result.last_insert_rowid(),
        external_id: new.external_id,
        full_name: new.full_name.clone(),
        user_name: new.user_name.clone(),
        phone: new.phone.clone(),
        blocked: false,
        blocked_reason: String::new(),
    })
}

/// Look a user up by Telegram id.
pub async fn fetch_by_external_id(
    conn: &mut SqliteConnection,
    external_id: i64,
) -> Result<Option<User>, StoreError> {
    let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE user_id = ?1"))
        .bind(external_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(row_to_user))
}

/// Look a user up by internal row id.
pub async fn fetch_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, StoreError> {
    let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(row_to_user))
}

/// Mark a user as blocked, overwriting any previous reason.
///
/// Returns `false` if no user has this row id.
pub async fn set_blocked(
    conn: &mut SqliteConnection,
    id: i64,
    reason: &str,
) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE users SET blocked = TRUE, blocked_reason = ?1 WHERE id = ?2")
        .bind(reason)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let updated = result.rows_affected() > 0;
    debug!(id, updated, "block flag written");
    Ok(updated)
}
