//! Submission guard: block and cooldown check at the start of the workflow.
//!
//! [`SubmissionGuard::may_post`] is read-only. Any store failure is logged
//! and reported as [`Denial::Unavailable`]; the guard never allows on error.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error};

use crate::store::{submissions, users, Store, StoreError, User};

/// Cooldown between two submissions of the same sender, in minutes.
pub const DEFAULT_COOLDOWN_MINUTES: i64 = 20;

/// Why a sender may not start a new valentine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// No user record for this Telegram id.
    NotRegistered,
    /// An administrator blocked the sender.
    Blocked {
        /// Reason recorded with the block.
        reason: String,
    },
    /// The last submission is too recent.
    CooldownActive {
        /// Time left until the cooldown expires.
        remaining: Duration,
    },
    /// The check could not be completed.
    Unavailable,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered => f.write_str("not registered"),
            Self::Blocked { reason } => f.write_str(reason),
            Self::CooldownActive { .. } => f.write_str("cooldown active"),
            Self::Unavailable => f.write_str("guard unavailable"),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The sender may start a valentine.
    Allow,
    /// The sender may not, for the given reason.
    Deny(Denial),
}

impl Verdict {
    /// Returns `true` for [`Verdict::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Pure guard decision over already-loaded state.
///
/// `last` is the creation time of the sender's most recent submission.
/// Posting is allowed only once strictly more than `cooldown` has elapsed.
pub fn decide(
    user: Option<&User>,
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Verdict {
    let Some(user) = user else {
        return Verdict::Deny(Denial::NotRegistered);
    };

    if user.blocked {
        return Verdict::Deny(Denial::Blocked {
            reason: user.blocked_reason.clone(),
        });
    }

    let Some(last) = last else {
        return Verdict::Allow;
    };

    let elapsed = now.signed_duration_since(last);
    if elapsed > cooldown {
        Verdict::Allow
    } else {
        let remaining = cooldown.checked_sub(&elapsed).unwrap_or(cooldown);
        Verdict::Deny(Denial::CooldownActive { remaining })
    }
}

/// Guard backed by the store.
#[derive(Debug, Clone)]
pub struct SubmissionGuard {
    store: Store,
    cooldown: Duration,
}

impl SubmissionGuard {
    /// Create a guard with the given cooldown window.
    pub fn new(store: Store, cooldown: Duration) -> Self {
        Self { store, cooldown }
    }

    /// The configured cooldown window.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Check whether `external_id` may start a valentine now.
    pub async fn may_post(&self, external_id: i64) -> Verdict {
        self.may_post_at(external_id, Utc::now()).await
    }

    /// Check against an explicit clock value.
    pub async fn may_post_at(&self, external_id: i64, now: DateTime<Utc>) -> Verdict {
        match self.evaluate(external_id, now).await {
            Ok(verdict) => {
                debug!(user_id = external_id, ?verdict, "guard evaluated");
                verdict
            }
            Err(e) => {
                error!(user_id = external_id, error = %e, "guard lookup failed, denying");
                Verdict::Deny(Denial::Unavailable)
            }
        }
    }

    /// Load the user and their latest submission in one transaction.
    async fn evaluate(&self, external_id: i64, now: DateTime<Utc>) -> Result<Verdict, StoreError> {
        let mut tx = self.store.begin().await?;

        let user = users::fetch_by_external_id(&mut tx, external_id).await?;
        let last = match &user {
            Some(u) if !u.blocked => submissions::fetch_latest(&mut tx, u.id)
                .await?
                .map(|s| s.created_at),
            _ => None,
        };

        tx.commit().await?;
        Ok(decide(user.as_ref(), last, now, self.cooldown))
    }
}
