// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A user account row.
///
/// `email` and `twitter_id` are both optional; every account created by the
/// flows in this crate has at least one of them set, but the storage layer
/// does not enforce that.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: Option<String>,
    /// Argon2id PHC string. `None` for OAuth-only accounts.
    pub password_hash: Option<String>,
    pub confirmed: bool,
    /// Set by the (out-of-scope) password-reset flow; carried in the schema,
    /// never read by the flows in this crate.
    pub forgot_password_locked: bool,
    pub twitter_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new user.
#[derive(Debug, Clone, Default)]
pub struct CreateUserRow {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub confirmed: bool,
    pub twitter_id: Option<String>,
}
