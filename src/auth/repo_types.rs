use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String, // unique, compared as stored
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub enabled: bool,         // false until the email is verified
    pub account_locked: bool,
    pub failed_login_attempts: i32,
    pub lock_time: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// The two kinds of single-use tokens mailed to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    pub(crate) fn table(self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "verification_tokens",
            TokenPurpose::PasswordReset => "password_reset_tokens",
        }
    }
}

/// A stored single-use token.
#[derive(Debug, Clone, FromRow)]
pub struct EphemeralToken {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
}

impl EphemeralToken {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

/// An ephemeral token about to be stored.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl NewToken {
    pub fn generate(ttl: Duration) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            expires_at: OffsetDateTime::now_utc() + ttl,
        }
    }
}
