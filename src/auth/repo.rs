use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::repo_types::{EphemeralToken, NewToken, NewUser, TokenPurpose, User},
    db::PgStore,
    error::StoreError,
};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, enabled, \
     account_locked, failed_login_attempts, lock_time, created_at";

/// Users and their credentials. New users are only created through
/// [`AuthStore::register_pending`], where email uniqueness is enforced.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Persists every mutable field of an existing user.
    async fn save(&self, user: &User) -> Result<User, StoreError>;
}

/// Single-use tokens with an expiry, one table per purpose.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stores a new token, deleting any the user already holds for this purpose.
    async fn issue(
        &self,
        purpose: TokenPurpose,
        user_id: i64,
        token: NewToken,
    ) -> Result<EphemeralToken, StoreError>;

    async fn find_by_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
    ) -> Result<Option<EphemeralToken>, StoreError>;

    /// Deletes tokens whose expiry lies before `now`, returning how many went.
    async fn purge_expired(&self, purpose: TokenPurpose, now: OffsetDateTime) -> Result<u64, StoreError>;
}

/// Multi-write auth flows, each applied atomically.
#[async_trait]
pub trait AuthStore: CredentialStore + TokenStore {
    /// Inserts a disabled user together with its verification token. Fails
    /// with `StoreError::UniqueViolation` when the email is taken.
    async fn register_pending(
        &self,
        user: NewUser,
        token: NewToken,
    ) -> Result<(User, EphemeralToken), StoreError>;

    /// Consumes the verification token and enables its owner. `None` when
    /// the token was already consumed by someone else.
    async fn activate(&self, token: &EphemeralToken) -> Result<Option<User>, StoreError>;

    /// Consumes the reset token and replaces its owner's password hash.
    /// `None` when the token was already consumed by someone else.
    async fn reset_password(
        &self,
        token: &EphemeralToken,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, password_hash = $4, enabled = $5,
                account_locked = $6, failed_login_attempts = $7, lock_time = $8
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.enabled)
        .bind(user.account_locked)
        .bind(user.failed_login_attempts)
        .bind(user.lock_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

async fn insert_user(conn: &mut sqlx::PgConnection, user: &NewUser) -> Result<User, StoreError> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (first_name, last_name, email, password_hash, enabled)
        VALUES ($1, $2, $3, $4, FALSE)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .fetch_one(conn)
    .await
    .map_err(StoreError::from_sqlx)
}

async fn replace_token(
    conn: &mut sqlx::PgConnection,
    purpose: TokenPurpose,
    user_id: i64,
    token: &NewToken,
) -> Result<EphemeralToken, StoreError> {
    sqlx::query(&format!("DELETE FROM {} WHERE user_id = $1", purpose.table()))
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let stored = sqlx::query_as::<_, EphemeralToken>(&format!(
        r#"
        INSERT INTO {} (token, user_id, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id, token, user_id, expires_at
        "#,
        purpose.table()
    ))
    .bind(&token.token)
    .bind(user_id)
    .bind(token.expires_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(StoreError::from_sqlx)?;
    Ok(stored)
}

/// Deletes the token row first so that a concurrent consumer blocks on the
/// row lock and then sees nothing to delete. Returns whether this caller won.
async fn consume_token(
    conn: &mut sqlx::PgConnection,
    purpose: TokenPurpose,
    token: &EphemeralToken,
) -> Result<bool, StoreError> {
    let owner: Option<i64> = sqlx::query_scalar(&format!(
        "DELETE FROM {} WHERE id = $1 RETURNING user_id",
        purpose.table()
    ))
    .bind(token.id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(owner.is_some())
}

#[async_trait]
impl TokenStore for PgStore {
    async fn issue(
        &self,
        purpose: TokenPurpose,
        user_id: i64,
        token: NewToken,
    ) -> Result<EphemeralToken, StoreError> {
        let mut tx = self.pool.begin().await?;
        let stored = replace_token(&mut tx, purpose, user_id, &token).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn find_by_token(
        &self,
        purpose: TokenPurpose,
        token: &str,
    ) -> Result<Option<EphemeralToken>, StoreError> {
        let found = sqlx::query_as::<_, EphemeralToken>(&format!(
            "SELECT id, token, user_id, expires_at FROM {} WHERE token = $1",
            purpose.table()
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    async fn purge_expired(&self, purpose: TokenPurpose, now: OffsetDateTime) -> Result<u64, StoreError> {
        let done = sqlx::query(&format!("DELETE FROM {} WHERE expires_at < $1", purpose.table()))
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn register_pending(
        &self,
        user: NewUser,
        token: NewToken,
    ) -> Result<(User, EphemeralToken), StoreError> {
        let mut tx = self.pool.begin().await?;
        let user = insert_user(&mut tx, &user).await?;
        let token = replace_token(&mut tx, TokenPurpose::EmailVerification, user.id, &token).await?;
        tx.commit().await?;
        Ok((user, token))
    }

    async fn activate(&self, token: &EphemeralToken) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await?;
        if !consume_token(&mut tx, TokenPurpose::EmailVerification, token).await? {
            tx.rollback().await?;
            return Ok(None);
        }
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET enabled = TRUE WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(token.user_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(user))
    }

    async fn reset_password(
        &self,
        token: &EphemeralToken,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await?;
        if !consume_token(&mut tx, TokenPurpose::PasswordReset, token).await? {
            tx.rollback().await?;
            return Ok(None);
        }
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password_hash = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(token.user_id)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(user))
    }
}
