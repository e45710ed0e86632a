use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoginResponse, RegisterRequest},
        jwt::JwtKeys,
        password::{burn_verify, hash_password, verify_password},
        repo::AuthStore,
        repo_types::{NewToken, NewUser, TokenPurpose, User},
    },
    config::TokenConfig,
    error::AppError,
    notify::{Links, Notification, Notifier},
};

/// Drives registration, verification, login and password reset.
///
/// Account lifecycle: a registered user starts disabled and becomes active
/// only by consuming its verification token before it expires.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    keys: JwtKeys,
    notifier: Arc<dyn Notifier>,
    links: Links,
    verification_ttl: Duration,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AuthStore>,
        keys: JwtKeys,
        notifier: Arc<dyn Notifier>,
        links: Links,
        tokens: &TokenConfig,
    ) -> Self {
        Self {
            store,
            keys,
            notifier,
            links,
            verification_ttl: Duration::minutes(tokens.verification_ttl_minutes),
            reset_ttl: Duration::minutes(tokens.reset_ttl_minutes),
        }
    }

    /// Notification failures are logged and otherwise ignored.
    async fn notify(&self, notification: Notification) {
        let to = notification.to.clone();
        if let Err(e) = self.notifier.send(notification).await {
            warn!(error = %e, email = %to, "notification delivery failed");
        }
    }

    async fn send_verification(&self, user: &User, token: &str) {
        let link = self.links.verify_email(token);
        self.notify(Notification::verification(
            &user.email,
            &link,
            self.verification_ttl.whole_minutes(),
        ))
        .await;
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        if self.store.find_by_email(&request.email).await?.is_some() {
            warn!(email = %request.email, "attempt to register already existing email");
            return Err(AppError::DuplicateIdentity);
        }

        let password_hash = hash_password(&request.password).map_err(AppError::Unexpected)?;
        let new_user = NewUser {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            password_hash,
        };

        // a concurrent registration that slipped past the lookup surfaces
        // here as a unique violation, i.e. DuplicateIdentity
        let (user, token) = self
            .store
            .register_pending(new_user, NewToken::generate(self.verification_ttl))
            .await?;

        self.send_verification(&user, &token.token).await;
        info!(user_id = user.id, email = %user.email, "user registered, verification token sent");
        Ok(user)
    }

    pub async fn verify_email_token(&self, token: &str) -> Result<User, AppError> {
        let Some(record) = self
            .store
            .find_by_token(TokenPurpose::EmailVerification, token)
            .await?
        else {
            warn!("invalid verification token received");
            return Err(AppError::InvalidToken);
        };

        if record.is_expired() {
            warn!(user_id = record.user_id, "expired verification token attempted");
            return Err(AppError::ExpiredToken);
        }

        let Some(user) = self.store.activate(&record).await? else {
            warn!(user_id = record.user_id, "verification token consumed concurrently");
            return Err(AppError::InvalidToken);
        };
        info!(user_id = user.id, email = %user.email, "user verified");
        Ok(user)
    }

    /// Issues a fresh verification token to a user that is still disabled.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            warn!(email = %email, "verification resend for non-existent email");
            return Err(AppError::UserNotFound);
        };
        if user.enabled {
            return Err(AppError::Validation("email: Account is already verified".into()));
        }

        let token = self
            .store
            .issue(
                TokenPurpose::EmailVerification,
                user.id,
                NewToken::generate(self.verification_ttl),
            )
            .await?;
        self.send_verification(&user, &token.token).await;
        info!(user_id = user.id, "verification token reissued");
        Ok(())
    }

    /// Checks the password hash and the account flags.
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            // same argon2 cost as a real check, so timing does not reveal the miss
            burn_verify(password);
            warn!(email = %email, "login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let ok = verify_password(password, &user.password_hash).map_err(|e| {
            error!(error = %e, user_id = user.id, "stored password hash unreadable");
            AppError::InvalidCredentials
        })?;
        if !ok {
            warn!(email = %email, user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        if !user.enabled {
            warn!(email = %email, user_id = user.id, "login before email verification");
            return Err(AppError::InvalidCredentials);
        }
        if user.account_locked {
            warn!(email = %email, user_id = user.id, "login to locked account");
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self.authenticate(email, password).await?;
        let token = self.keys.issue(&user.email).map_err(AppError::Unexpected)?;
        info!(user_id = user.id, email = %user.email, "user logged in");
        Ok(LoginResponse {
            email: user.email,
            token,
        })
    }

    pub async fn send_password_reset_token(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            warn!(email = %email, "password reset requested for non-existent email");
            return Err(AppError::UserNotFound);
        };

        // issue() drops any previous reset token for this user
        let token = self
            .store
            .issue(
                TokenPurpose::PasswordReset,
                user.id,
                NewToken::generate(self.reset_ttl),
            )
            .await?;

        let link = self.links.reset_password(&token.token);
        self.notify(Notification::password_reset(
            &user.email,
            &link,
            self.reset_ttl.whole_minutes(),
        ))
        .await;
        info!(user_id = user.id, email = %user.email, "password reset token sent");
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let Some(record) = self
            .store
            .find_by_token(TokenPurpose::PasswordReset, token)
            .await?
        else {
            warn!("invalid password reset token used");
            return Err(AppError::InvalidToken);
        };

        if record.is_expired() {
            warn!(user_id = record.user_id, "expired password reset token attempted");
            return Err(AppError::ExpiredToken);
        }

        let password_hash = hash_password(new_password).map_err(AppError::Unexpected)?;
        let Some(user) = self.store.reset_password(&record, &password_hash).await? else {
            warn!(user_id = record.user_id, "password reset token consumed concurrently");
            return Err(AppError::InvalidToken);
        };
        info!(user_id = user.id, email = %user.email, "password reset");
        Ok(())
    }

    /// Deletes expired verification and reset tokens.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AppError> {
        let now = OffsetDateTime::now_utc();
        let mut purged = 0;
        for purpose in [TokenPurpose::EmailVerification, TokenPurpose::PasswordReset] {
            purged += self.store.purge_expired(purpose, now).await?;
        }
        Ok(purged)
    }
}
