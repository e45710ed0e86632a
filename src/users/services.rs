use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::{
        extractors::AuthUser,
        password::{hash_password, verify_password},
        repo::CredentialStore,
        repo_types::User,
    },
    error::AppError,
    users::dto::UserResponse,
};

/// Operations on the signed-in user's own account.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    async fn load(&self, caller: &AuthUser) -> Result<User, AppError> {
        self.store
            .find_by_email(&caller.email)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn current_user(&self, caller: &AuthUser) -> Result<UserResponse, AppError> {
        Ok(self.load(caller).await?.into())
    }

    /// Requires the current password before storing a new hash.
    pub async fn update_password(
        &self,
        caller: &AuthUser,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut user = self.load(caller).await?;
        let matches = verify_password(current_password, &user.password_hash).map_err(AppError::Unexpected)?;
        if !matches {
            warn!(user_id = user.id, "password change with wrong current password");
            return Err(AppError::Validation(
                "currentPassword: Current password provided is incorrect.".into(),
            ));
        }

        user.password_hash = hash_password(new_password).map_err(AppError::Unexpected)?;
        self.store.save(&user).await?;
        info!(user_id = user.id, "password updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo_types::NewUser, testing::MemoryStore};

    async fn setup() -> (UserService, MemoryStore, AuthUser) {
        let store = MemoryStore::default();
        let user = store
            .seed_user(NewUser {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                email: "ann@x.com".into(),
                password_hash: hash_password("Passw0rd").unwrap(),
            })
            .unwrap();
        let caller = AuthUser {
            id: user.id,
            email: user.email,
        };
        (UserService::new(Arc::new(store.clone())), store, caller)
    }

    #[tokio::test]
    async fn current_user_returns_profile() {
        let (svc, _, caller) = setup().await;
        let profile = svc.current_user(&caller).await.unwrap();
        assert_eq!(
            profile,
            UserResponse {
                email: "ann@x.com".into(),
                first_name: "Ann".into(),
                last_name: "Lee".into(),
            }
        );
    }

    #[tokio::test]
    async fn current_user_for_vanished_account_is_not_found() {
        let (svc, _, _) = setup().await;
        let ghost = AuthUser {
            id: 99,
            email: "ghost@x.com".into(),
        };
        assert!(matches!(
            svc.current_user(&ghost).await.unwrap_err(),
            AppError::UserNotFound
        ));
    }

    #[tokio::test]
    async fn update_password_checks_current_password() {
        let (svc, store, caller) = setup().await;
        let before = store.user("ann@x.com").unwrap().password_hash;

        let err = svc
            .update_password(&caller, "WrongPass1", "N3wPassword")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("currentPassword")));
        assert_eq!(store.user("ann@x.com").unwrap().password_hash, before);

        svc.update_password(&caller, "Passw0rd", "N3wPassword")
            .await
            .unwrap();
        let after = store.user("ann@x.com").unwrap().password_hash;
        assert!(verify_password("N3wPassword", &after).unwrap());
    }
}
