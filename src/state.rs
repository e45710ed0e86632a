use std::sync::Arc;

use crate::{
    auth::{jwt::JwtKeys, repo::AuthStore, repo::CredentialStore, services::AuthService},
    config::AppConfig,
    db::PgStore,
    jobs::{repo::JobStore, services::JobService},
    notify::{self, Links, Notifier},
    users::services::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub credentials: Arc<dyn CredentialStore>,
    pub auth: AuthService,
    pub users: UserService,
    pub jobs: JobService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(PgStore::connect(&config.database_url).await?);
        if let Err(e) = store.migrate().await {
            tracing::warn!(error = %e, "migrations failed; continuing");
        }
        let notifier = notify::from_config(&config.mail)?;
        Ok(Self::from_parts(config, store, notifier))
    }

    /// Wires every service onto one store. Tests pass the in-memory store here.
    pub fn from_parts<S>(config: Arc<AppConfig>, store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self
    where
        S: AuthStore + JobStore + 'static,
    {
        let keys = JwtKeys::from_config(&config.jwt);
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let auth_store: Arc<dyn AuthStore> = store.clone();
        let job_store: Arc<dyn JobStore> = store;

        let auth = AuthService::new(
            auth_store,
            keys.clone(),
            notifier,
            Links::new(config.mail.public_base_url.clone()),
            &config.tokens,
        );

        Self {
            users: UserService::new(credentials.clone()),
            jobs: JobService::new(job_store),
            auth,
            credentials,
            keys,
            config,
        }
    }
}
