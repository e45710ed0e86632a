use std::time::Duration;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod jobs;
mod notify;
mod response;
mod state;
#[cfg(test)]
mod testing;
mod users;

use crate::{auth::services::AuthService, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "jobtrackr=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    let sweep_every = app_state.config.tokens.sweep_interval_secs;
    if sweep_every > 0 {
        tokio::spawn(sweep_expired_tokens(
            app_state.auth.clone(),
            Duration::from_secs(sweep_every),
        ));
    }

    app::serve(app::build_app(app_state)).await
}

async fn sweep_expired_tokens(auth: AuthService, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match auth.purge_expired_tokens().await {
            Ok(0) => {}
            Ok(n) => tracing::info!(purged = n, "expired tokens removed"),
            Err(e) => tracing::error!(error = %e, "token sweep failed"),
        }
    }
}
