use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{error::AppError, state::AppState};

/// The caller behind a request whose bearer token checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Identity attached to every request by [`authenticate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(AuthUser),
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve(state: &AppState, token: &str) -> Principal {
    let Some(email) = state.keys.extract_identity(token) else {
        debug!("bearer token has no readable subject");
        return Principal::Anonymous;
    };

    let user = match state.credentials.find_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(email = %email, "bearer token for unknown user");
            return Principal::Anonymous;
        }
        Err(e) => {
            warn!(error = %e, "user lookup failed during authentication");
            return Principal::Anonymous;
        }
    };

    match state.keys.verify(token) {
        Ok(claims) if claims.sub == user.email => Principal::Authenticated(AuthUser {
            id: user.id,
            email: user.email,
        }),
        Ok(_) => {
            warn!(email = %email, "bearer token subject mismatch");
            Principal::Anonymous
        }
        Err(e) => {
            debug!(error = %e, email = %email, "bearer token rejected");
            Principal::Anonymous
        }
    }
}

/// Resolves the bearer token, if any, into a [`Principal`]. Never rejects;
/// protected handlers do that by asking for an [`AuthUser`].
pub async fn authenticate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let principal = match bearer_token(&parts) {
        Some(token) => resolve(&state, token).await,
        None => Principal::Anonymous,
    };
    parts.extensions.insert(principal);
    next.run(Request::from_parts(parts, body)).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Principal>().cloned().unwrap_or_default())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Principal::from_request_parts(parts, state).await {
            Ok(Principal::Authenticated(user)) => Ok(user),
            _ => Err(AppError::AccessDenied),
        }
    }
}
