//! Auth routes: sign-up, sign-in, sign-out, password change, provider sign-in.

use axum::extract::{FromRef, State};
use axum::http::{HeaderMap, StatusCode};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::routes::extract::Json;
use crate::services::auth::{self as auth_svc, AuthError, PasswordChange, SignUp};
use crate::services::session::{self, SessionUser};
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from `Authorization: Bearer <token>`.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: SessionUser,
    pub token: String,
}

/// Bearer token from the request headers, if present and non-empty.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_owned())
        .filter(|token| !token.is_empty())
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(ApiError::unauthorized());
        };

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await
            .map_err(AuthError::from)?
            .ok_or_else(ApiError::unauthorized)?;

        Ok(Self { user, token })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProviderSignInBody {
    pub access_token: String,
}

async fn open_session(state: &AppState, user: SessionUser) -> Result<SessionResponse, ApiError> {
    let token = session::create_session(&state.pool, user.id, state.config.session_ttl_hours)
        .await
        .map_err(AuthError::from)?;
    Ok(SessionResponse { token, user })
}

/// `POST /api/auth/sign-up`: register and sign in.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUp>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let user = auth_svc::sign_up(&state.pool, &body).await?;
    info!(user_id = %user.id, "user signed up");
    let response = open_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/auth/sign-in`: e-mail and password.
pub async fn sign_in(State(state): State<AppState>, Json(body): Json<SignInBody>) -> Result<Json<SessionResponse>, ApiError> {
    let user = match auth_svc::sign_in(&state.pool, &body.email, &body.password).await {
        Ok(user) => user,
        Err(err) => {
            if matches!(err, AuthError::InvalidCredentials) {
                warn!("sign-in rejected");
            }
            return Err(err.into());
        }
    };
    info!(user_id = %user.id, "user signed in");
    Ok(Json(open_session(&state, user).await?))
}

/// `POST /api/auth/sign-out`: delete the current session.
pub async fn sign_out(State(state): State<AppState>, auth: AuthUser) -> Result<StatusCode, ApiError> {
    session::delete_session(&state.pool, &auth.token)
        .await
        .map_err(AuthError::from)?;
    info!(user_id = %auth.user.id, "user signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`: current user.
pub async fn me(auth: AuthUser) -> Json<SessionUser> {
    Json(auth.user)
}

/// `PUT /api/auth/password`: change password and revoke other sessions.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<PasswordChange>,
) -> Result<StatusCode, ApiError> {
    auth_svc::change_password(&state.pool, auth.user.id, &body).await?;
    let revoked = session::delete_other_sessions(&state.pool, auth.user.id, &auth.token)
        .await
        .map_err(AuthError::from)?;
    info!(user_id = %auth.user.id, revoked, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/auth/provider/sign-in`: exchange a provider access token for a session.
pub async fn provider_sign_in(
    State(state): State<AppState>,
    Json(body): Json<ProviderSignInBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Some(identity) = &state.identity else {
        return Err(AuthError::ProviderNotConfigured.into());
    };

    let profile = match identity.fetch_user(&body.access_token).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!(error = %err, "identity provider rejected sign-in");
            return Err(err.into());
        }
    };
    let user = auth_svc::upsert_provider_user(&state.pool, &profile).await?;
    info!(user_id = %user.id, "user signed in via identity provider");
    Ok(Json(open_session(&state, user).await?))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
