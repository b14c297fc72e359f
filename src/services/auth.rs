//! Identity service: local credentials and the external identity provider.
//!
//! DESIGN
//! ======
//! Two ways to obtain a session:
//! - e-mail + password stored locally as a salted, iterated SHA-256 digest
//!   (`salt$digest`, both hex);
//! - an access token issued by the external identity provider, verified by
//!   calling the provider's `/user` endpoint and linked to a local user by
//!   provider subject or e-mail.
//!
//! Either path ends in `session::create_session`; the rest of the API only
//! ever sees our own bearer tokens.

use async_trait::async_trait;
use axum::http::StatusCode;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::env_string;
use crate::db;
use crate::error::ErrorCode;
use crate::services::session::{SessionUser, bytes_to_hex};
use crate::validate::{FieldError, FieldErrors, ValidationError};

const PASSWORD_HASH_ROUNDS: u32 = 10_000;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("E-mail ou senha inválidos")]
    InvalidCredentials,
    #[error("E-mail já cadastrado")]
    EmailTaken,
    #[error("Senha atual incorreta")]
    WrongPassword,
    #[error("Provedor de autenticação não configurado")]
    ProviderNotConfigured,
    #[error("Token do provedor de autenticação inválido")]
    ProviderRejected,
    #[error("Falha ao contatar o provedor de autenticação: {0}")]
    Provider(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::InvalidCredentials => "E_AUTH_INVALID_CREDENTIALS",
            Self::EmailTaken => "E_AUTH_EMAIL_TAKEN",
            Self::WrongPassword => "E_AUTH_WRONG_PASSWORD",
            Self::ProviderNotConfigured => "E_AUTH_PROVIDER_DISABLED",
            Self::ProviderRejected => "E_AUTH_PROVIDER_REJECTED",
            Self::Provider(_) => "E_AUTH_PROVIDER",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidCredentials | Self::WrongPassword | Self::ProviderRejected => StatusCode::UNAUTHORIZED,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::ProviderNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn fields(&self) -> &[FieldError] {
        match self {
            Self::Validation(v) => &v.fields,
            _ => &[],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: String,
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// Hash a password with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::rng().random();
    let salt_hex = bytes_to_hex(&salt);
    let digest = stretch(&salt_hex, password, PASSWORD_HASH_ROUNDS);
    format!("{salt_hex}${digest}")
}

/// Check a password against a stored `salt$digest`.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    constant_time_eq(stretch(salt, password, PASSWORD_HASH_ROUNDS).as_bytes(), expected.as_bytes())
}

fn stretch(salt: &str, password: &str, rounds: u32) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..rounds {
        digest = Sha256::new()
            .chain_update(&digest)
            .chain_update(password.as_bytes())
            .finalize();
    }
    bytes_to_hex(&digest)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// LOCAL CREDENTIALS
// =============================================================================

/// Register a user with e-mail and password.
///
/// # Errors
///
/// Validation failures (including password confirmation mismatch), duplicate
/// e-mail, or database errors.
pub async fn sign_up(pool: &PgPool, input: &SignUp) -> Result<SessionUser, AuthError> {
    let mut errors = FieldErrors::new();
    errors.required("name", &input.name);
    errors.max_len("name", &input.name, 120);
    errors.email("email", &input.email);
    errors.password(&input.password, &input.password_confirmation);
    errors.into_result()?;

    let email = normalize_email(&input.email);
    let row = sqlx::query("INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING id")
        .bind(input.name.trim())
        .bind(&email)
        .bind(hash_password(&input.password))
        .fetch_one(pool)
        .await
        .map_err(|e| if db::is_unique_violation(&e) { AuthError::EmailTaken } else { AuthError::Database(e) })?;

    Ok(SessionUser { id: row.get("id"), name: input.name.trim().to_owned(), email })
}

/// Check e-mail and password. Unknown e-mail and wrong password are
/// indistinguishable to the caller.
///
/// # Errors
///
/// `InvalidCredentials` or a database error.
pub async fn sign_in(pool: &PgPool, email: &str, password: &str) -> Result<SessionUser, AuthError> {
    let row = sqlx::query("SELECT id, name, email, password_hash FROM users WHERE lower(email) = $1")
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let stored: Option<String> = row.get("password_hash");
    match stored {
        Some(hash) if verify_password(password, &hash) => {
            Ok(SessionUser { id: row.get("id"), name: row.get("name"), email: row.get("email") })
        }
        _ => Err(AuthError::InvalidCredentials),
    }
}

/// Replace a user's password after checking the current one.
///
/// # Errors
///
/// Validation failures, `WrongPassword`, or a database error.
pub async fn change_password(pool: &PgPool, user_id: Uuid, input: &PasswordChange) -> Result<(), AuthError> {
    let mut errors = FieldErrors::new();
    errors.password(&input.password, &input.password_confirmation);
    errors.into_result()?;

    let stored: Option<String> = sqlx::query_scalar::<_, Option<String>>("SELECT password_hash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .flatten();
    let Some(stored) = stored else {
        return Err(AuthError::WrongPassword);
    };
    if !verify_password(&input.current_password, &stored) {
        return Err(AuthError::WrongPassword);
    }

    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user_id)
        .bind(hash_password(&input.password))
        .execute(pool)
        .await?;
    Ok(())
}

// =============================================================================
// EXTERNAL IDENTITY PROVIDER
// =============================================================================

/// Profile returned by the identity provider's `/user` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    #[serde(alias = "sub")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ProviderUser {
    /// Name to store locally: the provider name, else the e-mail local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => self.email.split('@').next().unwrap_or_default().to_owned(),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a provider access token to the provider's user profile.
    async fn fetch_user(&self, access_token: &str) -> Result<ProviderUser, AuthError>;
}

/// Identity provider reached over HTTP.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpIdentityProvider {
    /// Load from `AUTH_PROVIDER_URL` and optional `AUTH_PROVIDER_API_KEY`.
    /// Returns `None` when the URL is missing (provider sign-in disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env_string("AUTH_PROVIDER_URL")?;
        Some(Self::new(base_url, env_string("AUTH_PROVIDER_API_KEY")))
    }

    #[must_use]
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned(), api_key }
    }

    #[must_use]
    pub fn user_url(&self) -> String {
        format!("{}/user", self.base_url)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn fetch_user(&self, access_token: &str) -> Result<ProviderUser, AuthError> {
        let mut request = self
            .client
            .get(self.user_url())
            .bearer_auth(access_token)
            .header("User-Agent", "gestao");
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let resp = request.send().await.map_err(|e| AuthError::Provider(e.to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::ProviderRejected);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!("{status}: {body}")));
        }

        resp.json::<ProviderUser>()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }
}

/// Link a provider profile to a local user, creating it when needed.
///
/// An existing local account with the same e-mail is claimed by the provider
/// subject unless a different subject already owns it.
///
/// # Errors
///
/// `EmailTaken` when the e-mail belongs to another provider subject, or a
/// database error.
pub async fn upsert_provider_user(pool: &PgPool, user: &ProviderUser) -> Result<SessionUser, AuthError> {
    let email = normalize_email(&user.email);

    let linked = sqlx::query(
        r"UPDATE users SET provider_subject = $1
          WHERE lower(email) = $2 AND (provider_subject IS NULL OR provider_subject = $1)
          RETURNING id, name, email",
    )
    .bind(&user.id)
    .bind(&email)
    .fetch_optional(pool)
    .await?;
    if let Some(r) = linked {
        return Ok(SessionUser { id: r.get("id"), name: r.get("name"), email: r.get("email") });
    }

    let row = sqlx::query(
        r"INSERT INTO users (name, email, provider_subject) VALUES ($1, $2, $3)
          ON CONFLICT (provider_subject) DO UPDATE SET email = EXCLUDED.email
          RETURNING id, name, email",
    )
    .bind(user.display_name())
    .bind(&email)
    .bind(&user.id)
    .fetch_one(pool)
    .await
    .map_err(|e| if db::is_unique_violation(&e) { AuthError::EmailTaken } else { AuthError::Database(e) })?;

    Ok(SessionUser { id: row.get("id"), name: row.get("name"), email: row.get("email") })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
