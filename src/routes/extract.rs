//! Request extractors that reject with the `ApiError` envelope.
//!
//! axum's own `Json`, `Query` and `Path` answer malformed input with a
//! `text/plain` body. These wrappers delegate to them and rewrite the
//! rejection so clients always get `{code, message}` JSON. A JSON body that
//! parses but does not fit the target type is a 422 `E_VALIDATION`, like any
//! other field problem; everything else is `E_BAD_REQUEST` with axum's status.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub struct Json<T>(pub T);

pub struct Query<T>(pub T);

pub struct Path<T>(pub T);

impl<T: DeserializeOwned> Json<T> {
    /// Parse an already-buffered body, for handlers whose body is optional.
    ///
    /// # Errors
    ///
    /// Same mapping as the extractor.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ApiError> {
        let axum::Json(value) = axum::Json::<T>::from_bytes(bytes).map_err(json_rejection)?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await.map_err(json_rejection)?;
        Ok(Self(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state).await.map_err(query_rejection)?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await.map_err(path_rejection)?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    let status = rejection.status();
    tracing::debug!(%status, reason = %rejection.body_text(), "json body rejected");
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return ApiError::new(status, "E_VALIDATION", format!("Dados inválidos: {}", rejection.body_text()));
    }
    ApiError::new(status, "E_BAD_REQUEST", format!("Corpo da requisição inválido: {}", rejection.body_text()))
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::new(rejection.status(), "E_BAD_REQUEST", format!("Parâmetros inválidos: {}", rejection.body_text()))
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    ApiError::new(rejection.status(), "E_BAD_REQUEST", format!("Caminho inválido: {}", rejection.body_text()))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
