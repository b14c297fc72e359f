//! REST client wrapper.
//!
//! `ApiClient` owns the base URL and the two headers every tenant-scoped
//! call needs. Non-2xx responses are folded into a single
//! `ClientError::Api` carrying the server's `message`, so the command layer
//! only ever prints one line on failure.

use reqwest::header::{HeaderValue, InvalidHeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use uuid::Uuid;

pub const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("missing token; run `auth sign-in` and pass --token or set GESTAO_TOKEN")]
    MissingToken,
    #[error("missing company; pass --tenant or set GESTAO_TENANT_ID")]
    MissingTenant,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Query = Vec<(&'static str, String)>;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    tenant: Option<Uuid>,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: &str, token: Option<String>, tenant: Option<Uuid>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned(), token, tenant }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Request without any tenant context (auth and company listing).
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant) = self.tenant {
            builder = builder.header(TENANT_HEADER, HeaderValue::from_str(&tenant.to_string())?);
        }
        Ok(builder)
    }

    /// Request against a tenant-scoped route. Fails locally when the token or
    /// tenant is missing instead of round-tripping for a 401/400.
    pub fn tenant_request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::MissingToken);
        }
        if self.tenant.is_none() {
            return Err(ClientError::MissingTenant);
        }
        self.request(method, path)
    }

    pub async fn send(&self, builder: RequestBuilder, body: Option<Value>) -> Result<Value, ClientError> {
        let builder = match body {
            Some(body) => builder.json(&body),
            None => builder,
        };
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        decode_response(status, &text)
    }

    pub async fn get(&self, path: &str, query: &Query) -> Result<Value, ClientError> {
        let builder = self.tenant_request(Method::GET, path)?.query(query);
        self.send(builder, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        let builder = self.tenant_request(Method::POST, path)?;
        self.send(builder, body).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        let builder = self.tenant_request(Method::PATCH, path)?;
        self.send(builder, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        let builder = self.tenant_request(Method::DELETE, path)?;
        self.send(builder, None).await
    }
}

/// Empty success bodies (204) decode to `Null`.
pub(crate) fn decode_response(status: StatusCode, body: &str) -> Result<Value, ClientError> {
    if !status.is_success() {
        return Err(ClientError::Api { status: status.as_u16(), message: error_message(status, body) });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned())
}

/// Appends `(key, value)` when the value is present.
pub fn push_opt<T: ToString>(query: &mut Query, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
