use super::*;
use axum::http::HeaderValue;
use axum::http::header::AUTHORIZATION;

fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

#[test]
fn bearer_token_reads_authorization_header() {
    assert_eq!(bearer_token(&headers_with("Bearer abc123")).as_deref(), Some("abc123"));
}

#[test]
fn bearer_token_missing_header_is_none() {
    assert_eq!(bearer_token(&HeaderMap::new()), None);
}

#[test]
fn bearer_token_ignores_other_schemes() {
    assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
}

#[test]
fn session_response_serializes_token_and_user() {
    let response = SessionResponse {
        token: "tok".into(),
        user: SessionUser { id: uuid::Uuid::nil(), name: "Ana".into(), email: "ana@empresa.com.br".into() },
    };
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["token"], "tok");
    assert_eq!(json["user"]["email"], "ana@empresa.com.br");
}
