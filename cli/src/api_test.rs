use super::*;
use reqwest::header::AUTHORIZATION;

fn client(token: Option<&str>, tenant: Option<Uuid>) -> ApiClient {
    ApiClient::new("http://127.0.0.1:3000/", token.map(str::to_owned), tenant)
}

#[test]
fn url_joins_without_double_slash() {
    assert_eq!(client(None, None).url("/api/auth/me"), "http://127.0.0.1:3000/api/auth/me");
}

#[test]
fn request_carries_bearer_and_tenant_headers() {
    let tenant = Uuid::new_v4();
    let request = client(Some("tok"), Some(tenant))
        .request(Method::GET, "/api/okr/objetivos")
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok");
    assert_eq!(request.headers()[TENANT_HEADER], tenant.to_string().as_str());
}

#[test]
fn request_without_credentials_sends_no_headers() {
    let request = client(None, None).request(Method::POST, "/api/auth/sign-in").unwrap().build().unwrap();
    assert!(request.headers().get(AUTHORIZATION).is_none());
    assert!(request.headers().get(TENANT_HEADER).is_none());
}

#[test]
fn tenant_request_requires_token_then_tenant() {
    assert!(matches!(
        client(None, Some(Uuid::new_v4())).tenant_request(Method::GET, "/x"),
        Err(ClientError::MissingToken)
    ));
    assert!(matches!(client(Some("tok"), None).tenant_request(Method::GET, "/x"), Err(ClientError::MissingTenant)));
}

#[test]
fn query_pairs_are_encoded() {
    let mut query = Query::new();
    push_opt(&mut query, "from", Some("2024-01-01"));
    push_opt(&mut query, "to", None::<String>);
    push_opt(&mut query, "q", Some("aluguel sala"));
    let request = client(Some("tok"), Some(Uuid::nil()))
        .tenant_request(Method::GET, "/api/financeiro/movimentacoes")
        .unwrap()
        .query(&query)
        .build()
        .unwrap();
    assert_eq!(request.url().query(), Some("from=2024-01-01&q=aluguel+sala"));
}

#[test]
fn server_message_becomes_the_error() {
    let body = r#"{"code":"E_LEDGER_SAME_ACCOUNT","message":"Conta de débito e crédito devem ser diferentes"}"#;
    let err = decode_response(StatusCode::UNPROCESSABLE_ENTITY, body).unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Conta de débito e crédito devem ser diferentes");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_json_error_falls_back_to_status_text() {
    assert_eq!(error_message(StatusCode::BAD_GATEWAY, "<html>"), "Bad Gateway");
    assert_eq!(error_message(StatusCode::NOT_FOUND, r#"{"code":"E_X"}"#), "Not Found");
}

#[test]
fn empty_success_is_null() {
    assert_eq!(decode_response(StatusCode::NO_CONTENT, "").unwrap(), Value::Null);
    assert_eq!(decode_response(StatusCode::OK, r#"{"ok":true}"#).unwrap()["ok"], true);
}
