use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use super::*;

#[derive(Debug, Deserialize, Serialize)]
struct Echo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    limit: u32,
}

fn router() -> Router {
    Router::new()
        .route("/echo", post(|Json(echo): Json<Echo>| async move { Json(echo) }))
        .route("/page", get(|Query(page): Query<Page>| async move { page.limit.to_string() }))
        .route("/item/{id}", get(|Path(id): Path<Uuid>| async move { id.to_string() }))
}

async fn call(request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type =
        response.headers().get(header::CONTENT_TYPE).map(|v| v.to_str().unwrap().to_owned());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, content_type, json)
}

fn post_json(body: &str, content_type: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/echo");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

fn get_uri(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn valid_json_round_trips_as_json() {
    let (status, content_type, body) = call(post_json(r#"{"name":"ok"}"#, Some("application/json"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["name"], "ok");
}

#[tokio::test]
async fn wrong_shape_is_validation_error() {
    let (status, content_type, body) = call(post_json(r#"{"name":1}"#, Some("application/json"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["code"], "E_VALIDATION");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (status, _, body) = call(post_json("{not json", Some("application/json"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_BAD_REQUEST");
}

#[tokio::test]
async fn missing_content_type_keeps_status_with_envelope() {
    let (status, _, body) = call(post_json(r#"{"name":"ok"}"#, None)).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], "E_BAD_REQUEST");
}

#[tokio::test]
async fn bad_query_and_path_are_bad_request() {
    for uri in ["/page?limit=abc", "/item/not-a-uuid"] {
        let (status, content_type, body) = call(get_uri(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(content_type.as_deref(), Some("application/json"), "{uri}");
        assert_eq!(body["code"], "E_BAD_REQUEST", "{uri}");
    }
}

#[test]
fn from_bytes_maps_rejections() {
    assert_eq!(Json::<Echo>::from_bytes(br#"{"name":"x"}"#).unwrap().0.name, "x");
    assert_eq!(Json::<Echo>::from_bytes(b"{}").err().unwrap().status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(Json::<Echo>::from_bytes(b"{").err().unwrap().code, "E_BAD_REQUEST");
}
