use super::*;

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

// =============================================================================
// generate_token
// =============================================================================

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

#[test]
fn session_user_serializes_public_fields() {
    let user = SessionUser { id: Uuid::nil(), name: "Ana".into(), email: "ana@empresa.com.br".into() };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["name"], "Ana");
    assert_eq!(json["email"], "ana@empresa.com.br");
    assert!(json.get("password_hash").is_none());
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn purge_removes_only_expired_sessions() {
    use crate::state::test_helpers;

    let pool = test_helpers::integration_pool().await;
    let user_id = test_helpers::seed_user(&pool, "sessao@teste.com").await;
    let live = create_session(&pool, user_id, 1).await.unwrap();
    let stale = create_session(&pool, user_id, 1).await.unwrap();
    sqlx::query("UPDATE sessions SET expires_at = now() - interval '1 minute' WHERE token = $1")
        .bind(&stale)
        .execute(&pool)
        .await
        .unwrap();

    assert!(purge_expired_sessions(&pool).await.unwrap() >= 1);

    let remaining: Vec<String> = sqlx::query_scalar("SELECT token FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, vec![live.clone()]);
    assert!(validate_session(&pool, &live).await.unwrap().is_some());
}
