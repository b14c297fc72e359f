use super::*;

#[test]
fn validate_input_requires_code_and_name() {
    let input = CostCenterInput { code: " ".into(), name: String::new(), active: None };
    let err = validate_input(&input).unwrap_err();
    let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["code", "name"]);
}

#[test]
fn validate_input_limits_code_length() {
    let input = CostCenterInput { code: "X".repeat(21), name: "Administrativo".into(), active: Some(true) };
    assert!(validate_input(&input).is_err());
}

#[test]
fn validate_input_accepts_reasonable_values() {
    let input = CostCenterInput { code: "ADM".into(), name: "Administrativo".into(), active: None };
    assert!(validate_input(&input).is_ok());
}

#[test]
fn map_write_error_passes_through_non_constraint_errors() {
    assert!(matches!(map_write_error(sqlx::Error::RowNotFound, "ADM"), CadastroError::Database(_)));
}

#[test]
fn cadastro_error_statuses() {
    assert_eq!(CadastroError::CodeTaken("ADM".into()).status(), StatusCode::CONFLICT);
    assert_eq!(CadastroError::InUse(Uuid::nil()).status(), StatusCode::CONFLICT);
    assert_eq!(CadastroError::NotFound(Uuid::nil()).status(), StatusCode::NOT_FOUND);
    assert_eq!(
        CadastroError::CodeTaken("ADM".into()).to_string(),
        "Já existe um centro de custo com o código ADM"
    );
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn cost_center_code_is_unique_per_tenant() {
    use crate::state::test_helpers;

    let pool = test_helpers::integration_pool().await;
    let (tenant_id, _) = test_helpers::seed_tenant(&pool).await;
    let input = CostCenterInput { code: "ADM".into(), name: "Administrativo".into(), active: None };

    create_cost_center(&pool, tenant_id, &input).await.unwrap();
    let err = create_cost_center(&pool, tenant_id, &input).await.unwrap_err();
    assert!(matches!(err, CadastroError::CodeTaken(_)));

    let (other_tenant, _) = test_helpers::seed_tenant(&pool).await;
    assert!(create_cost_center(&pool, other_tenant, &input).await.is_ok());
}
