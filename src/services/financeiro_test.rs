use super::*;
use time::macros::date;

fn movement_input(kind: &str, status: Option<&str>) -> MovementInput {
    MovementInput {
        kind: kind.into(),
        description: "Aluguel".into(),
        category: Some("Ocupação".into()),
        amount_cents: 150_000,
        due_date: date!(2024 - 03 - 10),
        paid_date: None,
        status: status.map(str::to_owned),
        bank_account_id: Uuid::nil(),
        cost_center_id: None,
    }
}

#[test]
fn kind_and_status_round_trip_through_text() {
    for kind in [MovementKind::Receita, MovementKind::Despesa] {
        assert_eq!(MovementKind::from_str(kind.as_str()), Some(kind));
    }
    for status in [MovementStatus::Pendente, MovementStatus::Pago, MovementStatus::Cancelado] {
        assert_eq!(MovementStatus::from_str(status.as_str()), Some(status));
    }
    assert_eq!(MovementKind::from_str("transferencia"), None);
    assert_eq!(MovementStatus::from_str("PAGO"), None);
}

#[test]
fn expenses_reduce_balance() {
    assert_eq!(MovementKind::Receita.signed(500), 500);
    assert_eq!(MovementKind::Despesa.signed(500), -500);
}

#[test]
fn only_pending_movements_past_due_are_overdue() {
    let today = date!(2024 - 03 - 15);
    assert!(is_overdue(MovementStatus::Pendente, date!(2024 - 03 - 14), today));
    assert!(!is_overdue(MovementStatus::Pendente, today, today));
    assert!(!is_overdue(MovementStatus::Pago, date!(2024 - 01 - 01), today));
    assert!(!is_overdue(MovementStatus::Cancelado, date!(2024 - 01 - 01), today));
}

#[test]
fn new_movements_default_to_pending() {
    let fields = validate_movement(&movement_input("despesa", None)).unwrap();
    assert_eq!(fields.kind, MovementKind::Despesa);
    assert_eq!(fields.status, MovementStatus::Pendente);
    assert_eq!(fields.paid_date, None);
}

#[test]
fn paid_movement_requires_paid_date() {
    let err = validate_movement(&movement_input("receita", Some("pago"))).unwrap_err();
    assert_eq!(err.fields[0].field, "paid_date");

    let mut input = movement_input("receita", Some("pago"));
    input.paid_date = Some(date!(2024 - 03 - 12));
    let fields = validate_movement(&input).unwrap();
    assert_eq!(fields.paid_date, Some(date!(2024 - 03 - 12)));
}

#[test]
fn paid_date_is_dropped_unless_paid() {
    let mut input = movement_input("receita", Some("pendente"));
    input.paid_date = Some(date!(2024 - 03 - 12));
    assert_eq!(validate_movement(&input).unwrap().paid_date, None);
}

#[test]
fn edits_cannot_change_status() {
    let pending = validate_movement(&movement_input("despesa", None)).unwrap();
    assert!(check_edit_status(&pending).is_ok());

    let cancelled = validate_movement(&movement_input("despesa", Some("cancelado"))).unwrap();
    let err = check_edit_status(&cancelled).unwrap_err();
    assert_eq!(err.fields[0].field, "status");

    let mut input = movement_input("despesa", Some("pago"));
    input.paid_date = Some(date!(2024 - 03 - 12));
    assert!(check_edit_status(&validate_movement(&input).unwrap()).is_err());
}

#[test]
fn validate_movement_collects_every_bad_field() {
    let mut input = movement_input("transferencia", Some("estornado"));
    input.description = "  ".into();
    input.amount_cents = 0;
    let err = validate_movement(&input).unwrap_err();
    let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["kind", "status", "description", "amount_cents"]);
}

#[test]
fn movement_filter_rejects_unknown_values() {
    let filter = MovementFilter { kind: Some("despesa".into()), status: Some(String::new()), ..MovementFilter::default() };
    assert_eq!(parse_movement_filter(&filter).unwrap(), (Some(MovementKind::Despesa), None));

    let filter = MovementFilter { status: Some("aberto".into()), ..MovementFilter::default() };
    assert_eq!(parse_movement_filter(&filter).unwrap_err().fields[0].field, "status");
}

#[test]
fn summarize_ignores_cancelled_and_nets_paid_amounts() {
    let groups = [
        (MovementKind::Receita, MovementStatus::Pago, 1_000_00),
        (MovementKind::Receita, MovementStatus::Pendente, 250_00),
        (MovementKind::Despesa, MovementStatus::Pago, 400_00),
        (MovementKind::Despesa, MovementStatus::Pendente, 50_00),
        (MovementKind::Despesa, MovementStatus::Cancelado, 9_999_00),
    ];
    let summary = summarize(Some(date!(2024 - 03 - 01)), None, &groups);
    assert_eq!(summary.revenue_paid_cents, 1_000_00);
    assert_eq!(summary.revenue_pending_cents, 250_00);
    assert_eq!(summary.expense_paid_cents, 400_00);
    assert_eq!(summary.expense_pending_cents, 50_00);
    assert_eq!(summary.balance_cents, 600_00);
    assert_eq!(summary.balance_formatted, "R$ 600,00");
    assert_eq!(summary.from, Some(date!(2024 - 03 - 01)));
}

#[test]
fn summarize_empty_period_is_zero() {
    let summary = summarize(None, None, &[]);
    assert_eq!(summary.balance_cents, 0);
    assert_eq!(summary.revenue_paid_formatted, "R$ 0,00");
}

#[test]
fn financeiro_error_statuses() {
    assert_eq!(FinanceiroError::NotPending(Uuid::nil()).status(), StatusCode::CONFLICT);
    assert_eq!(FinanceiroError::BankAccountInUse(Uuid::nil()).status(), StatusCode::CONFLICT);
    assert_eq!(FinanceiroError::MovementNotFound(Uuid::nil()).status(), StatusCode::NOT_FOUND);
    let err = FinanceiroError::from(ValidationError::single("amount_cents", "O valor deve ser maior que zero"));
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.fields().len(), 1);
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn settle_updates_bank_balance_and_blocks_second_settle() {
    use crate::state::test_helpers;

    let pool = test_helpers::integration_pool().await;
    let (tenant_id, owner) = test_helpers::seed_tenant(&pool).await;
    let bank = create_bank_account(
        &pool,
        tenant_id,
        &BankAccountInput {
            name: "Conta Corrente".into(),
            bank_name: Some("Banco Teste".into()),
            agency: None,
            account_number: None,
            initial_balance_cents: Some(100_00),
            active: None,
        },
    )
    .await
    .unwrap();

    let mut input = movement_input("despesa", None);
    input.bank_account_id = bank.id;
    let movement = create_movement(&pool, tenant_id, owner, &input).await.unwrap();

    let before = bank_account_balance(&pool, tenant_id, bank.id, None).await.unwrap();
    assert_eq!(before.balance_cents, 100_00);

    let paid = settle_movement(&pool, tenant_id, movement.id, Some(date!(2024 - 03 - 11))).await.unwrap();
    assert_eq!(paid.status, MovementStatus::Pago);

    let after = bank_account_balance(&pool, tenant_id, bank.id, None).await.unwrap();
    assert_eq!(after.balance_cents, 100_00 - 1_500_00);

    let err = cancel_movement(&pool, tenant_id, movement.id).await.unwrap_err();
    assert!(matches!(err, FinanceiroError::NotPending(_)));

    let err = delete_bank_account(&pool, tenant_id, bank.id).await.unwrap_err();
    assert!(matches!(err, FinanceiroError::BankAccountInUse(_)));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn only_pending_movements_can_be_edited() {
    use crate::state::test_helpers;

    let pool = test_helpers::integration_pool().await;
    let (tenant_id, owner) = test_helpers::seed_tenant(&pool).await;
    let bank = create_bank_account(
        &pool,
        tenant_id,
        &BankAccountInput {
            name: "Caixa".into(),
            bank_name: None,
            agency: None,
            account_number: None,
            initial_balance_cents: None,
            active: None,
        },
    )
    .await
    .unwrap();

    let mut input = movement_input("receita", None);
    input.bank_account_id = bank.id;
    let movement = create_movement(&pool, tenant_id, owner, &input).await.unwrap();

    input.description = "Aluguel de março".into();
    let edited = update_movement(&pool, tenant_id, movement.id, &input).await.unwrap();
    assert_eq!(edited.description, "Aluguel de março");
    assert_eq!(edited.status, MovementStatus::Pendente);

    let mut reopen = movement_input("receita", Some("cancelado"));
    reopen.bank_account_id = bank.id;
    let err = update_movement(&pool, tenant_id, movement.id, &reopen).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

    cancel_movement(&pool, tenant_id, movement.id).await.unwrap();
    let err = update_movement(&pool, tenant_id, movement.id, &input).await.unwrap_err();
    assert!(matches!(err, FinanceiroError::NotPending(_)));
    assert_eq!(get_movement(&pool, tenant_id, movement.id).await.unwrap().status, MovementStatus::Cancelado);

    let err = update_movement(&pool, tenant_id, Uuid::new_v4(), &input).await.unwrap_err();
    assert!(matches!(err, FinanceiroError::MovementNotFound(_)));
}
