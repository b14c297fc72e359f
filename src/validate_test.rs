use super::*;
use time::macros::date;

#[test]
fn empty_accumulator_is_ok() {
    assert!(FieldErrors::new().into_result().is_ok());
}

#[test]
fn required_rejects_blank() {
    let mut errors = FieldErrors::new();
    errors.required("name", "   ");
    errors.required("code", "CC01");
    let err = errors.into_result().unwrap_err();
    assert_eq!(err.fields.len(), 1);
    assert_eq!(err.fields[0].field, "name");
    assert_eq!(err.to_string(), MSG_REQUIRED);
}

#[test]
fn same_debit_and_credit_account_is_rejected() {
    let account = Uuid::new_v4();
    let mut errors = FieldErrors::new();
    errors.distinct_accounts(account, account);
    let err = errors.into_result().unwrap_err();
    assert_eq!(err.fields[0].field, "credit_account_id");
    assert_eq!(err.to_string(), MSG_SAME_ACCOUNT);
}

#[test]
fn distinct_accounts_pass() {
    let mut errors = FieldErrors::new();
    errors.distinct_accounts(Uuid::new_v4(), Uuid::new_v4());
    assert!(errors.is_empty());
}

#[test]
fn password_confirmation_mismatch_blocks() {
    let mut errors = FieldErrors::new();
    errors.password("segredo123", "segredo124");
    let err = errors.into_result().unwrap_err();
    assert_eq!(err.fields.len(), 1);
    assert_eq!(err.fields[0].field, "password_confirmation");
    assert_eq!(err.fields[0].message, MSG_PASSWORD_MISMATCH);
}

#[test]
fn short_password_and_mismatch_are_both_reported() {
    let mut errors = FieldErrors::new();
    errors.password("abc", "abd");
    let err = errors.into_result().unwrap_err();
    let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["password", "password_confirmation"]);
}

#[test]
fn positive_amount_rejects_zero_and_negative() {
    let mut errors = FieldErrors::new();
    errors.positive_amount("amount_cents", 0);
    errors.positive_amount("amount_cents", -5);
    errors.positive_amount("amount_cents", 1);
    assert_eq!(errors.into_result().unwrap_err().fields.len(), 2);
}

#[test]
fn max_len_counts_chars_not_bytes() {
    let mut errors = FieldErrors::new();
    errors.max_len("name", "ção", 3);
    assert!(errors.is_empty());
    errors.max_len("name", "ções", 3);
    assert!(!errors.is_empty());
}

#[test]
fn date_range_allows_equal_dates() {
    let mut errors = FieldErrors::new();
    errors.date_range("period_end", date!(2024 - 01 - 01), date!(2024 - 01 - 01));
    assert!(errors.is_empty());
    errors.date_range("period_end", date!(2024 - 02 - 01), date!(2024 - 01 - 01));
    assert!(!errors.is_empty());
}

#[test]
fn email_shapes() {
    assert!(is_valid_email("ana@empresa.com.br"));
    assert!(!is_valid_email("ana@empresa"));
    assert!(!is_valid_email("@empresa.com"));
    assert!(!is_valid_email("ana empresa@x.com"));
    assert!(!is_valid_email("ana@@x.com"));
    assert!(!is_valid_email("ana@.com"));
}

#[test]
fn cnpj_check_digits() {
    assert!(is_valid_cnpj("11.222.333/0001-81"));
    assert!(is_valid_cnpj("11222333000181"));
    assert!(!is_valid_cnpj("11.222.333/0001-82"));
    assert!(!is_valid_cnpj("11111111111111"));
    assert!(!is_valid_cnpj("1122233300018"));
    assert!(!is_valid_cnpj("11a22233300018"));
}

#[test]
fn normalize_cnpj_strips_punctuation() {
    assert_eq!(normalize_cnpj("11.222.333/0001-81"), "11222333000181");
}

#[test]
fn account_code_shapes() {
    assert!(is_valid_account_code("1"));
    assert!(is_valid_account_code("1.1.01"));
    assert!(!is_valid_account_code(""));
    assert!(!is_valid_account_code("1..1"));
    assert!(!is_valid_account_code("1.a"));
    assert!(!is_valid_account_code(".1"));
}

#[test]
fn validation_error_without_fields_has_generic_message() {
    let err = ValidationError { fields: Vec::new() };
    assert_eq!(err.to_string(), "Dados inválidos");
}
