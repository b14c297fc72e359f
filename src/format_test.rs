use super::*;
use time::macros::date;

// =============================================================================
// format_brl
// =============================================================================

#[test]
fn format_brl_zero() {
    assert_eq!(format_brl(0), "R$ 0,00");
}

#[test]
fn format_brl_under_one_real() {
    assert_eq!(format_brl(7), "R$ 0,07");
    assert_eq!(format_brl(50), "R$ 0,50");
}

#[test]
fn format_brl_groups_thousands() {
    assert_eq!(format_brl(123_456), "R$ 1.234,56");
    assert_eq!(format_brl(100_000_000), "R$ 1.000.000,00");
    assert_eq!(format_brl(99_999), "R$ 999,99");
}

#[test]
fn format_brl_negative() {
    assert_eq!(format_brl(-123_456), "-R$ 1.234,56");
}

#[test]
fn format_brl_extreme_values_do_not_panic() {
    assert!(format_brl(i64::MIN).starts_with("-R$ "));
    assert!(format_brl(i64::MAX).starts_with("R$ "));
}

// =============================================================================
// parse_brl
// =============================================================================

#[test]
fn parse_brl_with_prefix_and_grouping() {
    assert_eq!(parse_brl("R$ 1.234,56"), Ok(123_456));
}

#[test]
fn parse_brl_plain_comma_decimal() {
    assert_eq!(parse_brl("10,5"), Ok(1050));
    assert_eq!(parse_brl(",50"), Ok(50));
}

#[test]
fn parse_brl_dot_as_decimal_without_comma() {
    assert_eq!(parse_brl("12.5"), Ok(1250));
    assert_eq!(parse_brl("12.34"), Ok(1234));
}

#[test]
fn parse_brl_dot_as_thousands_without_comma() {
    assert_eq!(parse_brl("1.234"), Ok(123_400));
    assert_eq!(parse_brl("1.234.567"), Ok(123_456_700));
}

#[test]
fn parse_brl_negative_before_or_after_prefix() {
    assert_eq!(parse_brl("-R$ 10,00"), Ok(-1000));
    assert_eq!(parse_brl("R$ -10,00"), Ok(-1000));
}

#[test]
fn parse_brl_rejects_empty() {
    assert_eq!(parse_brl("   "), Err(FormatError::Empty));
    assert_eq!(parse_brl("R$"), Err(FormatError::Empty));
}

#[test]
fn parse_brl_rejects_garbage() {
    assert!(matches!(parse_brl("abc"), Err(FormatError::InvalidAmount(_))));
    assert!(matches!(parse_brl("12,3a"), Err(FormatError::InvalidAmount(_))));
    assert!(matches!(parse_brl("."), Err(FormatError::InvalidAmount(_))));
}

#[test]
fn parse_brl_rejects_misplaced_thousands_separators() {
    for input in ["1.2.3,45", "12.34.567", "1234.567,00", ".123,00", "1..234", "1.234.,00"] {
        assert!(matches!(parse_brl(input), Err(FormatError::InvalidAmount(_))), "{input}");
    }
    assert_eq!(parse_brl("123.456,78"), Ok(12_345_678));
}

#[test]
fn parse_brl_rejects_three_decimals() {
    assert_eq!(parse_brl("1,234"), Err(FormatError::TooManyDecimals));
}

#[test]
fn parse_brl_overflow() {
    assert_eq!(parse_brl("99999999999999999999"), Err(FormatError::Overflow));
}

#[test]
fn parse_brl_reads_back_formatted_values() {
    for cents in [0, 1, 99, 100, 123_456, 987_654_321] {
        assert_eq!(parse_brl(&format_brl(cents)), Ok(cents));
    }
}

// =============================================================================
// dates and percent
// =============================================================================

#[test]
fn format_date_br_pads_day_and_month() {
    assert_eq!(format_date_br(date!(2024 - 03 - 05)), "05/03/2024");
}

#[test]
fn parse_date_br_valid() {
    assert_eq!(parse_date_br("31/12/2023"), Ok(date!(2023 - 12 - 31)));
}

#[test]
fn parse_date_br_rejects_impossible_date() {
    assert!(matches!(parse_date_br("31/02/2024"), Err(FormatError::InvalidDate(_))));
    assert!(matches!(parse_date_br("2024-01-01"), Err(FormatError::InvalidDate(_))));
}

#[test]
fn format_percent_uses_decimal_comma() {
    assert_eq!(format_percent(42.5), "42,5%");
    assert_eq!(format_percent(100.0), "100,0%");
    assert_eq!(format_percent(0.0), "0,0%");
}

#[test]
fn parse_date_accepts_iso_and_br() {
    assert_eq!(parse_date("2024-01-31"), Ok(date!(2024 - 01 - 31)));
    assert_eq!(parse_date(" 31/01/2024 "), Ok(date!(2024 - 01 - 31)));
    assert!(parse_date("01-31-2024").is_err());
}

// =============================================================================
// request deserializers
// =============================================================================

#[derive(Debug, serde::Deserialize)]
struct Form {
    #[serde(deserialize_with = "de::cents")]
    amount_cents: i64,
    #[serde(default, deserialize_with = "de::option_cents")]
    initial_cents: Option<i64>,
    #[serde(deserialize_with = "de::date")]
    due_date: Date,
    #[serde(default, deserialize_with = "de::option_date")]
    paid_date: Option<Date>,
}

#[test]
fn form_accepts_cents_and_iso_dates() {
    let form: Form = serde_json::from_value(serde_json::json!({
        "amount_cents": 1050,
        "due_date": "2024-02-10",
    }))
    .unwrap();
    assert_eq!(form.amount_cents, 1050);
    assert_eq!(form.initial_cents, None);
    assert_eq!(form.due_date, date!(2024 - 02 - 10));
    assert_eq!(form.paid_date, None);
}

#[test]
fn form_accepts_typed_brl_and_br_dates() {
    let form: Form = serde_json::from_value(serde_json::json!({
        "amount_cents": "R$ 1.234,56",
        "initial_cents": "10,00",
        "due_date": "10/02/2024",
        "paid_date": "",
    }))
    .unwrap();
    assert_eq!(form.amount_cents, 123_456);
    assert_eq!(form.initial_cents, Some(1000));
    assert_eq!(form.due_date, date!(2024 - 02 - 10));
    assert_eq!(form.paid_date, None);
}

#[test]
fn form_rejects_bad_amount_text() {
    let result = serde_json::from_value::<Form>(serde_json::json!({
        "amount_cents": "doze reais",
        "due_date": "2024-02-10",
    }));
    assert!(result.is_err());
}
